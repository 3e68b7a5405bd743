//! Federated authentication configuration.
//!
//! [`FedAuthConfig::parse`] reads the `fedauth=` workflow keyword and the
//! parameters that workflow needs out of a connection string, validates them
//! against the workflow's requirements and produces an immutable descriptor.
//!
//! | Keyword | Workflow | Required |
//! |---------|----------|----------|
//! | `ActiveDirectoryPassword` | [`FedAuthWorkflow::Password`] | `user id`, `password` |
//! | `ActiveDirectoryServicePrincipal`, `ActiveDirectoryApplication` | [`FedAuthWorkflow::ServicePrincipalSecret`] | `user id=appid@tenant`, `password` |
//! | same, with `clientcertpath` | [`FedAuthWorkflow::ServicePrincipalCertificate`] | `clientcertpath`, `applicationclientid`, `user id=appid[@tenant]` |
//! | `ActiveDirectoryManagedIdentity`, `ActiveDirectoryMSI` | [`FedAuthWorkflow::ManagedIdentity`] and variants | at most one of `user id`, `resource id` |
//! | `ActiveDirectoryServicePrincipalAccessToken` | [`FedAuthWorkflow::PreSuppliedToken`] | `password` (the token) |

use std::path::{Path, PathBuf};

use tds_protocol::fedauth::{AdalWorkflow, FedAuthFeature, FedAuthLibrary};
use zeroize::Zeroizing;

use crate::error::AuthError;
use crate::params::{ConnectionParams, keys};

/// Workflow keywords.
pub mod keywords {
    /// User principal and password.
    pub const PASSWORD: &str = "ActiveDirectoryPassword";
    /// Service principal with secret or certificate.
    pub const SERVICE_PRINCIPAL: &str = "ActiveDirectoryServicePrincipal";
    /// Legacy alias of [`SERVICE_PRINCIPAL`].
    pub const APPLICATION: &str = "ActiveDirectoryApplication";
    /// Managed identity.
    pub const MANAGED_IDENTITY: &str = "ActiveDirectoryManagedIdentity";
    /// Legacy alias of [`MANAGED_IDENTITY`].
    pub const MSI: &str = "ActiveDirectoryMSI";
    /// Caller-supplied access token.
    pub const ACCESS_TOKEN: &str = "ActiveDirectoryServicePrincipalAccessToken";

    /// Keywords that are recognised but have no workflow in this crate.
    pub const UNIMPLEMENTED: &[&str] = &[
        "ActiveDirectoryIntegrated",
        "ActiveDirectoryInteractive",
        "ActiveDirectoryDefault",
        "ActiveDirectoryDeviceCode",
        "ActiveDirectoryAzCli",
    ];
}

/// Parameters that only make sense together with a `fedauth=` keyword.
const FED_AUTH_ONLY_KEYS: &[&str] = &[
    keys::CLIENT_CERT_PATH,
    keys::APPLICATION_CLIENT_ID,
    keys::RESOURCE_ID,
    keys::TENANT_ID,
];

/// Credential-acquisition workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FedAuthWorkflow {
    /// No federated authentication.
    #[default]
    None,
    /// Password grant for a user principal.
    Password,
    /// Service principal authenticating with a client secret.
    ServicePrincipalSecret,
    /// Service principal authenticating with a PKCS#12 certificate.
    ServicePrincipalCertificate,
    /// System-assigned managed identity.
    ManagedIdentity,
    /// User-assigned managed identity selected by resource id.
    ManagedIdentityWithResourceId,
    /// User-assigned managed identity selected by client id.
    ManagedIdentityWithClientId,
    /// Access token supplied by the caller.
    PreSuppliedToken,
}

impl FedAuthWorkflow {
    /// Feature-extension format used on the wire.
    #[must_use]
    pub const fn library(self) -> FedAuthLibrary {
        match self {
            Self::None => FedAuthLibrary::Reserved,
            Self::PreSuppliedToken => FedAuthLibrary::SecurityToken,
            _ => FedAuthLibrary::Adal,
        }
    }

    /// ADAL workflow byte, for workflows using the ADAL library.
    #[must_use]
    pub const fn adal_workflow(self) -> Option<AdalWorkflow> {
        match self {
            Self::Password | Self::ServicePrincipalSecret | Self::ServicePrincipalCertificate => {
                Some(AdalWorkflow::Password)
            }
            Self::ManagedIdentity
            | Self::ManagedIdentityWithResourceId
            | Self::ManagedIdentityWithClientId => Some(AdalWorkflow::Msi),
            Self::None | Self::PreSuppliedToken => None,
        }
    }

    /// Check if a token has to be acquired for this workflow.
    #[must_use]
    pub const fn is_federated(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Check if this workflow talks to the instance metadata endpoint.
    #[must_use]
    pub const fn is_managed_identity(self) -> bool {
        matches!(
            self,
            Self::ManagedIdentity | Self::ManagedIdentityWithResourceId | Self::ManagedIdentityWithClientId
        )
    }
}

impl std::fmt::Display for FedAuthWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Password => "password",
            Self::ServicePrincipalSecret => "service principal (secret)",
            Self::ServicePrincipalCertificate => "service principal (certificate)",
            Self::ManagedIdentity => "managed identity",
            Self::ManagedIdentityWithResourceId => "managed identity (resource id)",
            Self::ManagedIdentityWithClientId => "managed identity (client id)",
            Self::PreSuppliedToken => "access token",
        };
        f.write_str(name)
    }
}

/// Validated federated authentication descriptor.
///
/// Built once per connection attempt and read-only afterwards. Secrets are
/// zeroed on drop and never rendered by `Debug`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FedAuthConfig {
    workflow: FedAuthWorkflow,
    user: Option<String>,
    password: Option<Zeroizing<String>>,
    client_id: Option<String>,
    tenant_id: Option<String>,
    resource_id: Option<String>,
    certificate_path: Option<PathBuf>,
    client_secret: Option<Zeroizing<String>>,
    application_client_id: Option<String>,
}

impl FedAuthConfig {
    /// A configuration without federated authentication.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse and validate a connection string.
    pub fn parse(conn_str: &str) -> Result<Self, AuthError> {
        Self::from_params(&ConnectionParams::parse(conn_str)?)
    }

    /// Validate already-parsed connection parameters.
    pub fn from_params(params: &ConnectionParams) -> Result<Self, AuthError> {
        let Some(keyword) = params.get_non_empty(keys::FEDAUTH) else {
            return Self::without_fed_auth(params);
        };

        let config = if eq_keyword(keyword, keywords::PASSWORD) {
            Self::password_workflow(params)?
        } else if eq_keyword(keyword, keywords::SERVICE_PRINCIPAL)
            || eq_keyword(keyword, keywords::APPLICATION)
        {
            if params.contains(keys::CLIENT_CERT_PATH) {
                Self::service_principal_certificate(params)?
            } else {
                Self::service_principal_secret(params)?
            }
        } else if eq_keyword(keyword, keywords::MANAGED_IDENTITY)
            || eq_keyword(keyword, keywords::MSI)
        {
            Self::managed_identity(params)?
        } else if eq_keyword(keyword, keywords::ACCESS_TOKEN) {
            Self::access_token(params)?
        } else {
            return Err(AuthError::UnsupportedWorkflow(keyword.to_string()));
        };

        tracing::debug!(workflow = %config.workflow, "federated authentication configured");
        Ok(config)
    }

    fn without_fed_auth(params: &ConnectionParams) -> Result<Self, AuthError> {
        if let Some(key) = FED_AUTH_ONLY_KEYS.iter().find(|k| params.contains(k)) {
            return Err(AuthError::invalid(
                fed_auth_key_name(key),
                "is only valid together with a 'fedauth' workflow",
            ));
        }
        Ok(Self::none())
    }

    fn password_workflow(params: &ConnectionParams) -> Result<Self, AuthError> {
        let user = require(params, keys::USER_ID, "user id", "the user principal name")?;
        let password = require(params, keys::PASSWORD, "password", "the user's password")?;

        Ok(Self {
            workflow: FedAuthWorkflow::Password,
            user: Some(user.to_string()),
            password: Some(Zeroizing::new(password.to_string())),
            tenant_id: params.get_non_empty(keys::TENANT_ID).map(str::to_string),
            application_client_id: optional(params, keys::APPLICATION_CLIENT_ID),
            ..Self::default()
        })
    }

    fn service_principal_secret(params: &ConnectionParams) -> Result<Self, AuthError> {
        let user = require(params, keys::USER_ID, "user id", "'client id@tenant id'")?;
        let (client_id, tenant_id) = principal_and_tenant(params, user)?;
        let tenant_id = tenant_id.ok_or_else(|| {
            AuthError::invalid("user id", "must be 'client id@tenant id' for a client secret")
        })?;
        let secret = require(params, keys::PASSWORD, "password", "the client secret")?;

        Ok(Self {
            workflow: FedAuthWorkflow::ServicePrincipalSecret,
            client_id: Some(client_id),
            tenant_id: Some(tenant_id),
            client_secret: Some(Zeroizing::new(secret.to_string())),
            ..Self::default()
        })
    }

    fn service_principal_certificate(params: &ConnectionParams) -> Result<Self, AuthError> {
        let path = require(params, keys::CLIENT_CERT_PATH, "clientcertpath", "the certificate path")?;
        let application_client_id = require(
            params,
            keys::APPLICATION_CLIENT_ID,
            "applicationclientid",
            "the application client id",
        )?;
        let user = require(params, keys::USER_ID, "user id", "'client id[@tenant id]'")?;
        let (client_id, tenant_id) = principal_and_tenant(params, user)?;

        Ok(Self {
            workflow: FedAuthWorkflow::ServicePrincipalCertificate,
            client_id: Some(client_id),
            tenant_id,
            certificate_path: Some(PathBuf::from(path)),
            client_secret: params
                .get_non_empty(keys::PASSWORD)
                .map(|p| Zeroizing::new(p.to_string())),
            application_client_id: Some(application_client_id.to_string()),
            ..Self::default()
        })
    }

    fn managed_identity(params: &ConnectionParams) -> Result<Self, AuthError> {
        let client_id = optional(params, keys::USER_ID);
        let resource_id = optional(params, keys::RESOURCE_ID);

        let workflow = match (&client_id, &resource_id) {
            (Some(_), Some(_)) => {
                return Err(AuthError::invalid(
                    "resource id",
                    "cannot be combined with a managed identity client id in 'user id'",
                ));
            }
            (Some(_), None) => FedAuthWorkflow::ManagedIdentityWithClientId,
            (None, Some(_)) => FedAuthWorkflow::ManagedIdentityWithResourceId,
            (None, None) => FedAuthWorkflow::ManagedIdentity,
        };

        Ok(Self {
            workflow,
            client_id,
            resource_id,
            ..Self::default()
        })
    }

    fn access_token(params: &ConnectionParams) -> Result<Self, AuthError> {
        let token = require(params, keys::PASSWORD, "password", "the access token")?;

        Ok(Self {
            workflow: FedAuthWorkflow::PreSuppliedToken,
            password: Some(Zeroizing::new(token.to_string())),
            ..Self::default()
        })
    }

    /// Selected workflow.
    #[must_use]
    pub fn workflow(&self) -> FedAuthWorkflow {
        self.workflow
    }

    /// Feature-extension format for the selected workflow.
    #[must_use]
    pub fn library(&self) -> FedAuthLibrary {
        self.workflow.library()
    }

    /// ADAL workflow byte for the selected workflow.
    #[must_use]
    pub fn adal_workflow(&self) -> Option<AdalWorkflow> {
        self.workflow.adal_workflow()
    }

    /// Check if a token has to be acquired.
    #[must_use]
    pub fn is_federated(&self) -> bool {
        self.workflow.is_federated()
    }

    /// User principal name (password workflow).
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// User password, or the access token for the pre-supplied token workflow.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().map(String::as_str)
    }

    /// Service principal or managed identity client id.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Directory tenant id.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Managed identity resource id.
    #[must_use]
    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    /// PKCS#12 certificate path.
    #[must_use]
    pub fn certificate_path(&self) -> Option<&Path> {
        self.certificate_path.as_deref()
    }

    /// Client secret, or the certificate passphrase.
    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref().map(String::as_str)
    }

    /// Driver application client id.
    #[must_use]
    pub fn application_client_id(&self) -> Option<&str> {
        self.application_client_id.as_deref()
    }

    /// The FEDAUTH feature extension to advertise, if any.
    #[must_use]
    pub fn feature(&self) -> Option<FedAuthFeature> {
        match self.library() {
            FedAuthLibrary::Reserved => None,
            FedAuthLibrary::SecurityToken => Some(FedAuthFeature::security_token()),
            FedAuthLibrary::Adal => self.adal_workflow().map(FedAuthFeature::adal),
        }
    }
}

impl std::fmt::Debug for FedAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FedAuthConfig")
            .field("workflow", &self.workflow)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field("resource_id", &self.resource_id)
            .field("certificate_path", &self.certificate_path)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("application_client_id", &self.application_client_id)
            .finish()
    }
}

/// Split `principal@tenant` at the first `@`.
///
/// Only splits when both halves are non-empty.
#[must_use]
pub fn split_tenant_and_client_id(user: &str) -> (&str, Option<&str>) {
    match user.split_once('@') {
        Some((client, tenant)) if !client.is_empty() && !tenant.is_empty() => {
            (client, Some(tenant))
        }
        _ => (user, None),
    }
}

fn principal_and_tenant(
    params: &ConnectionParams,
    user: &str,
) -> Result<(String, Option<String>), AuthError> {
    let (client_id, embedded) = split_tenant_and_client_id(user);
    let explicit = params.get_non_empty(keys::TENANT_ID);

    let tenant = match (embedded, explicit) {
        (Some(embedded), Some(explicit)) if !embedded.eq_ignore_ascii_case(explicit) => {
            return Err(AuthError::invalid(
                "tenant id",
                "conflicts with the tenant embedded in 'user id'",
            ));
        }
        (Some(tenant), _) | (None, Some(tenant)) => Some(tenant.to_string()),
        (None, None) => None,
    };

    Ok((client_id.to_string(), tenant))
}

fn require<'a>(
    params: &'a ConnectionParams,
    key: &str,
    field: &'static str,
    what: &str,
) -> Result<&'a str, AuthError> {
    params
        .get_non_empty(key)
        .ok_or_else(|| AuthError::invalid(field, format!("must provide {what}")))
}

fn optional(params: &ConnectionParams, key: &str) -> Option<String> {
    params.get_non_empty(key).map(str::to_string)
}

fn eq_keyword(value: &str, keyword: &str) -> bool {
    value.trim().eq_ignore_ascii_case(keyword)
}

fn fed_auth_key_name(key: &str) -> &'static str {
    match key {
        keys::CLIENT_CERT_PATH => "clientcertpath",
        keys::APPLICATION_CLIENT_ID => "applicationclientid",
        keys::RESOURCE_ID => "resource id",
        _ => "tenant id",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;

    fn invalid_field(result: Result<FedAuthConfig, AuthError>) -> &'static str {
        match result {
            Err(AuthError::InvalidConfiguration { field, .. }) => field,
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_no_fed_auth() {
        let config = FedAuthConfig::parse("server=someserver").unwrap();
        assert_eq!(config.workflow(), FedAuthWorkflow::None);
        assert_eq!(config.library(), FedAuthLibrary::Reserved);
        assert!(config.feature().is_none());
    }

    #[test]
    fn test_sql_login_without_fed_auth() {
        let config = FedAuthConfig::parse("server=s;user id=sa;password=x").unwrap();
        assert_eq!(config.workflow(), FedAuthWorkflow::None);
    }

    #[test]
    fn test_stray_fed_auth_parameter_without_workflow() {
        assert_eq!(
            invalid_field(FedAuthConfig::parse("server=s;resource id=/subs/x")),
            "resource id"
        );
        assert_eq!(
            invalid_field(FedAuthConfig::parse("server=s;clientcertpath=/c.pfx")),
            "clientcertpath"
        );
    }

    #[test]
    fn test_password_does_not_split_tenant() {
        let config = FedAuthConfig::parse(
            "fedauth=ActiveDirectoryPassword;user id=alice@example.com;password=secret",
        )
        .unwrap();
        assert_eq!(config.workflow(), FedAuthWorkflow::Password);
        assert_eq!(config.library(), FedAuthLibrary::Adal);
        assert_eq!(config.adal_workflow(), Some(AdalWorkflow::Password));
        assert_eq!(config.user(), Some("alice@example.com"));
        assert_eq!(config.password(), Some("secret"));
        assert_eq!(config.tenant_id(), None);
        assert_eq!(config.client_id(), None);
    }

    #[test]
    fn test_password_with_application_client_id() {
        let config = FedAuthConfig::parse(
            "fedauth=ActiveDirectoryPassword;user id=u@example.com;password=p;applicationclientid=someguid",
        )
        .unwrap();
        assert_eq!(config.application_client_id(), Some("someguid"));
    }

    #[test]
    fn test_password_requires_user_and_password() {
        assert_eq!(
            invalid_field(FedAuthConfig::parse("fedauth=ActiveDirectoryPassword;password=p")),
            "user id"
        );
        assert_eq!(
            invalid_field(FedAuthConfig::parse("fedauth=ActiveDirectoryPassword;user id=u")),
            "password"
        );
    }

    #[test]
    fn test_service_principal_secret() {
        let config = FedAuthConfig::parse(
            "fedauth=ActiveDirectoryServicePrincipal;user id=appid@tenantid;password=secret",
        )
        .unwrap();
        assert_eq!(config.workflow(), FedAuthWorkflow::ServicePrincipalSecret);
        assert_eq!(config.client_id(), Some("appid"));
        assert_eq!(config.tenant_id(), Some("tenantid"));
        assert_eq!(config.client_secret(), Some("secret"));
        assert_eq!(config.user(), None);
        assert_eq!(config.password(), None);
    }

    #[test]
    fn test_service_principal_secret_with_explicit_tenant() {
        let config = FedAuthConfig::parse(
            "fedauth=ActiveDirectoryApplication;user id=appid;tenant id=t1;password=secret",
        )
        .unwrap();
        assert_eq!(config.client_id(), Some("appid"));
        assert_eq!(config.tenant_id(), Some("t1"));
    }

    #[test]
    fn test_service_principal_secret_requires_tenant() {
        assert_eq!(
            invalid_field(FedAuthConfig::parse(
                "fedauth=ActiveDirectoryServicePrincipal;user id=appid;password=secret"
            )),
            "user id"
        );
    }

    #[test]
    fn test_conflicting_tenants() {
        assert_eq!(
            invalid_field(FedAuthConfig::parse(
                "fedauth=ActiveDirectoryServicePrincipal;user id=appid@t1;tenant id=t2;password=s"
            )),
            "tenant id"
        );
    }

    #[test]
    fn test_service_principal_secret_requires_secret() {
        assert_eq!(
            invalid_field(FedAuthConfig::parse(
                "fedauth=ActiveDirectoryServicePrincipal;user id=appid@tenant"
            )),
            "password"
        );
    }

    #[test]
    fn test_service_principal_certificate() {
        let config = FedAuthConfig::parse(
            "fedauth=ActiveDirectoryApplication;user id=service-principal-id@tenant-id;password=somesecret;clientcertpath=/user/cert/cert.pfx;applicationclientid=someguid",
        )
        .unwrap();
        assert_eq!(config.workflow(), FedAuthWorkflow::ServicePrincipalCertificate);
        assert_eq!(config.library(), FedAuthLibrary::Adal);
        assert_eq!(config.client_id(), Some("service-principal-id"));
        assert_eq!(config.tenant_id(), Some("tenant-id"));
        assert_eq!(config.client_secret(), Some("somesecret"));
        assert_eq!(
            config.certificate_path(),
            Some(Path::new("/user/cert/cert.pfx"))
        );
        assert_eq!(config.application_client_id(), Some("someguid"));
    }

    #[test]
    fn test_service_principal_certificate_tenant_optional() {
        let config = FedAuthConfig::parse(
            "fedauth=ActiveDirectoryServicePrincipal;user id=service-principal-id;clientcertpath=/c.pfx;applicationclientid=someguid",
        )
        .unwrap();
        assert_eq!(config.tenant_id(), None);
        assert_eq!(config.client_secret(), None);
    }

    #[test]
    fn test_service_principal_certificate_requires_application_client_id() {
        assert_eq!(
            invalid_field(FedAuthConfig::parse(
                "fedauth=ActiveDirectoryServicePrincipal;user id=a@t;clientcertpath=/c.pfx"
            )),
            "applicationclientid"
        );
    }

    #[test]
    fn test_managed_identity_variants() {
        let plain = FedAuthConfig::parse("fedauth=ActiveDirectoryMSI").unwrap();
        assert_eq!(plain.workflow(), FedAuthWorkflow::ManagedIdentity);
        assert_eq!(plain.adal_workflow(), Some(AdalWorkflow::Msi));

        let by_client = FedAuthConfig::parse(
            "fedauth=ActiveDirectoryManagedIdentity;user id=identity-client-id",
        )
        .unwrap();
        assert_eq!(by_client.workflow(), FedAuthWorkflow::ManagedIdentityWithClientId);
        assert_eq!(by_client.client_id(), Some("identity-client-id"));

        let by_resource = FedAuthConfig::parse(
            "fedauth=ActiveDirectoryManagedIdentity;resource id=/subscriptions/x/resourceGroups/y",
        )
        .unwrap();
        assert_eq!(
            by_resource.workflow(),
            FedAuthWorkflow::ManagedIdentityWithResourceId
        );
        assert_eq!(
            by_resource.resource_id(),
            Some("/subscriptions/x/resourceGroups/y")
        );
        assert_eq!(by_resource.client_id(), None);
    }

    #[test]
    fn test_managed_identity_client_and_resource_are_exclusive() {
        assert_eq!(
            invalid_field(FedAuthConfig::parse(
                "fedauth=ActiveDirectoryMSI;user id=c;resource id=/r"
            )),
            "resource id"
        );
    }

    #[test]
    fn test_access_token() {
        let config = FedAuthConfig::parse(
            "fedauth=ActiveDirectoryServicePrincipalAccessToken;password=some-access-token;",
        )
        .unwrap();
        assert_eq!(config.workflow(), FedAuthWorkflow::PreSuppliedToken);
        assert_eq!(config.library(), FedAuthLibrary::SecurityToken);
        assert_eq!(config.adal_workflow(), None);
        assert_eq!(config.password(), Some("some-access-token"));
        assert_eq!(
            config.feature().map(|f| f.library),
            Some(FedAuthLibrary::SecurityToken)
        );
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let config = FedAuthConfig::parse("FedAuth=activedirectorymsi").unwrap();
        assert_eq!(config.workflow(), FedAuthWorkflow::ManagedIdentity);
    }

    #[test]
    fn test_unsupported_workflows() {
        for keyword in keywords::UNIMPLEMENTED.iter().chain(&["Kerberos"]) {
            let err = FedAuthConfig::parse(&format!("fedauth={keyword}")).unwrap_err();
            assert!(matches!(err, AuthError::UnsupportedWorkflow(_)), "{keyword}");
            assert_eq!(err.class(), ErrorClass::Configuration);
        }
    }

    #[test]
    fn test_reparse_is_structurally_equal() {
        let dsn = "fedauth=ActiveDirectoryServicePrincipal;user id=a@t;password=s";
        assert_eq!(
            FedAuthConfig::parse(dsn).unwrap(),
            FedAuthConfig::parse(dsn).unwrap()
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = FedAuthConfig::parse(
            "fedauth=ActiveDirectoryServicePrincipal;user id=a@t;password=topsecret",
        )
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_split_tenant_and_client_id() {
        assert_eq!(split_tenant_and_client_id("a@b"), ("a", Some("b")));
        assert_eq!(split_tenant_and_client_id("a@b@c"), ("a", Some("b@c")));
        assert_eq!(split_tenant_and_client_id("@b"), ("@b", None));
        assert_eq!(split_tenant_and_client_id("a@"), ("a@", None));
        assert_eq!(split_tenant_and_client_id("a"), ("a", None));
    }
}
