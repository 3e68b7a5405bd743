//! Credential workflow dispatch.
//!
//! [`WorkflowDispatcher::provide_token`] turns a validated [`FedAuthConfig`]
//! into a bearer token. Each workflow has its own handler; all network calls
//! go through the configured [`IdentityProvider`] and are bounded by the
//! caller's [`CallContext`].

use std::sync::Arc;

use crate::cert_auth::CertificateMaterial;
use crate::context::CallContext;
use crate::error::AuthError;
use crate::fedauth::{FedAuthConfig, FedAuthWorkflow};
use crate::provider::{
    ClientAssertion, ClientCredentialRequest, IdentityProvider, ManagedIdentityRequest,
    ManagedIdentitySelector, PasswordGrant,
};
use crate::token::CredentialToken;

/// Scope requested when the server does not name one.
pub const DEFAULT_SCOPE: &str = "https://database.windows.net/.default";

/// Authority used when the server does not name one.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Application id of the driver's own directory registration, used for the
/// password grant when `applicationclientid` is not set.
pub const DEFAULT_APPLICATION_CLIENT_ID: &str = "7f98cb04-cd1e-40df-9140-3bf7e2cea4db";

/// Selects and runs the credential workflow of a [`FedAuthConfig`].
#[derive(Clone, Default)]
pub struct WorkflowDispatcher {
    provider: Option<Arc<dyn IdentityProvider>>,
}

impl std::fmt::Debug for WorkflowDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowDispatcher")
            .field("has_provider", &self.has_provider())
            .finish()
    }
}

impl WorkflowDispatcher {
    /// Dispatcher backed by an identity provider.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Dispatcher without a provider. Only pre-supplied tokens can be served.
    #[must_use]
    pub fn without_provider() -> Self {
        Self::default()
    }

    /// Check whether an identity provider is configured.
    #[must_use]
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Acquire a token for the configured workflow.
    ///
    /// `scope` and `authority_hint` normally come from the server. An empty
    /// scope falls back to [`DEFAULT_SCOPE`]; a scope naming only the resource
    /// gets `/.default` appended. When the configuration names no tenant, the
    /// last path segment of `authority_hint` is used.
    pub async fn provide_token(
        &self,
        ctx: &CallContext,
        config: &FedAuthConfig,
        scope: &str,
        authority_hint: &str,
    ) -> Result<CredentialToken, AuthError> {
        ctx.check()?;

        let scope = normalize_scope(scope);
        let (authority, hinted_tenant) = split_authority(authority_hint);
        let target = Target {
            scope: &scope,
            authority,
            tenant_id: config.tenant_id().or(hinted_tenant),
        };

        tracing::debug!(
            workflow = %config.workflow(),
            scope = %target.scope,
            authority = %target.authority,
            "acquiring federated authentication token"
        );

        let result = match config.workflow() {
            FedAuthWorkflow::None => Err(AuthError::invalid(
                "fedauth",
                "no federated authentication workflow is configured",
            )),
            FedAuthWorkflow::Password => self.password(ctx, config, &target).await,
            FedAuthWorkflow::ServicePrincipalSecret => {
                self.service_principal_secret(ctx, config, &target).await
            }
            FedAuthWorkflow::ServicePrincipalCertificate => {
                self.service_principal_certificate(ctx, config, &target).await
            }
            FedAuthWorkflow::ManagedIdentity => {
                self.managed_identity(ctx, &target, ManagedIdentitySelector::SystemAssigned)
                    .await
            }
            FedAuthWorkflow::ManagedIdentityWithClientId => {
                let client_id = required(config.client_id(), "user id")?;
                self.managed_identity(ctx, &target, ManagedIdentitySelector::ClientId(client_id))
                    .await
            }
            FedAuthWorkflow::ManagedIdentityWithResourceId => {
                let resource_id = required(config.resource_id(), "resource id")?;
                self.managed_identity(
                    ctx,
                    &target,
                    ManagedIdentitySelector::ResourceId(resource_id),
                )
                .await
            }
            FedAuthWorkflow::PreSuppliedToken => presupplied(config),
        };

        match &result {
            Ok(token) => tracing::debug!(
                workflow = %config.workflow(),
                expires_at = ?token.expires_at(),
                "federated authentication token acquired"
            ),
            Err(e) => tracing::debug!(
                workflow = %config.workflow(),
                class = ?e.class(),
                error = %e,
                "federated authentication token acquisition failed"
            ),
        }

        result
    }

    fn provider(&self) -> Result<&dyn IdentityProvider, AuthError> {
        self.provider
            .as_deref()
            .ok_or_else(|| AuthError::invalid("fedauth", "no identity provider is configured"))
    }

    async fn password(
        &self,
        ctx: &CallContext,
        config: &FedAuthConfig,
        target: &Target<'_>,
    ) -> Result<CredentialToken, AuthError> {
        let provider = self.provider()?;
        let grant = PasswordGrant {
            scope: target.scope,
            authority: target.authority,
            tenant_id: target.tenant_id,
            client_id: config
                .application_client_id()
                .unwrap_or(DEFAULT_APPLICATION_CLIENT_ID),
            user: required(config.user(), "user id")?,
            password: required(config.password(), "password")?,
        };
        ctx.run(provider.password_grant(grant)).await
    }

    async fn service_principal_secret(
        &self,
        ctx: &CallContext,
        config: &FedAuthConfig,
        target: &Target<'_>,
    ) -> Result<CredentialToken, AuthError> {
        let provider = self.provider()?;
        let request = ClientCredentialRequest {
            scope: target.scope,
            authority: target.authority,
            tenant_id: target.tenant_id,
            client_id: required(config.client_id(), "user id")?,
            assertion: ClientAssertion::Secret(required(config.client_secret(), "password")?),
        };
        ctx.run(provider.client_credential(request)).await
    }

    async fn service_principal_certificate(
        &self,
        ctx: &CallContext,
        config: &FedAuthConfig,
        target: &Target<'_>,
    ) -> Result<CredentialToken, AuthError> {
        let path = required(config.certificate_path(), "clientcertpath")?;
        let material = CertificateMaterial::load(path, config.client_secret())?;

        let provider = self.provider()?;
        let request = ClientCredentialRequest {
            scope: target.scope,
            authority: target.authority,
            tenant_id: target.tenant_id,
            client_id: required(config.client_id(), "user id")?,
            assertion: ClientAssertion::Certificate(&material),
        };
        ctx.run(provider.client_credential(request)).await
    }

    async fn managed_identity(
        &self,
        ctx: &CallContext,
        target: &Target<'_>,
        identity: ManagedIdentitySelector<'_>,
    ) -> Result<CredentialToken, AuthError> {
        let provider = self.provider()?;
        let request = ManagedIdentityRequest {
            scope: target.scope,
            identity,
        };
        ctx.run(provider.managed_identity(request)).await
    }
}

struct Target<'a> {
    scope: &'a str,
    authority: &'a str,
    tenant_id: Option<&'a str>,
}

fn presupplied(config: &FedAuthConfig) -> Result<CredentialToken, AuthError> {
    let token = required(config.password(), "password")?;
    Ok(CredentialToken::presupplied(token))
}

fn required<'a, T: ?Sized>(value: Option<&'a T>, field: &'static str) -> Result<&'a T, AuthError> {
    value.ok_or_else(|| AuthError::invalid(field, "missing for the configured workflow"))
}

fn normalize_scope(scope: &str) -> String {
    let scope = scope.trim();
    if scope.is_empty() {
        DEFAULT_SCOPE.to_string()
    } else if scope.ends_with("/.default") {
        scope.to_string()
    } else {
        format!("{}/.default", scope.trim_end_matches('/'))
    }
}

/// Split an authority hint into the authority host and a trailing tenant.
fn split_authority(hint: &str) -> (&str, Option<&str>) {
    let hint = hint.trim().trim_end_matches('/');
    if hint.is_empty() {
        return (DEFAULT_AUTHORITY, None);
    }

    let path_start = hint.find("://").map_or(0, |i| i + 3);
    match hint[path_start..].rsplit_once('/') {
        Some((_, tenant)) if !tenant.is_empty() => {
            (&hint[..hint.len() - tenant.len() - 1], Some(tenant))
        }
        _ => (hint, None),
    }
}
