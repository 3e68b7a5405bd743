//! Identity provider backed by the `azure_identity` crate.
//!
//! Enabled with the `azure-identity` feature. Covers managed identity
//! (system-assigned, client id, resource id) and service principals with a
//! client secret; certificate credentials additionally need `cert-auth`.
//!
//! The Azure SDK has no resource-owner password grant, so
//! [`IdentityProvider::password_grant`] reports
//! [`AuthError::UnsupportedWorkflow`]. Supply a custom provider for that flow.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mssql_auth::{AzureIdentityProvider, WorkflowDispatcher};
//!
//! let dispatcher = WorkflowDispatcher::new(Arc::new(AzureIdentityProvider::new()));
//! ```

use std::time::SystemTime;

use async_trait::async_trait;
use azure_core::credentials::{Secret, TokenCredential};
use azure_identity::{
    ClientSecretCredential, ManagedIdentityCredential, ManagedIdentityCredentialOptions,
    UserAssignedId,
};

use crate::error::AuthError;
use crate::provider::{
    ClientAssertion, ClientCredentialRequest, IdentityProvider, ManagedIdentityRequest,
    ManagedIdentitySelector, PasswordGrant,
};
use crate::token::CredentialToken;

/// [`IdentityProvider`] using Azure SDK credentials.
#[derive(Debug, Clone, Default)]
pub struct AzureIdentityProvider {
    _private: (),
}

impl AzureIdentityProvider {
    /// Create the provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for AzureIdentityProvider {
    async fn password_grant(&self, _grant: PasswordGrant<'_>) -> Result<CredentialToken, AuthError> {
        Err(AuthError::UnsupportedWorkflow(
            "password grant is not available through azure_identity".into(),
        ))
    }

    async fn client_credential(
        &self,
        request: ClientCredentialRequest<'_>,
    ) -> Result<CredentialToken, AuthError> {
        let tenant_id = request.tenant_id.ok_or_else(|| {
            AuthError::invalid("tenant id", "a tenant is required for service principal credentials")
        })?;

        match request.assertion {
            ClientAssertion::Secret(secret) => {
                let credential = ClientSecretCredential::new(
                    tenant_id,
                    request.client_id.to_string(),
                    Secret::new(secret.to_string()),
                    None,
                )
                .map_err(map_azure_error)?;
                fetch(&*credential, request.scope).await
            }
            #[cfg(feature = "cert-auth")]
            ClientAssertion::Certificate(material) => {
                use azure_identity::{ClientCertificateCredential, ClientCertificateCredentialOptions};
                use base64::Engine;

                let encoded = zeroize::Zeroizing::new(
                    base64::engine::general_purpose::STANDARD.encode(material.pkcs12()),
                );
                let options = ClientCertificateCredentialOptions::new(
                    azure_identity::TokenCredentialOptions::default(),
                    false,
                );
                let credential = ClientCertificateCredential::new(
                    tenant_id.to_string(),
                    request.client_id.to_string(),
                    Secret::new(encoded.to_string()),
                    Secret::new(material.passphrase().to_string()),
                    options,
                )
                .map_err(map_azure_error)?;
                fetch(&*credential, request.scope).await
            }
            #[cfg(not(feature = "cert-auth"))]
            ClientAssertion::Certificate(_) => Err(AuthError::UnsupportedWorkflow(
                "certificate credentials require the `cert-auth` feature".into(),
            )),
        }
    }

    async fn managed_identity(
        &self,
        request: ManagedIdentityRequest<'_>,
    ) -> Result<CredentialToken, AuthError> {
        let user_assigned_id = match request.identity {
            ManagedIdentitySelector::SystemAssigned => None,
            ManagedIdentitySelector::ClientId(id) => Some(UserAssignedId::ClientId(id.to_string())),
            ManagedIdentitySelector::ResourceId(id) => {
                Some(UserAssignedId::ResourceId(id.to_string()))
            }
        };
        let options = ManagedIdentityCredentialOptions {
            user_assigned_id,
            ..Default::default()
        };
        let credential = ManagedIdentityCredential::new(Some(options)).map_err(map_azure_error)?;
        fetch(&*credential, request.scope).await
    }
}

async fn fetch(credential: &dyn TokenCredential, scope: &str) -> Result<CredentialToken, AuthError> {
    let token = credential
        .get_token(&[scope], None)
        .await
        .map_err(map_azure_error)?;
    Ok(CredentialToken::new(
        token.token.secret(),
        Some(SystemTime::from(token.expires_on)),
    ))
}

fn map_azure_error(e: azure_core::Error) -> AuthError {
    match e.kind() {
        azure_core::error::ErrorKind::Io => AuthError::Transient(e.to_string()),
        _ => AuthError::Credential(e.to_string()),
    }
}
