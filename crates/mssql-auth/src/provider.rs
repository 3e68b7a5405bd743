//! Identity provider seam.
//!
//! The dispatcher never talks to a directory service itself. It hands the
//! validated parameters of the selected workflow to an [`IdentityProvider`],
//! which performs the network exchange and returns a [`CredentialToken`].
//!
//! Implementations may keep their own token cache; if they do, it must be safe
//! to share between concurrently connecting sessions.

use async_trait::async_trait;

use crate::cert_auth::CertificateMaterial;
use crate::error::AuthError;
use crate::token::CredentialToken;

/// Password grant for a user principal.
#[derive(Clone, Copy)]
pub struct PasswordGrant<'a> {
    /// Token scope.
    pub scope: &'a str,
    /// Authority host URL.
    pub authority: &'a str,
    /// Tenant, when known.
    pub tenant_id: Option<&'a str>,
    /// Application (client) id the grant is requested for.
    pub client_id: &'a str,
    /// User principal name.
    pub user: &'a str,
    /// User password.
    pub password: &'a str,
}

impl std::fmt::Debug for PasswordGrant<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordGrant")
            .field("scope", &self.scope)
            .field("authority", &self.authority)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// How a service principal proves its identity.
#[derive(Clone, Copy)]
pub enum ClientAssertion<'a> {
    /// Shared client secret.
    Secret(&'a str),
    /// PKCS#12 certificate.
    Certificate(&'a CertificateMaterial),
}

impl std::fmt::Debug for ClientAssertion<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secret(_) => f.write_str("Secret([REDACTED])"),
            Self::Certificate(material) => f.debug_tuple("Certificate").field(material).finish(),
        }
    }
}

/// Client credential grant for a service principal.
#[derive(Debug, Clone, Copy)]
pub struct ClientCredentialRequest<'a> {
    /// Token scope.
    pub scope: &'a str,
    /// Authority host URL.
    pub authority: &'a str,
    /// Tenant, when known.
    pub tenant_id: Option<&'a str>,
    /// Service principal application id.
    pub client_id: &'a str,
    /// Secret or certificate.
    pub assertion: ClientAssertion<'a>,
}

/// Which managed identity to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedIdentitySelector<'a> {
    /// The identity assigned to the host.
    SystemAssigned,
    /// A user-assigned identity by client id.
    ClientId(&'a str),
    /// A user-assigned identity by Azure resource id.
    ResourceId(&'a str),
}

/// Managed identity token request.
#[derive(Debug, Clone, Copy)]
pub struct ManagedIdentityRequest<'a> {
    /// Token scope.
    pub scope: &'a str,
    /// Identity to use.
    pub identity: ManagedIdentitySelector<'a>,
}

/// External identity provider.
///
/// One method per call shape. A pre-supplied token never reaches the
/// provider. Implementations report rejection by the directory as
/// [`AuthError::Credential`] and network trouble as [`AuthError::Transient`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Acquire a token with a user principal's password.
    async fn password_grant(&self, grant: PasswordGrant<'_>) -> Result<CredentialToken, AuthError>;

    /// Acquire a token for a service principal.
    async fn client_credential(
        &self,
        request: ClientCredentialRequest<'_>,
    ) -> Result<CredentialToken, AuthError>;

    /// Acquire a token from the instance metadata endpoint.
    async fn managed_identity(
        &self,
        request: ManagedIdentityRequest<'_>,
    ) -> Result<CredentialToken, AuthError>;
}
