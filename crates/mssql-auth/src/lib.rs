//! # mssql-auth
//!
//! Federated authentication for SQL Server connections.
//!
//! This crate turns connection parameters into a validated
//! [`FedAuthConfig`] and runs the selected credential workflow to obtain a
//! bearer token, isolated from connection logic for better modularity and
//! testing.
//!
//! ## Workflows
//!
//! | Workflow | Keyword | Token source |
//! |----------|---------|--------------|
//! | Password | `ActiveDirectoryPassword` | [`IdentityProvider::password_grant`] |
//! | Service principal (secret) | `ActiveDirectoryServicePrincipal` | [`IdentityProvider::client_credential`] |
//! | Service principal (certificate) | `ActiveDirectoryServicePrincipal` + `clientcertpath` | [`IdentityProvider::client_credential`] |
//! | Managed identity | `ActiveDirectoryManagedIdentity` / `ActiveDirectoryMSI` | [`IdentityProvider::managed_identity`] |
//! | Access token | `ActiveDirectoryServicePrincipalAccessToken` | the configured token, no call |
//!
//! ## Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `azure-identity` | [`AzureIdentityProvider`] backed by `azure_identity` |
//! | `cert-auth` | Certificate credentials for [`AzureIdentityProvider`] |
//!
//! ## Example
//!
//! ```rust
//! use mssql_auth::{CallContext, FedAuthConfig, FedAuthWorkflow, WorkflowDispatcher};
//!
//! # tokio_test::block_on(async {
//! let config = FedAuthConfig::parse(
//!     "fedauth=ActiveDirectoryServicePrincipalAccessToken;password=eyJ0eXAi...",
//! )?;
//! assert_eq!(config.workflow(), FedAuthWorkflow::PreSuppliedToken);
//!
//! let token = WorkflowDispatcher::without_provider()
//!     .provide_token(&CallContext::new(), &config, "", "")
//!     .await?;
//! assert_eq!(token.secret(), "eyJ0eXAi...");
//! # Ok::<(), mssql_auth::AuthError>(())
//! # }).unwrap();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cert_auth;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod fedauth;
pub mod params;
pub mod provider;
pub mod token;

#[cfg(feature = "azure-identity")]
pub mod azure_identity_auth;

pub use cert_auth::CertificateMaterial;
pub use context::{CallContext, Interrupted};
pub use dispatcher::{
    DEFAULT_APPLICATION_CLIENT_ID, DEFAULT_AUTHORITY, DEFAULT_SCOPE, WorkflowDispatcher,
};
pub use error::{AuthError, ErrorClass};
pub use fedauth::{FedAuthConfig, FedAuthWorkflow, split_tenant_and_client_id};
pub use params::ConnectionParams;
pub use provider::{
    ClientAssertion, ClientCredentialRequest, IdentityProvider, ManagedIdentityRequest,
    ManagedIdentitySelector, PasswordGrant,
};
pub use token::CredentialToken;

pub use tds_protocol::fedauth::{AdalWorkflow, FedAuthLibrary};

#[cfg(feature = "azure-identity")]
pub use azure_identity_auth::AzureIdentityProvider;
