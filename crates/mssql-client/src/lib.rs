//! # mssql-client
//!
//! Async connection establishment for SQL Server.
//!
//! This crate covers everything that happens on a new connection before the
//! login packet is sent:
//!
//! - **Sessions**: fresh connection id, activity id and log mask per attempt
//! - **Pre-login**: option exchange and encryption agreement
//! - **Federated authentication**: token acquisition through
//!   [`mssql_auth::WorkflowDispatcher`] when a `fedauth` workflow is configured
//! - **Contextual logging**: category-masked log lines tagged with session ids
//!
//! ## Handshake States
//!
//! ```text
//! Init -> OptionsSent -> OptionsReceived -> EncryptionAgreed
//!      -> (FedAuthRequested -> TokenAcquired)? -> Done
//! ```
//!
//! Any failure ends in `Aborted`; the handshake never retries.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mssql_client::{CallContext, Config, Connector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_connection_string(
//!         "Server=myserver.database.windows.net;Database=mydb;\
//!          fedauth=ActiveDirectoryServicePrincipalAccessToken;password=eyJ0eXAi...",
//!     )?;
//!
//!     let connection = Connector::new(config).connect(&CallContext::new()).await?;
//!     let outcome = connection.outcome();
//!     println!("encryption: {:?}", outcome.encryption);
//!     println!("token acquired: {}", outcome.token.is_some());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod handshake;
pub mod logging;
pub mod session;
pub mod state;
pub mod transport;

pub use client::{Connection, Connector};
pub use config::{Config, EncryptionPolicy, TimeoutConfig};
pub use error::{Error, Result};
pub use handshake::{HandshakeOutcome, PreLoginHandshake, negotiate_encryption};
pub use logging::{ContextLogger, LogFlags, LogRecord, TracingLogger};
pub use session::{NegotiatedEncryption, Session, TransportDefaults};
pub use state::HandshakeState;

// Re-export credential types used in the public API
pub use mssql_auth::{
    AuthError, CallContext, CredentialToken, FedAuthConfig, FedAuthWorkflow, IdentityProvider,
    WorkflowDispatcher,
};
pub use tokio_util::sync::CancellationToken;
