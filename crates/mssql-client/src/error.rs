//! Client error types.

use mssql_auth::{AuthError, ErrorClass, Interrupted};
use tds_protocol::{EncryptionLevel, ProtocolError};
use thiserror::Error;

use crate::config::EncryptionPolicy;

/// Errors that can occur while establishing a connection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed or contradictory connection parameters.
    #[error("configuration error: {0}")]
    Config(String),

    /// Credential configuration or token acquisition failed.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// The server sent bytes that cannot be interpreted.
    #[error("malformed protocol data: {0}")]
    MalformedProtocolData(#[from] ProtocolError),

    /// The server cannot satisfy the local encryption policy.
    #[error("encryption policy '{policy}' cannot be satisfied: server advertised {server:?}")]
    EncryptionPolicyViolation {
        /// Local policy.
        policy: EncryptionPolicy,
        /// Level advertised by the server.
        server: EncryptionLevel,
    },

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller cancelled the connection attempt.
    #[error("connection attempt cancelled")]
    Cancelled,

    /// The connection attempt ran out of time.
    #[error("connection timed out")]
    Timeout,
}

impl From<Interrupted> for Error {
    fn from(interrupted: Interrupted) -> Self {
        match interrupted {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::DeadlineExceeded => Self::Timeout,
        }
    }
}

impl Error {
    /// Check if this error is transient and the connection attempt may be
    /// retried as a whole.
    ///
    /// The handshake itself never retries.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionClosed | Self::Io(_) | Self::Cancelled | Self::Timeout => true,
            Self::Authentication(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Check if this error is caused by the connection parameters.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Authentication(e) => e.is_configuration(),
            _ => false,
        }
    }

    /// Check if the identity provider or the local credential material
    /// rejected the request.
    #[must_use]
    pub fn is_credential_error(&self) -> bool {
        matches!(self, Self::Authentication(e) if e.class() == ErrorClass::Credential)
    }

    /// Check if the server sent an undecodable pre-login response.
    ///
    /// This usually means a protocol or version mismatch rather than a user
    /// error.
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::MalformedProtocolData(_))
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
