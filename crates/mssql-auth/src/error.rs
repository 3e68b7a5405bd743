//! Authentication error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// How an authentication failure should be handled by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Bad or contradictory input, or unusable local credential material.
    /// Fails fast and is never retried.
    Configuration,
    /// The identity provider rejected the request. Not retried automatically.
    Credential,
    /// Network failure, timeout or cancellation. The whole connection
    /// attempt may be retried.
    Transient,
}

/// Errors that can occur while configuring or acquiring credentials.
///
/// Messages never contain secrets (passwords, client secrets, tokens or key
/// material).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Malformed or contradictory connection parameters.
    #[error("invalid configuration for '{field}': {message}")]
    InvalidConfiguration {
        /// Parameter the problem was found in.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Unrecognized or unimplemented federated authentication keyword.
    #[error("unsupported federated authentication workflow: {0}")]
    UnsupportedWorkflow(String),

    /// Certificate file does not exist.
    #[error("certificate file not found: {}", path.display())]
    FileNotFound {
        /// Configured path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Certificate file exists but could not be read.
    #[error("failed to read certificate file {}", path.display())]
    CertificateRead {
        /// Configured path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Certificate file content is not a usable PKCS#12 container.
    #[error("failed to parse certificate {}: {reason}", path.display())]
    CertificateParse {
        /// Configured path.
        path: PathBuf,
        /// Rendered decoder failure.
        reason: String,
    },

    /// PKCS#12 container is well-formed but lacks a required element.
    #[error("certificate {} contains no {missing}", path.display())]
    CertificateContent {
        /// Configured path.
        path: PathBuf,
        /// Element that was not found.
        missing: &'static str,
    },

    /// Identity provider rejected the request.
    #[error("credential rejected: {0}")]
    Credential(String),

    /// Network failure while talking to the identity provider.
    #[error("transient identity provider failure: {0}")]
    Transient(String),

    /// The caller cancelled the operation.
    #[error("token acquisition cancelled")]
    Cancelled,

    /// The caller's deadline elapsed.
    #[error("token acquisition timed out")]
    Timeout,
}

impl AuthError {
    /// Build an `InvalidConfiguration` error.
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            message: message.into(),
        }
    }

    /// Classify the error for retry decisions.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidConfiguration { .. }
            | Self::UnsupportedWorkflow(_)
            | Self::FileNotFound { .. }
            | Self::CertificateRead { .. }
            | Self::CertificateParse { .. }
            | Self::CertificateContent { .. } => ErrorClass::Configuration,
            Self::Credential(_) => ErrorClass::Credential,
            Self::Transient(_) | Self::Cancelled | Self::Timeout => ErrorClass::Transient,
        }
    }

    /// Check if the whole connection attempt may be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        self.class() == ErrorClass::Configuration
    }
}

impl From<crate::context::Interrupted> for AuthError {
    fn from(interrupted: crate::context::Interrupted) -> Self {
        match interrupted {
            crate::context::Interrupted::Cancelled => Self::Cancelled,
            crate::context::Interrupted::DeadlineExceeded => Self::Timeout,
        }
    }
}
