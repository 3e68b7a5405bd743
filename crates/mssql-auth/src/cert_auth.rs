//! PKCS#12 client certificate loading.
//!
//! The service principal certificate workflow signs its token request with a
//! private key read from a PKCS#12 (`.pfx`/`.p12`) file. Loading is
//! synchronous and local: the file is read, its MAC is checked against the
//! passphrase, and the key and certificate bags are extracted.
//!
//! Failures are kept apart so callers can tell what to fix:
//!
//! - [`AuthError::FileNotFound`]: nothing at the configured path
//! - [`AuthError::CertificateRead`]: the file exists but cannot be read
//! - [`AuthError::CertificateParse`]: the bytes are not a PKCS#12 container,
//!   or the passphrase does not open it
//! - [`AuthError::CertificateContent`]: a valid container without a key or
//!   certificate
//!
//! All material is zeroed when [`CertificateMaterial`] is dropped, including
//! on every error path.

use std::io;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use crate::error::AuthError;

/// Decoded certificate material for one token request.
pub struct CertificateMaterial {
    path: PathBuf,
    pkcs12: Zeroizing<Vec<u8>>,
    passphrase: Zeroizing<String>,
    private_key: Zeroizing<Vec<u8>>,
    chain: Vec<Vec<u8>>,
}

impl CertificateMaterial {
    /// Read and decode a PKCS#12 file.
    ///
    /// An absent passphrase is treated as the empty passphrase.
    pub fn load(path: &Path, passphrase: Option<&str>) -> Result<Self, AuthError> {
        let pkcs12 = Zeroizing::new(std::fs::read(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                AuthError::FileNotFound {
                    path: path.to_path_buf(),
                    source,
                }
            } else {
                AuthError::CertificateRead {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?);
        let passphrase = Zeroizing::new(passphrase.unwrap_or_default().to_string());

        Self::decode(path, pkcs12, passphrase)
    }

    fn decode(
        path: &Path,
        pkcs12: Zeroizing<Vec<u8>>,
        passphrase: Zeroizing<String>,
    ) -> Result<Self, AuthError> {
        let parse_error = |reason: String| AuthError::CertificateParse {
            path: path.to_path_buf(),
            reason,
        };

        let pfx = p12::PFX::parse(&pkcs12)
            .map_err(|e| parse_error(format!("error reading P12 data: {e:?}")))?;

        if !pfx.verify_mac(&passphrase) {
            return Err(parse_error(
                "error reading P12 data: MAC verification failed, wrong passphrase".to_string(),
            ));
        }

        let mut keys = pfx
            .key_bags(&passphrase)
            .map_err(|e| parse_error(format!("error reading P12 key bags: {e:?}")))?;
        if keys.is_empty() {
            return Err(AuthError::CertificateContent {
                path: path.to_path_buf(),
                missing: "private key",
            });
        }
        let private_key = Zeroizing::new(keys.swap_remove(0));
        for mut key in keys {
            zeroize::Zeroize::zeroize(&mut key);
        }

        let chain = pfx
            .cert_x509_bags(&passphrase)
            .map_err(|e| parse_error(format!("error reading P12 certificate bags: {e:?}")))?;
        if chain.is_empty() {
            return Err(AuthError::CertificateContent {
                path: path.to_path_buf(),
                missing: "certificate",
            });
        }

        tracing::debug!(
            path = %path.display(),
            certificates = chain.len(),
            "loaded client certificate"
        );

        Ok(Self {
            path: path.to_path_buf(),
            pkcs12,
            passphrase,
            private_key,
            chain,
        })
    }

    /// Path the material was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw PKCS#12 container.
    #[must_use]
    pub fn pkcs12(&self) -> &[u8] {
        &self.pkcs12
    }

    /// The passphrase protecting the container.
    #[must_use]
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// The PKCS#8 DER private key.
    #[must_use]
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    /// DER certificates, leaf first as stored in the container.
    #[must_use]
    pub fn chain(&self) -> &[Vec<u8>] {
        &self.chain
    }
}

impl std::fmt::Debug for CertificateMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateMaterial")
            .field("path", &self.path)
            .field("private_key", &"[REDACTED]")
            .field("certificates", &self.chain.len())
            .finish()
    }
}
