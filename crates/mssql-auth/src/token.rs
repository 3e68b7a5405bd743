//! Bearer tokens produced by the credential workflows.
//!
//! A [`CredentialToken`] is handed from the dispatcher to the handshake and on
//! to the login stage. The value is zeroed when the token is dropped and is
//! never rendered by `Debug`.

use std::time::{Duration, SystemTime};

use bytes::{BufMut, Bytes, BytesMut};
use zeroize::Zeroizing;

/// An access token for the database resource.
#[derive(Clone)]
pub struct CredentialToken {
    value: Zeroizing<String>,
    expires_at: Option<SystemTime>,
}

impl CredentialToken {
    /// A token issued by an identity provider.
    pub fn new(value: impl Into<String>, expires_at: Option<SystemTime>) -> Self {
        Self {
            value: Zeroizing::new(value.into()),
            expires_at,
        }
    }

    /// A token supplied by the caller. Its expiry is the caller's concern.
    pub fn presupplied(value: impl Into<String>) -> Self {
        Self::new(value, None)
    }

    /// The bearer token value.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.value
    }

    /// When the token expires, if known.
    #[must_use]
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    /// Check if the token is expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expiring_soon(Duration::ZERO)
    }

    /// Check if the token expires within the given duration.
    #[must_use]
    pub fn is_expiring_soon(&self, within: Duration) -> bool {
        self.expires_at
            .is_some_and(|exp| SystemTime::now() + within >= exp)
    }

    /// Build the FEDAUTH token message payload.
    ///
    /// Format: `u32` LE byte length followed by the UTF-16LE token.
    #[must_use]
    pub fn build_token_data(&self) -> Bytes {
        let utf16 = Zeroizing::new(
            self.value
                .encode_utf16()
                .flat_map(u16::to_le_bytes)
                .collect::<Vec<u8>>(),
        );

        let mut data = BytesMut::with_capacity(4 + utf16.len());
        data.put_u32_le(utf16.len() as u32);
        data.put_slice(&utf16);
        data.freeze()
    }
}

impl std::fmt::Debug for CredentialToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
