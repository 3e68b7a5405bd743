//! Flat connection parameters.
//!
//! Connection strings use the ADO.NET `key=value;key=value` form. Keys are
//! case-insensitive and a handful of aliases are folded onto one canonical
//! spelling so the rest of the crate only looks up one name.

use std::collections::BTreeMap;

use crate::error::AuthError;

/// Canonical parameter names used by the federated authentication layer.
pub mod keys {
    /// Federated authentication workflow keyword.
    pub const FEDAUTH: &str = "fedauth";
    /// User id (user principal, application id or managed identity client id).
    pub const USER_ID: &str = "user id";
    /// Password, client secret, certificate passphrase or access token.
    pub const PASSWORD: &str = "password";
    /// Path to a PKCS#12 client certificate.
    pub const CLIENT_CERT_PATH: &str = "clientcertpath";
    /// Driver application (client) id.
    pub const APPLICATION_CLIENT_ID: &str = "applicationclientid";
    /// Managed identity resource id.
    pub const RESOURCE_ID: &str = "resource id";
    /// Directory tenant id.
    pub const TENANT_ID: &str = "tenant id";
}

/// Map an input key onto its canonical spelling.
#[must_use]
pub fn canonical_key(key: &str) -> String {
    let key = key.trim().to_lowercase();
    match key.as_str() {
        "uid" | "user" | "userid" => keys::USER_ID.to_string(),
        "pwd" => keys::PASSWORD.to_string(),
        "tenantid" => keys::TENANT_ID.to_string(),
        "resourceid" => keys::RESOURCE_ID.to_string(),
        "application client id" => keys::APPLICATION_CLIENT_ID.to_string(),
        "client certificate path" => keys::CLIENT_CERT_PATH.to_string(),
        _ => key,
    }
}

/// Case-insensitive connection parameter map.
///
/// When a key appears more than once the last value wins.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    values: BTreeMap<String, String>,
}

impl ConnectionParams {
    /// Create an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value;` text.
    ///
    /// Empty segments are skipped. A segment without `=` is rejected.
    pub fn parse(conn_str: &str) -> Result<Self, AuthError> {
        let mut params = Self::new();

        for part in conn_str.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part.split_once('=').ok_or_else(|| {
                AuthError::invalid("connection string", "segment is not of the form key=value")
            })?;

            if key.trim().is_empty() {
                return Err(AuthError::invalid(
                    "connection string",
                    "segment has an empty key",
                ));
            }

            params.insert(key, value.trim());
        }

        Ok(params)
    }

    /// Build from already-split pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.insert(key.as_ref(), value);
        }
        params
    }

    /// Insert a parameter under its canonical key.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(canonical_key(key), value.into());
    }

    /// Look up a parameter by any of its spellings.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&canonical_key(key)).map(String::as_str)
    }

    /// Look up a parameter, treating an empty value as absent.
    #[must_use]
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Check whether a parameter is present with a non-empty value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get_non_empty(key).is_some()
    }

    /// Iterate over `(canonical key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            if key == keys::PASSWORD {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}
