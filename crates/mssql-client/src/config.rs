//! Client configuration.

use std::fmt;
use std::time::Duration;

use mssql_auth::params::keys;
use mssql_auth::{ConnectionParams, DEFAULT_AUTHORITY, FedAuthConfig};
use tds_protocol::{DEFAULT_PACKET_SIZE, EncryptionLevel, MIN_PACKET_SIZE};
use uuid::Uuid;

use crate::error::Error;
use crate::logging::LogFlags;

/// Largest packet size SQL Server accepts.
const MAX_NEGOTIABLE_PACKET_SIZE: u16 = 32767;

/// Local encryption policy.
///
/// The policy decides the ENCRYPTION byte sent in pre-login and which server
/// answers are acceptable. The connection is never silently downgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionPolicy {
    /// Refuse to encrypt. Fails against servers that require encryption.
    Disabled,
    /// Encrypt when the server wants to, otherwise protect only the login.
    Optional,
    /// Always encrypt. Fails against servers that cannot.
    #[default]
    Mandatory,
    /// TDS 8.0 strict encryption. Fails unless the server offers it.
    Strict,
}

impl EncryptionPolicy {
    /// Parse an `encrypt=` value.
    pub fn parse(value: &str) -> Result<Self, Error> {
        let value = value.trim().to_ascii_lowercase();
        match value.as_str() {
            "disable" | "disabled" => Ok(Self::Disabled),
            "false" | "no" | "0" | "optional" => Ok(Self::Optional),
            "true" | "yes" | "1" | "mandatory" => Ok(Self::Mandatory),
            "strict" => Ok(Self::Strict),
            _ => Err(Error::Config(format!("invalid encrypt value: {value}"))),
        }
    }

    /// The pre-login ENCRYPTION byte for this policy.
    #[must_use]
    pub const fn level(self) -> EncryptionLevel {
        match self {
            Self::Disabled => EncryptionLevel::NotSupported,
            Self::Optional => EncryptionLevel::Off,
            Self::Mandatory => EncryptionLevel::On,
            Self::Strict => EncryptionLevel::Strict,
        }
    }
}

impl fmt::Display for EncryptionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "disable",
            Self::Optional => "optional",
            Self::Mandatory => "mandatory",
            Self::Strict => "strict",
        })
    }
}

/// Timeout configuration for the connection phases.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Time to establish the TCP connection (default: 15s).
    pub connect_timeout: Duration,
    /// Time to complete pre-login and token acquisition (default: 30s).
    pub login_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            login_timeout: Duration::from_secs(30),
        }
    }
}

impl TimeoutConfig {
    /// Create a new timeout configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TCP connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the login sequence timeout.
    #[must_use]
    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }
}

/// Configuration for connecting to SQL Server.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future releases without breaking semver. Use [`Config::default()`]
/// or [`Config::from_connection_string()`] to construct instances.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Server hostname or IP address.
    pub host: String,

    /// Server port (default: 1433).
    pub port: u16,

    /// Instance name (for named instances).
    pub instance: Option<String>,

    /// Local encryption policy.
    pub encryption: EncryptionPolicy,

    /// Enabled log categories.
    pub log_flags: LogFlags,

    /// Activity id to correlate this connection with; generated when absent.
    pub activity_id: Option<Uuid>,

    /// Whether to enable MARS (Multiple Active Result Sets).
    pub mars: bool,

    /// TDS packet size.
    pub packet_size: u16,

    /// Timeout configuration for the connection phases.
    pub timeouts: TimeoutConfig,

    /// Token scope requested from the identity provider. Empty means the
    /// Azure SQL default.
    pub token_scope: String,

    /// Authority host for token requests.
    pub token_authority: String,

    /// Federated authentication settings.
    pub fed_auth: FedAuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1433,
            instance: None,
            encryption: EncryptionPolicy::default(),
            log_flags: LogFlags::empty(),
            activity_id: None,
            mars: false,
            packet_size: DEFAULT_PACKET_SIZE as u16,
            timeouts: TimeoutConfig::default(),
            token_scope: String::new(),
            token_authority: DEFAULT_AUTHORITY.to_string(),
            fed_auth: FedAuthConfig::none(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a connection string into configuration.
    ///
    /// Supports ADO.NET-style connection strings:
    /// ```text
    /// Server=myserver.database.windows.net;Database=mydb;fedauth=ActiveDirectoryMSI;
    /// ```
    ///
    /// Keys are case-insensitive. Federated authentication keys are validated
    /// together by [`FedAuthConfig::from_params`].
    pub fn from_connection_string(conn_str: &str) -> Result<Self, Error> {
        let params = ConnectionParams::parse(conn_str)?;
        Self::from_params(&params)
    }

    /// Build configuration from already-split connection parameters.
    pub fn from_params(params: &ConnectionParams) -> Result<Self, Error> {
        let mut config = Self {
            fed_auth: FedAuthConfig::from_params(params)?,
            ..Self::default()
        };

        for (key, value) in params.iter() {
            match key {
                "server" | "data source" | "host" | "address" | "addr" => {
                    let value = value.strip_prefix("tcp:").unwrap_or(value);
                    // host[\instance][,port]
                    let host = match value.split_once(',') {
                        Some((host, port)) => {
                            config.port = parse_port(port.trim())?;
                            host.trim()
                        }
                        None => value,
                    };
                    match host.split_once('\\') {
                        Some((host, instance)) => {
                            config.host = host.to_string();
                            config.instance = Some(instance.to_string());
                        }
                        None => config.host = host.to_string(),
                    }
                }
                "port" => {
                    config.port = parse_port(value)?;
                }
                "encrypt" => {
                    config.encryption = EncryptionPolicy::parse(value)?;
                }
                "log" => {
                    let bits: u64 = value
                        .parse()
                        .map_err(|_| Error::Config(format!("invalid log flags: {value}")))?;
                    config.log_flags = LogFlags::from_bits_truncate(bits);
                }
                "activityid" | "activity id" => {
                    let id = Uuid::parse_str(value)
                        .map_err(|_| Error::Config(format!("invalid activity id: {value}")))?;
                    config.activity_id = Some(id);
                }
                "multipleactiveresultsets" | "mars" => {
                    config.mars = parse_bool(key, value)?;
                }
                "packet size" => {
                    let size: u16 = value
                        .parse()
                        .map_err(|_| Error::Config(format!("invalid packet size: {value}")))?;
                    if usize::from(size) < MIN_PACKET_SIZE || size > MAX_NEGOTIABLE_PACKET_SIZE {
                        return Err(Error::Config(format!(
                            "packet size {size} is outside {MIN_PACKET_SIZE}..={MAX_NEGOTIABLE_PACKET_SIZE}"
                        )));
                    }
                    config.packet_size = size;
                }
                "connect timeout" | "connection timeout" | "dial timeout" => {
                    config.timeouts.connect_timeout = parse_seconds(value)?;
                }
                "login timeout" => {
                    config.timeouts.login_timeout = parse_seconds(value)?;
                }
                keys::FEDAUTH
                | keys::USER_ID
                | keys::PASSWORD
                | keys::CLIENT_CERT_PATH
                | keys::APPLICATION_CLIENT_ID
                | keys::RESOURCE_ID
                | keys::TENANT_ID => {
                    // Consumed by FedAuthConfig
                }
                _ => {
                    // Ignore unknown options for forward compatibility
                    tracing::debug!(key = key, "ignoring unknown connection string option");
                }
            }
        }

        Ok(config)
    }

    /// Set the server host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the named instance.
    #[must_use]
    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Set the encryption policy.
    #[must_use]
    pub fn encryption(mut self, policy: EncryptionPolicy) -> Self {
        self.encryption = policy;
        self
    }

    /// Set the enabled log categories.
    #[must_use]
    pub fn log_flags(mut self, flags: LogFlags) -> Self {
        self.log_flags = flags;
        self
    }

    /// Set the activity id.
    #[must_use]
    pub fn activity_id(mut self, id: Uuid) -> Self {
        self.activity_id = Some(id);
        self
    }

    /// Enable or disable MARS.
    #[must_use]
    pub fn mars(mut self, enabled: bool) -> Self {
        self.mars = enabled;
        self
    }

    /// Set the TDS packet size.
    #[must_use]
    pub fn packet_size(mut self, size: u16) -> Self {
        self.packet_size = size;
        self
    }

    /// Set the timeout configuration.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the login timeout.
    #[must_use]
    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.login_timeout = timeout;
        self
    }

    /// Set the federated authentication settings.
    #[must_use]
    pub fn fed_auth(mut self, fed_auth: FedAuthConfig) -> Self {
        self.fed_auth = fed_auth;
        self
    }

    /// Set the token scope.
    #[must_use]
    pub fn token_scope(mut self, scope: impl Into<String>) -> Self {
        self.token_scope = scope.into();
        self
    }

    /// Set the token authority.
    #[must_use]
    pub fn token_authority(mut self, authority: impl Into<String>) -> Self {
        self.token_authority = authority.into();
        self
    }
}

fn parse_port(value: &str) -> Result<u16, Error> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("invalid port: {value}")))
}

fn parse_seconds(value: &str) -> Result<Duration, Error> {
    let secs: u64 = value
        .parse()
        .map_err(|_| Error::Config(format!("invalid timeout: {value}")))?;
    Ok(Duration::from_secs(secs))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes") || value == "1" {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") || value.eq_ignore_ascii_case("no") || value == "0"
    {
        Ok(false)
    } else {
        Err(Error::Config(format!("invalid boolean for {key}: {value}")))
    }
}
