//! Per-connection session state.
//!
//! A [`Session`] is created when a connection attempt begins and discarded
//! with the physical connection. Its identifiers never change and are never
//! reused: a reconnect builds a new session.

use std::fmt;
use std::sync::Arc;

use tds_protocol::guid;
use tds_protocol::{
    DEFAULT_PACKET_SIZE, FedAuthFeature, FedAuthLibrary, OptionBlock, PreLogin, PreLoginVersion,
    TraceId,
};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::logging::{ContextLogger, LogFlags, LogRecord, TracingLogger};

/// Upper bound for a reassembled pre-login response.
const DEFAULT_MAX_MESSAGE_SIZE: usize = 128 * 1024;

/// Framing limits applied to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportDefaults {
    /// Size of outgoing packets, header included.
    pub packet_size: usize,
    /// Largest response message accepted before the connection is dropped.
    pub max_message_size: usize,
}

impl Default for TransportDefaults {
    fn default() -> Self {
        Self {
            packet_size: DEFAULT_PACKET_SIZE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl TransportDefaults {
    /// Defaults with the packet size taken from the configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            packet_size: usize::from(config.packet_size),
            ..Self::default()
        }
    }
}

/// Encryption mode agreed during pre-login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiatedEncryption {
    /// Nothing is encrypted.
    Off,
    /// The whole connection is encrypted.
    On,
    /// TDS 8.0 strict encryption.
    Strict,
    /// Only the login exchange is encrypted.
    LoginOnly,
}

/// Identity and logging state of one physical connection.
pub struct Session {
    connection_id: Uuid,
    activity_id: Uuid,
    log_mask: LogFlags,
    logger: Arc<dyn ContextLogger>,
    transport: TransportDefaults,
    negotiated_encryption: Option<NegotiatedEncryption>,
}

impl Session {
    /// Start a session for a new connection attempt.
    ///
    /// The connection id is always fresh. The activity id comes from the
    /// configuration when set and is generated otherwise. Without a logger
    /// handle, admitted records go to [`TracingLogger`].
    #[must_use]
    pub fn new(
        transport: TransportDefaults,
        logger: Option<Arc<dyn ContextLogger>>,
        config: &Config,
    ) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            activity_id: config.activity_id.unwrap_or_else(Uuid::new_v4),
            log_mask: config.log_flags,
            logger: logger.unwrap_or_else(|| Arc::new(TracingLogger)),
            transport,
            negotiated_encryption: None,
        }
    }

    /// Connection id.
    #[must_use]
    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Activity id.
    #[must_use]
    pub fn activity_id(&self) -> Uuid {
        self.activity_id
    }

    /// Enabled log categories.
    #[must_use]
    pub fn log_mask(&self) -> LogFlags {
        self.log_mask
    }

    /// Framing limits for this connection.
    #[must_use]
    pub fn transport(&self) -> TransportDefaults {
        self.transport
    }

    /// Encryption agreed with the server, once pre-login has completed.
    #[must_use]
    pub fn negotiated_encryption(&self) -> Option<NegotiatedEncryption> {
        self.negotiated_encryption
    }

    pub(crate) fn set_negotiated_encryption(&mut self, encryption: NegotiatedEncryption) {
        self.negotiated_encryption = Some(encryption);
    }

    /// Check whether a category passes the mask.
    #[must_use]
    pub fn is_enabled(&self, category: LogFlags) -> bool {
        self.log_mask.intersects(category)
    }

    /// Log a message under `category`.
    ///
    /// Does nothing, and does not format `message`, unless the category is
    /// enabled.
    pub fn log(&self, category: LogFlags, message: impl fmt::Display) {
        if !self.is_enabled(category) {
            return;
        }
        let message = message.to_string();
        self.logger.log(&LogRecord {
            category,
            connection_id: self.connection_id,
            activity_id: self.activity_id,
            message: &message,
        });
    }

    /// Trace id carried in pre-login: the connection id in wire byte order,
    /// then the activity id bytes as configured.
    #[must_use]
    pub fn trace_id(&self) -> TraceId {
        TraceId {
            connection_id: guid::to_wire(self.connection_id.into_bytes()),
            activity_id: self.activity_id.into_bytes(),
        }
    }

    /// Build the client's pre-login options.
    ///
    /// `fed_auth` is the feature extension that will be sent in LOGIN7;
    /// when present `FEDAUTHREQUIRED` is set.
    pub fn prelogin_fields(
        &self,
        config: &Config,
        fed_auth: Option<&FedAuthFeature>,
    ) -> Result<OptionBlock> {
        let fed_auth_required =
            fed_auth.is_some_and(|feature| feature.library != FedAuthLibrary::Reserved);

        let mut prelogin = PreLogin::new()
            .with_version(driver_version())
            .with_encryption(config.encryption.level())
            .with_thread_id(0)
            .with_mars(config.mars)
            .with_trace_id(self.trace_id())
            .with_fed_auth_required(fed_auth_required);
        if let Some(instance) = config.instance.as_deref().filter(|i| !i.is_empty()) {
            prelogin = prelogin.with_instance(instance);
        }

        Ok(prelogin.to_options()?)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("connection_id", &self.connection_id)
            .field("activity_id", &self.activity_id)
            .field("log_mask", &self.log_mask)
            .field("transport", &self.transport)
            .field("negotiated_encryption", &self.negotiated_encryption)
            .finish_non_exhaustive()
    }
}

fn driver_version() -> PreLoginVersion {
    PreLoginVersion {
        major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
        minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
        build: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        sub_build: 0,
    }
}
