//! Per-session contextual logging.
//!
//! Every connection owns a logger handle and a category mask fixed when the
//! session is created. A record is handed to the [`ContextLogger`] only if
//! its category intersects the mask, and each admitted record carries the
//! connection and activity ids so lines from concurrent connections can be
//! told apart:
//!
//! ```text
//! aid:5ac439f7-d5de-484c-8e0a-cbe27e7e9d72 cid:1b4e28ba-2fa1-11d2-883f-0016d3cca427 - message
//! ```
//!
//! There is no process-wide logger. Without an explicit handle, records go
//! to [`TracingLogger`].

use std::fmt;

use bitflags::bitflags;
use uuid::Uuid;

bitflags! {
    /// Log categories.
    ///
    /// Values match the traditional `log` connection-string bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LogFlags: u64 {
        /// Errors.
        const ERRORS = 1;
        /// Server messages.
        const MESSAGES = 2;
        /// Row counts.
        const ROWS = 4;
        /// SQL statements.
        const SQL = 8;
        /// Statement parameters.
        const PARAMS = 16;
        /// Transaction boundaries.
        const TRANSACTION = 32;
        /// Protocol-level debugging.
        const DEBUG = 64;
        /// Retry decisions.
        const RETRIES = 128;
        /// Prefix lines with session ids.
        const SESSION_IDS = 0x8000;
    }
}

/// One admitted log line.
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    /// Category the line was logged under.
    pub category: LogFlags,
    /// Connection id of the session.
    pub connection_id: Uuid,
    /// Activity id of the session.
    pub activity_id: Uuid,
    /// Message text.
    pub message: &'a str,
}

impl fmt::Display for LogRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "aid:{} cid:{} - {}",
            self.activity_id, self.connection_id, self.message
        )
    }
}

/// Sink for session log lines.
///
/// Implementations receive only records that passed the session's mask.
pub trait ContextLogger: Send + Sync {
    /// Emit one record.
    fn log(&self, record: &LogRecord<'_>);
}

/// [`ContextLogger`] that forwards records to `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl ContextLogger for TracingLogger {
    fn log(&self, record: &LogRecord<'_>) {
        let connection_id = record.connection_id;
        let activity_id = record.activity_id;
        if record.category.contains(LogFlags::ERRORS) {
            tracing::error!(%connection_id, %activity_id, "{record}");
        } else if record.category.contains(LogFlags::RETRIES) {
            tracing::warn!(%connection_id, %activity_id, "{record}");
        } else if record.category.contains(LogFlags::DEBUG) {
            tracing::debug!(%connection_id, %activity_id, "{record}");
        } else {
            tracing::info!(%connection_id, %activity_id, "{record}");
        }
    }
}
