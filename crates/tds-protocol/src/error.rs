//! Protocol error types.

use thiserror::Error;

use crate::prelude::*;

/// Errors raised while encoding or decoding TDS wire structures.
///
/// Every decoding failure here means the peer sent bytes that cannot be
/// interpreted; callers surface them as malformed protocol data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// Buffer ended before a complete structure could be read.
    #[error("unexpected end of data")]
    UnexpectedEof,

    /// Packet was shorter than its header claims.
    #[error("incomplete packet: expected {expected} bytes, got {actual}")]
    IncompletePacket {
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// Unknown packet type byte.
    #[error("invalid packet type: 0x{0:02X}")]
    InvalidPacketType(u8),

    /// Packet header declares a length smaller than the header itself.
    #[error("invalid packet length: {0}")]
    InvalidPacketLength(u16),

    /// Pre-login block has no option headers and no terminator.
    #[error("pre-login block is empty")]
    EmptyOptionBlock,

    /// Option headers were not closed by the 0xFF terminator.
    #[error("pre-login option headers are not terminated")]
    MissingTerminator,

    /// The same option tag appears more than once.
    #[error("duplicate pre-login option 0x{0:02X}")]
    DuplicateOption(u8),

    /// Option payload range points outside the block.
    #[error(
        "pre-login option 0x{tag:02X} range {offset}+{length} exceeds block of {available} bytes"
    )]
    OptionOutOfBounds {
        /// Option tag.
        tag: u8,
        /// Declared offset.
        offset: u16,
        /// Declared length.
        length: u16,
        /// Total block size.
        available: usize,
    },

    /// Option payload range points into the header region.
    #[error("pre-login option 0x{tag:02X} offset {offset} points into the option headers")]
    OptionInsideHeaders {
        /// Option tag.
        tag: u8,
        /// Declared offset.
        offset: u16,
    },

    /// Two option payload ranges overlap.
    #[error("pre-login options 0x{first:02X} and 0x{second:02X} have overlapping payloads")]
    OverlappingOptions {
        /// First option tag.
        first: u8,
        /// Second option tag.
        second: u8,
    },

    /// Encoded block would not fit the 16-bit offset space.
    #[error("pre-login block of {0} bytes exceeds the 65535-byte limit")]
    OptionBlockTooLarge(usize),

    /// The terminator tag was used as a regular option.
    #[error("option tag 0xFF is reserved for the terminator")]
    ReservedOptionTag,

    /// A required option is absent.
    #[error("required pre-login option {0} is missing")]
    MissingOption(&'static str),

    /// An option payload has the wrong size.
    #[error("pre-login option {option} has length {actual}, expected {expected}")]
    InvalidOptionLength {
        /// Option name.
        option: &'static str,
        /// Expected size description.
        expected: &'static str,
        /// Actual length.
        actual: usize,
    },

    /// Unknown encryption byte.
    #[error("invalid encryption level: 0x{0:02X}")]
    InvalidEncryptionLevel(u8),

    /// Unexpected packet type for the current exchange.
    #[error("unexpected packet type {actual:?}, expected {expected:?}")]
    UnexpectedPacketType {
        /// Expected packet type byte.
        expected: u8,
        /// Received packet type byte.
        actual: u8,
    },

    /// Reassembled message exceeded the permitted size.
    #[error("message of {0} bytes exceeds the permitted size")]
    MessageTooLarge(usize),

    /// Free-form decoding failure.
    #[error("{0}")]
    Other(String),
}
