//! TDS pre-login packet handling.
//!
//! The pre-login packet is the first message exchanged between client and server
//! in TDS 7.x connections. It negotiates encryption, carries the trace id used
//! for end-to-end correlation, and advertises federated authentication.
//!
//! The payload is an option block: a run of 5-byte option headers
//! (`tag:u8`, `offset:u16 BE`, `length:u16 BE`) closed by a `0xFF` terminator,
//! followed by the payload region the headers point into. Offsets are
//! absolute from the start of the block.
//!
//! [`OptionBlock`] is the generic codec over raw tags. [`PreLogin`] is the
//! typed view of the options this driver understands.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::prelude::*;

/// Size of one option header (tag + offset + length).
pub const OPTION_HEADER_LEN: usize = 5;

/// Tag closing the option header list.
pub const TERMINATOR: u8 = 0xFF;

/// Length of the trace id payload (connection id + activity id).
pub const TRACE_ID_LEN: usize = 32;

/// Length of the nonce payload.
pub const NONCE_LEN: usize = 32;

/// Pre-login option types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PreLoginOption {
    /// Version information.
    Version = 0x00,
    /// Encryption negotiation.
    Encryption = 0x01,
    /// Instance name (for named instances).
    Instance = 0x02,
    /// Thread ID.
    ThreadId = 0x03,
    /// MARS (Multiple Active Result Sets) support.
    Mars = 0x04,
    /// Trace ID (connection id + activity id).
    TraceId = 0x05,
    /// Federated authentication required.
    FedAuthRequired = 0x06,
    /// Nonce for federated authentication.
    Nonce = 0x07,
    /// Terminator (end of options).
    Terminator = 0xFF,
}

impl PreLoginOption {
    /// Create from raw byte value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Version),
            0x01 => Some(Self::Encryption),
            0x02 => Some(Self::Instance),
            0x03 => Some(Self::ThreadId),
            0x04 => Some(Self::Mars),
            0x05 => Some(Self::TraceId),
            0x06 => Some(Self::FedAuthRequired),
            0x07 => Some(Self::Nonce),
            0xFF => Some(Self::Terminator),
            _ => None,
        }
    }

    /// Raw tag byte.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Human-readable option name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Version => "VERSION",
            Self::Encryption => "ENCRYPTION",
            Self::Instance => "INSTOPT",
            Self::ThreadId => "THREADID",
            Self::Mars => "MARS",
            Self::TraceId => "TRACEID",
            Self::FedAuthRequired => "FEDAUTHREQUIRED",
            Self::Nonce => "NONCEOPT",
            Self::Terminator => "TERMINATOR",
        }
    }
}

/// Encryption level for connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EncryptionLevel {
    /// Encryption available but only the login exchange is protected.
    Off = 0x00,
    /// Encryption is on.
    On = 0x01,
    /// Encryption is not supported.
    NotSupported = 0x02,
    /// Encryption is required.
    Required = 0x03,
    /// TDS 8.0 strict encryption.
    Strict = 0x04,
}

impl EncryptionLevel {
    /// Create from raw byte value.
    pub fn from_u8(value: u8) -> Result<Self, ProtocolError> {
        match value {
            0x00 => Ok(Self::Off),
            0x01 => Ok(Self::On),
            0x02 => Ok(Self::NotSupported),
            0x03 => Ok(Self::Required),
            0x04 => Ok(Self::Strict),
            _ => Err(ProtocolError::InvalidEncryptionLevel(value)),
        }
    }

    /// Check if encryption is required.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self, Self::On | Self::Required | Self::Strict)
    }

    /// Check if the peer can encrypt at all.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::NotSupported)
    }
}

/// Generic pre-login option block.
///
/// Options keep the order they were inserted (or decoded) in, and each tag
/// appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionBlock {
    options: Vec<(u8, Bytes)>,
}

impl OptionBlock {
    /// Create an empty option block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an option.
    ///
    /// Fails if the tag is the terminator or is already present.
    pub fn insert(&mut self, tag: u8, payload: impl Into<Bytes>) -> Result<(), ProtocolError> {
        if tag == TERMINATOR {
            return Err(ProtocolError::ReservedOptionTag);
        }
        if self.contains(tag) {
            return Err(ProtocolError::DuplicateOption(tag));
        }
        self.options.push((tag, payload.into()));
        Ok(())
    }

    /// Payload for a tag.
    #[must_use]
    pub fn get(&self, tag: u8) -> Option<&Bytes> {
        self.options
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, payload)| payload)
    }

    /// Payload for a known option.
    #[must_use]
    pub fn option(&self, option: PreLoginOption) -> Option<&Bytes> {
        self.get(option.tag())
    }

    /// Check whether a tag is present.
    #[must_use]
    pub fn contains(&self, tag: u8) -> bool {
        self.options.iter().any(|(t, _)| *t == tag)
    }

    /// Number of options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Check whether the block has no options.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Iterate over `(tag, payload)` pairs in block order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Bytes)> {
        self.options.iter().map(|(tag, payload)| (*tag, payload))
    }

    /// Encode to wire format.
    ///
    /// Headers are laid out in block order, then payloads are concatenated in
    /// the same order.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let header_len = self.options.len() * OPTION_HEADER_LEN + 1;
        let payload_len: usize = self.options.iter().map(|(_, p)| p.len()).sum();
        let total = header_len + payload_len;
        if total > usize::from(u16::MAX) {
            return Err(ProtocolError::OptionBlockTooLarge(total));
        }

        let mut buf = BytesMut::with_capacity(total);
        let mut offset = header_len;
        for (tag, payload) in &self.options {
            buf.put_u8(*tag);
            buf.put_u16(offset as u16);
            buf.put_u16(payload.len() as u16);
            offset += payload.len();
        }
        buf.put_u8(TERMINATOR);
        for (_, payload) in &self.options {
            buf.put_slice(payload);
        }

        Ok(buf.freeze())
    }

    /// Decode an option block.
    ///
    /// Rejects blocks that are empty, lack a terminator, repeat a tag, or whose
    /// headers address bytes outside the payload region or overlap each other.
    pub fn decode(mut src: impl Buf) -> Result<Self, ProtocolError> {
        let data = src.copy_to_bytes(src.remaining());
        if data.is_empty() {
            return Err(ProtocolError::EmptyOptionBlock);
        }

        let mut headers: Vec<(u8, u16, u16)> = Vec::new();
        let mut cursor = &data[..];
        loop {
            if !cursor.has_remaining() {
                return Err(ProtocolError::MissingTerminator);
            }
            let tag = cursor.get_u8();
            if tag == TERMINATOR {
                break;
            }
            if cursor.remaining() < OPTION_HEADER_LEN - 1 {
                return Err(ProtocolError::MissingTerminator);
            }
            let offset = cursor.get_u16();
            let length = cursor.get_u16();
            if headers.iter().any(|(t, _, _)| *t == tag) {
                return Err(ProtocolError::DuplicateOption(tag));
            }
            headers.push((tag, offset, length));
        }

        let header_len = headers.len() * OPTION_HEADER_LEN + 1;
        let mut ranges: Vec<(usize, usize, u8)> = Vec::with_capacity(headers.len());
        for &(tag, offset, length) in &headers {
            let start = usize::from(offset);
            let end = start + usize::from(length);
            if length > 0 && start < header_len {
                return Err(ProtocolError::OptionInsideHeaders { tag, offset });
            }
            if end > data.len() {
                return Err(ProtocolError::OptionOutOfBounds {
                    tag,
                    offset,
                    length,
                    available: data.len(),
                });
            }
            if length > 0 {
                ranges.push((start, end, tag));
            }
        }

        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            let (_, prev_end, first) = pair[0];
            let (next_start, _, second) = pair[1];
            if prev_end > next_start {
                return Err(ProtocolError::OverlappingOptions { first, second });
            }
        }

        let options = headers
            .into_iter()
            .map(|(tag, offset, length)| {
                let start = usize::from(offset);
                let payload = if length == 0 {
                    Bytes::new()
                } else {
                    data.slice(start..start + usize::from(length))
                };
                (tag, payload)
            })
            .collect();

        Ok(Self { options })
    }
}

/// Version carried in the VERSION option.
///
/// Format: `major`, `minor`, `build` (u16 big-endian), `sub_build` (u16 little-endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreLoginVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Build number.
    pub build: u16,
    /// Sub-build number.
    pub sub_build: u16,
}

impl PreLoginVersion {
    /// Encode to the 6-byte wire form.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 6] {
        let build = self.build.to_be_bytes();
        let sub_build = self.sub_build.to_le_bytes();
        [
            self.major,
            self.minor,
            build[0],
            build[1],
            sub_build[0],
            sub_build[1],
        ]
    }

    fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < 4 {
            return Err(ProtocolError::InvalidOptionLength {
                option: PreLoginOption::Version.name(),
                expected: "at least 4",
                actual: bytes.len(),
            });
        }
        let sub_build = if bytes.len() >= 6 {
            u16::from_le_bytes([bytes[4], bytes[5]])
        } else {
            0
        };
        Ok(Self {
            major: bytes[0],
            minor: bytes[1],
            build: u16::from_be_bytes([bytes[2], bytes[3]]),
            sub_build,
        })
    }
}

impl core::fmt::Display for PreLoginVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.sub_build
        )
    }
}

/// Distributed tracing ID.
///
/// Both halves are stored in wire (mixed-endian) order; see [`crate::guid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId {
    /// Connection ID.
    pub connection_id: [u8; 16],
    /// Activity ID.
    pub activity_id: [u8; 16],
}

impl TraceId {
    /// Encode to the 32-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; TRACE_ID_LEN] {
        let mut out = [0u8; TRACE_ID_LEN];
        out[..16].copy_from_slice(&self.connection_id);
        out[16..].copy_from_slice(&self.activity_id);
        out
    }

    fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < TRACE_ID_LEN {
            return Err(ProtocolError::InvalidOptionLength {
                option: PreLoginOption::TraceId.name(),
                expected: "at least 32",
                actual: bytes.len(),
            });
        }
        let mut connection_id = [0u8; 16];
        let mut activity_id = [0u8; 16];
        connection_id.copy_from_slice(&bytes[..16]);
        activity_id.copy_from_slice(&bytes[16..32]);
        Ok(Self {
            connection_id,
            activity_id,
        })
    }
}

/// Typed pre-login message.
///
/// This struct is used for both client requests and server responses. Fields
/// left as `None` are not emitted when encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreLogin {
    /// Version (client driver version or server product version).
    pub version: Option<PreLoginVersion>,
    /// Encryption level.
    pub encryption: Option<EncryptionLevel>,
    /// Instance name (for named instances).
    pub instance: Option<String>,
    /// Thread ID.
    pub thread_id: Option<u32>,
    /// MARS enabled.
    pub mars: Option<bool>,
    /// Trace ID.
    pub trace_id: Option<TraceId>,
    /// Federated authentication required.
    pub fed_auth_required: bool,
    /// Nonce for federated authentication.
    pub nonce: Option<[u8; NONCE_LEN]>,
}

impl PreLogin {
    /// Create an empty pre-login message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(mut self, version: PreLoginVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Set the encryption level.
    #[must_use]
    pub fn with_encryption(mut self, level: EncryptionLevel) -> Self {
        self.encryption = Some(level);
        self
    }

    /// Set MARS.
    #[must_use]
    pub fn with_mars(mut self, enabled: bool) -> Self {
        self.mars = Some(enabled);
        self
    }

    /// Set the instance name.
    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Set the thread id.
    #[must_use]
    pub fn with_thread_id(mut self, thread_id: u32) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    /// Set the trace id.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Request federated authentication.
    #[must_use]
    pub fn with_fed_auth_required(mut self, required: bool) -> Self {
        self.fed_auth_required = required;
        self
    }

    /// Build the option block, in ascending tag order.
    pub fn to_options(&self) -> Result<OptionBlock, ProtocolError> {
        let mut block = OptionBlock::new();
        if let Some(version) = self.version {
            block.insert(PreLoginOption::Version.tag(), version.to_bytes().to_vec())?;
        }
        if let Some(encryption) = self.encryption {
            block.insert(PreLoginOption::Encryption.tag(), vec![encryption as u8])?;
        }
        if let Some(ref instance) = self.instance {
            let mut bytes = Vec::with_capacity(instance.len() + 1);
            bytes.extend_from_slice(instance.as_bytes());
            bytes.push(0);
            block.insert(PreLoginOption::Instance.tag(), bytes)?;
        }
        if let Some(thread_id) = self.thread_id {
            block.insert(PreLoginOption::ThreadId.tag(), thread_id.to_be_bytes().to_vec())?;
        }
        if let Some(mars) = self.mars {
            block.insert(PreLoginOption::Mars.tag(), vec![u8::from(mars)])?;
        }
        if let Some(ref trace_id) = self.trace_id {
            block.insert(PreLoginOption::TraceId.tag(), trace_id.to_bytes().to_vec())?;
        }
        if self.fed_auth_required {
            block.insert(PreLoginOption::FedAuthRequired.tag(), vec![0x01])?;
        }
        if let Some(ref nonce) = self.nonce {
            block.insert(PreLoginOption::Nonce.tag(), nonce.to_vec())?;
        }
        Ok(block)
    }

    /// Interpret an option block.
    ///
    /// Unknown tags are ignored; known tags with an unusable payload fail.
    pub fn from_options(block: &OptionBlock) -> Result<Self, ProtocolError> {
        let mut prelogin = Self::new();

        for (tag, payload) in block.iter() {
            let Some(option) = PreLoginOption::from_u8(tag) else {
                continue;
            };
            match option {
                PreLoginOption::Version => {
                    prelogin.version = Some(PreLoginVersion::from_slice(payload)?);
                }
                PreLoginOption::Encryption => {
                    let byte = first_byte(option, payload)?;
                    prelogin.encryption = Some(EncryptionLevel::from_u8(byte)?);
                }
                PreLoginOption::Instance => {
                    let end = payload
                        .iter()
                        .position(|&b| b == 0)
                        .unwrap_or(payload.len());
                    if end > 0 {
                        prelogin.instance =
                            Some(String::from_utf8_lossy(&payload[..end]).to_string());
                    }
                }
                PreLoginOption::ThreadId => match payload.len() {
                    0 => {}
                    len if len >= 4 => {
                        prelogin.thread_id = Some(u32::from_be_bytes([
                            payload[0], payload[1], payload[2], payload[3],
                        ]));
                    }
                    len => {
                        return Err(ProtocolError::InvalidOptionLength {
                            option: option.name(),
                            expected: "0 or at least 4",
                            actual: len,
                        });
                    }
                },
                PreLoginOption::Mars => {
                    prelogin.mars = Some(first_byte(option, payload)? != 0);
                }
                PreLoginOption::TraceId => {
                    prelogin.trace_id = Some(TraceId::from_slice(payload)?);
                }
                PreLoginOption::FedAuthRequired => {
                    prelogin.fed_auth_required = payload.first().is_some_and(|&b| b != 0);
                }
                PreLoginOption::Nonce => {
                    if payload.len() != NONCE_LEN {
                        return Err(ProtocolError::InvalidOptionLength {
                            option: option.name(),
                            expected: "32",
                            actual: payload.len(),
                        });
                    }
                    let mut nonce = [0u8; NONCE_LEN];
                    nonce.copy_from_slice(payload);
                    prelogin.nonce = Some(nonce);
                }
                PreLoginOption::Terminator => {}
            }
        }

        Ok(prelogin)
    }

    /// Encode the pre-login message to bytes.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        self.to_options()?.encode()
    }

    /// Decode a pre-login message.
    pub fn decode(src: impl Buf) -> Result<Self, ProtocolError> {
        Self::from_options(&OptionBlock::decode(src)?)
    }
}

fn first_byte(option: PreLoginOption, payload: &[u8]) -> Result<u8, ProtocolError> {
    payload
        .first()
        .copied()
        .ok_or(ProtocolError::InvalidOptionLength {
            option: option.name(),
            expected: "at least 1",
            actual: 0,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn block(options: &[(u8, &[u8])]) -> OptionBlock {
        let mut block = OptionBlock::new();
        for (tag, payload) in options {
            block.insert(*tag, payload.to_vec()).unwrap();
        }
        block
    }

    #[test]
    fn test_encode_layout_is_byte_exact() {
        let encoded = block(&[(0x01, &[0x02]), (0x04, &[0x00])]).encode().unwrap();

        // 2 headers * 5 + terminator = 11 bytes of headers
        assert_eq!(
            &encoded[..],
            &[
                0x01, 0x00, 0x0B, 0x00, 0x01, // ENCRYPTION @ 11, len 1
                0x04, 0x00, 0x0C, 0x00, 0x01, // MARS @ 12, len 1
                0xFF, // terminator
                0x02, 0x00,
            ]
        );
    }

    #[test]
    fn test_encode_empty_block_is_terminator_only() {
        let encoded = OptionBlock::new().encode().unwrap();
        assert_eq!(&encoded[..], &[TERMINATOR]);
        assert!(OptionBlock::decode(&encoded[..]).unwrap().is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicates_and_terminator() {
        let mut block = OptionBlock::new();
        block.insert(0x01, vec![0]).unwrap();
        assert_eq!(
            block.insert(0x01, vec![1]),
            Err(ProtocolError::DuplicateOption(0x01))
        );
        assert_eq!(
            block.insert(TERMINATOR, vec![]),
            Err(ProtocolError::ReservedOptionTag)
        );
    }

    #[test]
    fn test_decode_preserves_order_and_payloads() {
        let original = block(&[
            (0x05, &[7u8; 32]),
            (0x00, &[1, 2, 3, 4, 5, 6]),
            (0x42, &[9, 9]),
            (0x06, &[]),
        ]);
        let decoded = OptionBlock::decode(original.encode().unwrap()).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.get(0x42).unwrap().as_ref(), &[9, 9]);
    }

    #[test]
    fn test_decode_out_of_order_offsets() {
        // ENCRYPTION header first, pointing after VERSION data
        let raw = [
            0x00, 0x00, 0x0B, 0x00, 0x06, // VERSION @ 11, len 6
            0x01, 0x00, 0x11, 0x00, 0x01, // ENCRYPTION @ 17, len 1
            0xFF, //
            0x0F, 0x00, 0x07, 0xD0, 0x00, 0x00, // version
            0x03, // encryption required
        ];
        let prelogin = PreLogin::decode(&raw[..]).unwrap();
        assert_eq!(prelogin.encryption, Some(EncryptionLevel::Required));
        assert_eq!(
            prelogin.version,
            Some(PreLoginVersion {
                major: 15,
                minor: 0,
                build: 2000,
                sub_build: 0
            })
        );
    }

    #[test]
    fn test_decode_empty_buffer() {
        assert_eq!(
            OptionBlock::decode(&[0u8; 0][..]),
            Err(ProtocolError::EmptyOptionBlock)
        );
    }

    #[test]
    fn test_decode_truncated_before_terminator() {
        let encoded = block(&[(0x01, &[0x00]), (0x04, &[0x00])]).encode().unwrap();
        // Cut inside the second header and right before the terminator
        for cut in [3, 5, 8, 10] {
            assert_eq!(
                OptionBlock::decode(&encoded[..cut]),
                Err(ProtocolError::MissingTerminator),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn test_decode_rejects_duplicate_tags() {
        let raw = [
            0x01, 0x00, 0x0B, 0x00, 0x01, //
            0x01, 0x00, 0x0C, 0x00, 0x01, //
            0xFF, 0x00, 0x01,
        ];
        assert_eq!(
            OptionBlock::decode(&raw[..]),
            Err(ProtocolError::DuplicateOption(0x01))
        );
    }

    #[test]
    fn test_decode_rejects_range_past_end() {
        let raw = [0x01, 0x00, 0x06, 0x00, 0x04, 0xFF, 0x00];
        assert!(matches!(
            OptionBlock::decode(&raw[..]),
            Err(ProtocolError::OptionOutOfBounds { tag: 0x01, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_offset_into_headers() {
        let raw = [0x01, 0x00, 0x00, 0x00, 0x01, 0xFF, 0x00];
        assert!(matches!(
            OptionBlock::decode(&raw[..]),
            Err(ProtocolError::OptionInsideHeaders { tag: 0x01, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_overlapping_payloads() {
        let raw = [
            0x00, 0x00, 0x0B, 0x00, 0x04, // VERSION @ 11..15
            0x01, 0x00, 0x0D, 0x00, 0x01, // ENCRYPTION @ 13, inside VERSION
            0xFF, 0x0F, 0x00, 0x00, 0x00,
        ];
        assert_eq!(
            OptionBlock::decode(&raw[..]),
            Err(ProtocolError::OverlappingOptions {
                first: 0x00,
                second: 0x01
            })
        );
    }

    #[test]
    fn test_encode_rejects_oversized_block() {
        let mut block = OptionBlock::new();
        block.insert(0x02, vec![b'x'; 70_000]).unwrap();
        assert!(matches!(
            block.encode(),
            Err(ProtocolError::OptionBlockTooLarge(_))
        ));
    }

    #[test]
    fn test_typed_prelogin_roundtrip() {
        let trace_id = TraceId {
            connection_id: [0xAA; 16],
            activity_id: [0xBB; 16],
        };
        let original = PreLogin::new()
            .with_version(PreLoginVersion {
                major: 0,
                minor: 6,
                build: 0,
                sub_build: 0,
            })
            .with_encryption(EncryptionLevel::Strict)
            .with_instance("SQLEXPRESS")
            .with_thread_id(0)
            .with_mars(false)
            .with_trace_id(trace_id)
            .with_fed_auth_required(true);

        let decoded = PreLogin::decode(original.encode().unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_instance_is_nul_terminated() {
        let options = PreLogin::new().with_instance("i").to_options().unwrap();
        assert_eq!(
            options.option(PreLoginOption::Instance).unwrap().as_ref(),
            b"i\0"
        );
    }

    #[test]
    fn test_zero_length_thread_id_is_ignored() {
        let options = block(&[(PreLoginOption::ThreadId.tag(), &[])]);
        let prelogin = PreLogin::from_options(&options).unwrap();
        assert_eq!(prelogin.thread_id, None);
    }

    #[test]
    fn test_empty_encryption_payload_fails() {
        let options = block(&[(PreLoginOption::Encryption.tag(), &[])]);
        assert!(matches!(
            PreLogin::from_options(&options),
            Err(ProtocolError::InvalidOptionLength { .. })
        ));
    }

    #[test]
    fn test_unknown_encryption_byte_fails() {
        let options = block(&[(PreLoginOption::Encryption.tag(), &[0x09])]);
        assert_eq!(
            PreLogin::from_options(&options),
            Err(ProtocolError::InvalidEncryptionLevel(0x09))
        );
    }

    #[test]
    fn test_encryption_level() {
        assert!(EncryptionLevel::Required.is_required());
        assert!(EncryptionLevel::On.is_required());
        assert!(EncryptionLevel::Strict.is_required());
        assert!(!EncryptionLevel::Off.is_required());
        assert!(!EncryptionLevel::NotSupported.is_supported());
    }

    mod proptests {
        use super::*;
        use proptest::collection::{btree_map, vec as byte_vec};
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn option_block_roundtrip(
                options in btree_map(0u8..0xFF, byte_vec(any::<u8>(), 0..64), 0..12)
            ) {
                let mut block = OptionBlock::new();
                for (tag, payload) in &options {
                    block.insert(*tag, payload.clone()).unwrap();
                }
                let decoded = OptionBlock::decode(block.encode().unwrap()).unwrap();
                prop_assert_eq!(decoded, block);
            }
        }
    }
}
