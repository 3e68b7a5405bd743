//! # tds-protocol
//!
//! IO-agnostic implementation of the MS-TDS wire structures exchanged while a
//! SQL Server connection is being established.
//!
//! This crate provides `no_std` compatible packet framing, the pre-login
//! option block codec, GUID byte-order handling, and the FEDAUTH feature
//! extension encoding.
//!
//! ## Features
//!
//! - `std` (default): Enable standard library support
//! - `alloc`: Enable allocation without full std (requires `alloc` crate)
//!
//! ## Design Philosophy
//!
//! This crate contains no networking logic and makes no assumptions about the
//! async runtime. Higher-level crates drive the exchange over a transport.
//!
//! ## Example
//!
//! ```rust
//! use tds_protocol::prelogin::{EncryptionLevel, PreLogin};
//!
//! let request = PreLogin::new()
//!     .with_encryption(EncryptionLevel::On)
//!     .with_fed_auth_required(true);
//! let bytes = request.encode().unwrap();
//! assert_eq!(PreLogin::decode(bytes).unwrap(), request);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod error;
pub mod fedauth;
pub mod guid;
pub mod packet;
pub mod prelogin;
mod prelude;

pub use error::ProtocolError;
pub use fedauth::{AdalWorkflow, FedAuthFeature, FedAuthLibrary};
pub use packet::{
    DEFAULT_PACKET_SIZE, MAX_PACKET_SIZE, MIN_PACKET_SIZE, PACKET_HEADER_SIZE, PacketHeader,
    PacketStatus, PacketType, frame_message,
};
pub use prelogin::{
    EncryptionLevel, OptionBlock, PreLogin, PreLoginOption, PreLoginVersion, TraceId,
};
