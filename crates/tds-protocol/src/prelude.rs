//! Internal prelude for no_std compatibility.
//!
//! Re-exports the allocation types used throughout the crate from either
//! `std` or `alloc` depending on feature flags.

#![allow(unused_imports)]

#[cfg(feature = "std")]
pub use std::{
    format,
    string::{String, ToString},
    vec,
    vec::Vec,
};

#[cfg(all(feature = "alloc", not(feature = "std")))]
pub use alloc::{
    format,
    string::{String, ToString},
    vec,
    vec::Vec,
};
