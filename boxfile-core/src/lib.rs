//! Framing of the box container format.
//!
//! A container is a plain concatenation of entries with no index, footer or
//! padding:
//!
//! ```text
//! Entry := path_len:u32 BE | path:UTF-8[path_len] | payload_len:u64 BE | payload[payload_len]
//! ```
#![no_std]
extern crate alloc;

pub use crate::container::ContainerSrc;
pub use crate::entry::{encode, Entry, Field};
pub use crate::error::Error;

mod container;
mod entry;
mod error;

/// Size of the path length field
pub const PATH_LEN_SIZE: usize = 4;
/// Size of the payload length field
pub const PAYLOAD_LEN_SIZE: usize = 8;
