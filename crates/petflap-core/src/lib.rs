//! Core types shared by every crate of the pet door firmware.
//!
//! This crate holds the pieces that the decoder, the tag store and the
//! controller all agree on: the CRC used both to validate tag reads and as
//! the allow-list key, the tag record layout, the operating modes, and the
//! constants describing the non-volatile layout and timing.

pub mod constants;
pub mod crc;
pub mod error;
pub mod types;

pub use crc::crc16;
pub use error::{DecodeError, Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
