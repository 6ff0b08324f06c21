use thiserror::Error;

/// Reasons a single RFID decode attempt can fail.
///
/// The controller discards every variant silently and simply tries again on
/// the next scheduler pass. The numeric codes match the values reported by
/// earlier firmware builds on the diagnostic link.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeError {
    /// No transponder loaded the field. The decode path folds a carrier
    /// timeout into [`DecodeError::NoHeader`], so this is currently never
    /// produced by the decoder itself.
    #[error("No carrier detected")]
    NoCarrier,

    /// The synchronization budget ran out before a header was seen.
    #[error("No header found within the sync window")]
    NoHeader,

    /// Reserved: start bits are read and discarded without validation.
    #[error("Bad start bit")]
    BadStart,

    /// The embedded CRC does not match the CRC computed over the data block.
    #[error("CRC mismatch: embedded {embedded:#06X}, computed {computed:#06X}")]
    BadCrc { embedded: u16, computed: u16 },
}

impl DecodeError {
    /// Numeric failure code (1..=4).
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            DecodeError::NoCarrier => 1,
            DecodeError::NoHeader => 2,
            DecodeError::BadStart => 3,
            DecodeError::BadCrc { .. } => 4,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid operating mode code: {0}")]
    InvalidMode(u8),

    #[error("Invalid slot number {slot} (valid range: 1-{max})")]
    InvalidSlot { slot: u8, max: u8 },

    #[error("Invalid tag key 0x0000")]
    ZeroKey,
}

pub type Result<T> = std::result::Result<T, Error>;
