use std::fmt;
use thiserror::Error;

/// Parameter being read when a command timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Read/write selector of a configuration command.
    ConfigAction,
    ConfigIndex,
    ConfigValue,
    ModeValue,
    /// 0-based identifier byte of an add command.
    IdByte(u8),
    /// Key of an add command.
    Crc,
    SlotNumber,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stage::ConfigAction => f.write_str("R/S parameter"),
            Stage::ConfigIndex => f.write_str("index"),
            Stage::ConfigValue => f.write_str("value"),
            Stage::ModeValue => f.write_str("mode value"),
            Stage::IdByte(i) => write!(f, "ID byte {i}"),
            Stage::Crc => f.write_str("CRC"),
            Stage::SlotNumber => f.write_str("slot number"),
        }
    }
}

/// Byte as shown in diagnostics: itself when printable ASCII, `.` otherwise.
pub(crate) fn printable(byte: u8) -> char {
    if (0x20..0x7F).contains(&byte) {
        char::from(byte)
    } else {
        '.'
    }
}

/// Reasons a serial command is abandoned.
///
/// None is fatal: the reader simply waits for the next leading byte.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Timeout reading {0}")]
    Timeout(Stage),

    #[error("Unknown command '{}' (0x{:02X})", printable(*.0), .0)]
    UnknownCommand(u8),

    /// An add command carried key 0, which marks an empty slot.
    #[error("Invalid CRC (0x0000)")]
    ZeroKey,
}

impl ProtocolError {
    pub fn timeout(stage: Stage) -> Self {
        ProtocolError::Timeout(stage)
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProtocolError::Timeout(_))
    }
}
