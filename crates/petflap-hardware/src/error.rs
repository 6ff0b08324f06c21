//! Error types for host-side hardware access.
//!
//! The firmware capabilities themselves (latches, ADC reads, EEPROM bytes)
//! cannot fail from the controller's point of view. Errors only arise where
//! the host touches the outside world: the EEPROM image file and the serial
//! port used by the bench emulator.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The EEPROM image does not have the expected layout.
    #[error("Invalid EEPROM image: {message}")]
    InvalidImage { message: String },

    /// Serial port could not be opened or failed mid-stream.
    #[error("Serial port error: {message}")]
    SerialPort { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new invalid image error.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }

    /// Create a new serial port error.
    pub fn serial_port(message: impl Into<String>) -> Self {
        Self::SerialPort {
            message: message.into(),
        }
    }
}
