//! File-backed EEPROM image.
//!
//! The bench emulator keeps the non-volatile medium in a plain binary file
//! of [`NV_SIZE`] bytes so enrolled tags and settings survive restarts. The
//! whole image is held in memory; [`FileEeprom::flush`] writes it back when
//! something changed.

use crate::{
    error::{HardwareError, Result},
    traits::NvMemory,
};
use petflap_core::constants::{CONFIG_SIZE, NV_SIZE};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Contents of a factory-fresh medium.
///
/// The configuration region reads as erased (`0xFF`), which makes boot
/// repair every entry to its default. The tag table is zeroed, which reads
/// as sixteen empty slots.
#[must_use]
pub fn blank_image() -> Vec<u8> {
    let mut image = vec![0u8; NV_SIZE];
    image[..CONFIG_SIZE].fill(0xFF);
    image
}

/// EEPROM image persisted to a file on the host.
#[derive(Debug)]
pub struct FileEeprom {
    path: PathBuf,
    image: Vec<u8>,
    dirty: bool,
    writes: u64,
}

impl FileEeprom {
    /// Open an existing image, or start from [`blank_image`] when the file
    /// does not exist yet.
    ///
    /// # Errors
    /// Returns `HardwareError::InvalidImage` when the file exists but is not
    /// exactly [`NV_SIZE`] bytes, or `HardwareError::Io` when it cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let (image, dirty) = match fs::read(&path) {
            Ok(bytes) => {
                if bytes.len() != NV_SIZE {
                    return Err(HardwareError::invalid_image(format!(
                        "{}: expected {NV_SIZE} bytes, got {}",
                        path.display(),
                        bytes.len()
                    )));
                }
                info!(path = %path.display(), "Loaded EEPROM image");
                (bytes, false)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No EEPROM image, starting blank");
                (blank_image(), true)
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            image,
            dirty,
            writes: 0,
        })
    }

    /// Write the image back to disk if any byte changed since the last flush.
    ///
    /// # Errors
    /// Returns `HardwareError::Io` when the file cannot be written.
    pub fn flush(&mut self) -> Result<()> {
        if self.dirty {
            fs::write(&self.path, &self.image)?;
            self.dirty = false;
            debug!(path = %self.path.display(), writes = self.writes, "Flushed EEPROM image");
        }
        Ok(())
    }

    /// Byte writes performed since the image was opened.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NvMemory for FileEeprom {
    fn capacity(&self) -> usize {
        self.image.len()
    }

    fn read(&self, addr: usize) -> u8 {
        self.image.get(addr).copied().unwrap_or(0xFF)
    }

    fn write(&mut self, addr: usize, value: u8) {
        if let Some(byte) = self.image.get_mut(addr) {
            *byte = value;
            self.dirty = true;
            self.writes += 1;
        }
    }
}
