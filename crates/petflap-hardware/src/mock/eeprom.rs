//! In-memory EEPROM that counts byte writes.

use crate::{eeprom::blank_image, traits::NvMemory};
use petflap_core::constants::NV_SIZE;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
struct EepromState {
    bytes: Vec<u8>,
    writes: Vec<usize>,
}

fn lock(state: &Mutex<EepromState>) -> MutexGuard<'_, EepromState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Simulated EEPROM.
///
/// Every byte write is logged by address so tests can check that write paths
/// skip unchanged bytes.
///
/// # Examples
///
/// ```
/// use petflap_hardware::mock::SimEeprom;
/// use petflap_hardware::traits::NvMemory;
///
/// let (mut eeprom, handle) = SimEeprom::new();
/// eeprom.write(3, 0xAA);
/// assert_eq!(eeprom.read(3), 0xAA);
/// assert_eq!(handle.write_count(), 1);
/// ```
#[derive(Debug)]
pub struct SimEeprom {
    state: Arc<Mutex<EepromState>>,
}

impl SimEeprom {
    /// Zero-filled medium.
    pub fn new() -> (Self, SimEepromHandle) {
        Self::with_image(vec![0; NV_SIZE])
    }

    /// Factory-fresh medium, as produced by [`blank_image`].
    pub fn blank() -> (Self, SimEepromHandle) {
        Self::with_image(blank_image())
    }

    /// Fully erased medium (every byte `0xFF`).
    pub fn erased() -> (Self, SimEepromHandle) {
        Self::with_image(vec![0xFF; NV_SIZE])
    }

    pub fn with_image(bytes: Vec<u8>) -> (Self, SimEepromHandle) {
        let state = Arc::new(Mutex::new(EepromState {
            bytes,
            writes: Vec::new(),
        }));
        let handle = SimEepromHandle {
            state: Arc::clone(&state),
        };
        (Self { state }, handle)
    }
}

impl NvMemory for SimEeprom {
    fn capacity(&self) -> usize {
        lock(&self.state).bytes.len()
    }

    fn read(&self, addr: usize) -> u8 {
        lock(&self.state).bytes.get(addr).copied().unwrap_or(0xFF)
    }

    fn write(&mut self, addr: usize, value: u8) {
        let mut state = lock(&self.state);
        if addr < state.bytes.len() {
            state.bytes[addr] = value;
            state.writes.push(addr);
        }
    }
}

/// Test-side view of a [`SimEeprom`].
#[derive(Debug, Clone)]
pub struct SimEepromHandle {
    state: Arc<Mutex<EepromState>>,
}

impl SimEepromHandle {
    pub fn write_count(&self) -> usize {
        lock(&self.state).writes.len()
    }

    /// Addresses written so far, in order.
    pub fn written_addresses(&self) -> Vec<usize> {
        lock(&self.state).writes.clone()
    }

    pub fn reset_write_log(&self) {
        lock(&self.state).writes.clear();
    }

    /// Copy of the whole medium.
    pub fn snapshot(&self) -> Vec<u8> {
        lock(&self.state).bytes.clone()
    }
}
