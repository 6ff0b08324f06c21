//! Scripted serial link.

use crate::traits::SerialLink;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

#[derive(Debug, Default)]
struct SerialState {
    rx: VecDeque<u8>,
    lines: Vec<String>,
}

fn lock(state: &Mutex<SerialState>) -> MutexGuard<'_, SerialState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Serial link fed from a byte queue, capturing every line sent.
///
/// # Examples
///
/// ```
/// use petflap_hardware::mock::SimSerial;
/// use petflap_hardware::traits::SerialLink;
///
/// let (mut link, handle) = SimSerial::new();
/// handle.push_bytes(b"S");
/// assert_eq!(link.read_byte(), Some(b'S'));
/// link.write_line("STATUS: ok");
/// assert_eq!(handle.take_lines(), vec!["STATUS: ok".to_string()]);
/// ```
#[derive(Debug)]
pub struct SimSerial {
    state: Arc<Mutex<SerialState>>,
}

impl SimSerial {
    pub fn new() -> (Self, SimSerialHandle) {
        let state = Arc::new(Mutex::new(SerialState::default()));
        let handle = SimSerialHandle {
            state: Arc::clone(&state),
        };
        (Self { state }, handle)
    }
}

impl SerialLink for SimSerial {
    fn read_byte(&mut self) -> Option<u8> {
        lock(&self.state).rx.pop_front()
    }

    fn byte_available(&self) -> bool {
        !lock(&self.state).rx.is_empty()
    }

    fn write_line(&mut self, line: &str) {
        lock(&self.state).lines.push(line.to_string());
    }
}

#[derive(Debug, Clone)]
pub struct SimSerialHandle {
    state: Arc<Mutex<SerialState>>,
}

impl SimSerialHandle {
    /// Queue bytes as if they had just been received.
    pub fn push_bytes(&self, bytes: &[u8]) {
        lock(&self.state).rx.extend(bytes.iter().copied());
    }

    /// Bytes received but not read yet.
    pub fn pending(&self) -> usize {
        lock(&self.state).rx.len()
    }

    /// Drain every line sent so far.
    pub fn take_lines(&self) -> Vec<String> {
        std::mem::take(&mut lock(&self.state).lines)
    }

    /// Copy of every line sent so far.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.state).lines.clone()
    }
}
