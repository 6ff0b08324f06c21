//! Simulated RFID front end with a scripted transponder.
//!
//! The signal is a pure function of simulated time. When the carrier is
//! switched on the timer restarts and the transponder powers up. After a
//! quiet lead-in at a low level it sends one frame in differential biphase:
//! every cell starts with a level change, a `0` cell also changes level at
//! mid-cell, a `1` cell holds its level for the whole cell. After the frame
//! the stream returns to the quiet low level.
//!
//! The frame is ten `0` header cells followed, for each of the ten frame
//! bytes, by a `1` start cell and the eight data bits LSB-first.

use super::clock::SimClock;
use crate::traits::SampleSource;
use petflap_core::{
    constants::{
        CELL_SAMPLE_FIRST, DATA_BYTES, FRAME_BYTES, HEADER_BIT, HEADER_BITS, TICKS_PER_CELL,
    },
    crc16,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// Duration of one timer tick (16 ticks per cell, about 4 kbit/s).
pub const TICK_US: u64 = 15;

/// Cost of one ADC conversion.
pub const ADC_READ_US: u64 = 1;

/// Quiet ticks between carrier power-up and the first header cell.
pub const LEAD_IN_TICKS: u64 = 200;

/// ADC readings produced by the simulated analog chain.
pub const LEVEL_HIGH: u16 = 800;
pub const LEVEL_LOW: u16 = 200;
pub const FIELD_LOADED: u16 = 150;
pub const FIELD_FREE: u16 = 600;

/// Encode ten frame bytes (header included) as a sequence of bit cells.
///
/// # Examples
///
/// ```
/// use petflap_hardware::mock::encode_frame;
///
/// let cells = encode_frame(&[0u8; 10]);
/// assert_eq!(cells.len(), 10 + 10 * 9);
/// assert!(cells[..10].iter().all(|&bit| !bit));
/// assert!(cells[10]);
/// ```
pub fn encode_frame(bytes: &[u8; FRAME_BYTES]) -> Vec<bool> {
    let mut cells = vec![HEADER_BIT; HEADER_BITS];
    for byte in bytes {
        cells.push(true);
        cells.extend((0..8).map(|bit| (byte >> bit) & 1 == 1));
    }
    cells
}

/// One bit cell as transmitted: level in the first and second half.
#[derive(Debug, Clone, Copy)]
struct Cell {
    first: bool,
    second: bool,
}

fn modulate(cells: &[bool]) -> Vec<Cell> {
    let mut level = false;
    cells
        .iter()
        .map(|&bit| {
            let first = !level;
            let second = if bit { first } else { !first };
            level = second;
            Cell { first, second }
        })
        .collect()
}

#[derive(Debug, Default)]
struct TransponderState {
    cells: Option<Vec<Cell>>,
    excited: bool,
    excited_at_us: u64,
    consumed_tick: u64,
    excitation_cycles: u32,
}

impl TransponderState {
    fn tick_at(&self, now_us: u64) -> u64 {
        now_us.saturating_sub(self.excited_at_us) / TICK_US
    }

    fn level_at(&self, now_us: u64) -> bool {
        let Some(cells) = self.cells.as_ref().filter(|_| self.excited) else {
            return false;
        };
        let Some(tick) = self.tick_at(now_us).checked_sub(LEAD_IN_TICKS) else {
            return false;
        };
        let ticks_per_cell = u64::from(TICKS_PER_CELL);
        let Some(cell) = usize::try_from(tick / ticks_per_cell)
            .ok()
            .and_then(|index| cells.get(index))
        else {
            return false;
        };
        if tick % ticks_per_cell < u64::from(CELL_SAMPLE_FIRST) {
            cell.first
        } else {
            cell.second
        }
    }
}

/// Simulated reader front end.
///
/// # Examples
///
/// ```
/// use petflap_hardware::mock::{SimClock, SimTransponder};
/// use petflap_hardware::traits::SampleSource;
///
/// let clock = SimClock::new();
/// let (mut reader, _handle) = SimTransponder::new(clock);
///
/// reader.set_excitation(true);
/// assert!(reader.field_strength() > 200);
/// reader.set_excitation(false);
/// ```
#[derive(Debug)]
pub struct SimTransponder {
    clock: SimClock,
    state: Arc<Mutex<TransponderState>>,
}

impl SimTransponder {
    pub fn new(clock: SimClock) -> (Self, SimTransponderHandle) {
        let state = Arc::new(Mutex::new(TransponderState::default()));
        let handle = SimTransponderHandle {
            state: Arc::clone(&state),
        };
        (Self { clock, state }, handle)
    }

    fn state(&self) -> MutexGuard<'_, TransponderState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<TransponderState>) -> MutexGuard<'_, TransponderState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SampleSource for SimTransponder {
    fn set_excitation(&mut self, on: bool) {
        let now = self.clock.micros();
        let mut state = self.state();
        if on && !state.excited {
            state.excitation_cycles += 1;
            state.excited_at_us = now;
            state.consumed_tick = 0;
        }
        state.excited = on;
    }

    fn field_strength(&mut self) -> u16 {
        self.clock.advance_us(ADC_READ_US);
        let state = self.state();
        match (state.excited, state.cells.is_some()) {
            (false, _) => 0,
            (true, true) => FIELD_LOADED,
            (true, false) => FIELD_FREE,
        }
    }

    fn stream_level(&mut self) -> u16 {
        self.clock.advance_us(ADC_READ_US);
        if self.state().level_at(self.clock.micros()) {
            LEVEL_HIGH
        } else {
            LEVEL_LOW
        }
    }

    fn wait_tick(&mut self) {
        let mut state = self.state();
        let current = state.tick_at(self.clock.micros());
        if current > state.consumed_tick {
            state.consumed_tick = current;
            return;
        }
        state.consumed_tick += 1;
        let boundary = state.excited_at_us + state.consumed_tick * TICK_US;
        self.clock.advance_to_us(boundary);
    }
}

/// Test-side control of a [`SimTransponder`].
#[derive(Debug, Clone)]
pub struct SimTransponderHandle {
    state: Arc<Mutex<TransponderState>>,
}

impl SimTransponderHandle {
    /// Present a tag carrying `data`, with its correct CRC appended.
    pub fn present_tag(&self, data: [u8; DATA_BYTES]) {
        let mut frame = [0u8; FRAME_BYTES];
        frame[..DATA_BYTES].copy_from_slice(&data);
        frame[DATA_BYTES..].copy_from_slice(&crc16(&data).to_le_bytes());
        self.present_frame(frame);
    }

    /// Present a tag transmitting exactly these ten bytes after the header.
    pub fn present_frame(&self, frame: [u8; FRAME_BYTES]) {
        self.present_cells(&encode_frame(&frame));
    }

    /// Present a tag transmitting arbitrary bit cells.
    pub fn present_cells(&self, cells: &[bool]) {
        lock(&self.state).cells = Some(modulate(cells));
    }

    /// Take the tag out of the field.
    pub fn remove_tag(&self) {
        lock(&self.state).cells = None;
    }

    pub fn tag_present(&self) -> bool {
        lock(&self.state).cells.is_some()
    }

    pub fn is_excited(&self) -> bool {
        lock(&self.state).excited
    }

    /// Number of times the carrier was switched on.
    pub fn excitation_cycles(&self) -> u32 {
        lock(&self.state).excitation_cycles
    }
}
