//! Firmware-wide constants.
//!
//! Layout constants describe the non-volatile medium and are part of the
//! persisted format: changing them invalidates every enrolled tag. Timing
//! constants are defaults; the controller exposes the tunable ones through
//! its runtime configuration.
//!
//! # Non-volatile layout
//!
//! ```text
//! 0                 CONFIG_SIZE                         CONFIG_SIZE + 16 * 8
//! ├─ config entries ─┼─ slot 0 ─┼─ slot 1 ─┼ ... ┼─ slot 15 ─┤
//!    2 bytes each      key(2 LE) + identifier(6)
//! ```

// ============================================================================
// Non-volatile layout
// ============================================================================

/// Bytes reserved for configuration entries at the start of the medium.
pub const CONFIG_SIZE: usize = 128;

/// Byte offset of the first tag slot.
pub const TABLE_OFFSET: usize = CONFIG_SIZE;

/// Number of tag slots in the table.
pub const TAG_SLOTS: usize = 16;

/// Size of one tag identifier in bytes.
pub const TAG_ID_LEN: usize = 6;

/// Size of one persisted tag record: 2-byte key followed by the identifier.
pub const SLOT_SIZE: usize = 2 + TAG_ID_LEN;

/// Total bytes the layout needs on the medium.
pub const NV_SIZE: usize = TABLE_OFFSET + TAG_SLOTS * SLOT_SIZE;

/// Persisted configuration entry indices.
pub mod config_index {
    /// Light sensor threshold used by Night mode.
    pub const LIGHT_THRESHOLD: u8 = 0;

    /// Door relock delay in milliseconds.
    pub const RELOCK_DELAY: u8 = 1;

    /// Silent flag (0 or 1) suppressing the tag-match chime.
    pub const SILENT: u8 = 2;
}

// ============================================================================
// RFID front end
// ============================================================================

/// Overall header synchronization budget, also used by the edge wait.
pub const RFID_SYNC_TIMEOUT_MS: u32 = 100;

/// Settling time of the analog chain after the carrier is switched on.
pub const RFID_STABILIZATION_DELAY_MS: u32 = 2;

/// Demodulated stream ADC reading above which a sample is a logical high.
pub const RFID_LEVEL_THRESHOLD: u16 = 512;

/// Field strength ADC reading above which no transponder loads the carrier.
pub const RFID_CARRIER_THRESHOLD: u16 = 200;

/// Timer ticks per transmitted bit cell.
pub const TICKS_PER_CELL: u8 = 16;

/// First and last tick (inclusive) at which a cell is sampled.
pub const CELL_SAMPLE_FIRST: u8 = 8;
pub const CELL_SAMPLE_LAST: u8 = 10;

/// Header length in bit cells.
pub const HEADER_BITS: usize = 10;

/// Value every header cell must decode to.
pub const HEADER_BIT: bool = false;

/// Bytes read after the header: 8 data bytes and a 2-byte CRC.
pub const FRAME_BYTES: usize = 10;

/// Length of the data block covered by the CRC.
pub const DATA_BYTES: usize = 8;

// ============================================================================
// Timing defaults
// ============================================================================

/// Default time the entry latch stays open after a match.
pub const DEFAULT_RELOCK_DELAY_MS: u32 = 4_000;

/// Bounds for the relock delay.
pub const MIN_RELOCK_DELAY_MS: u32 = 1_000;
pub const MAX_RELOCK_DELAY_MS: u32 = 25_000;

/// Period between two light sensor readings.
pub const LIGHT_READ_PERIOD_MS: u32 = 5_000;

/// Enrollment window in Learn mode.
pub const LEARN_TIMEOUT_MS: u32 = 30_000;

/// Pause between two decode attempts (Learn loop and door gating).
pub const SCAN_RELAX_MS: u32 = 20;

/// Inactivity timeout of the relock delay adjustment.
pub const LOCK_TIME_INACTIVITY_MS: u32 = 30_000;

/// Timeout for each byte of a serial command parameter.
pub const SERIAL_BYTE_TIMEOUT_MS: u32 = 5;

/// Duration of one latch solenoid pulse.
pub const LATCH_PULSE_MS: u32 = 500;

// ============================================================================
// Button thresholds
// ============================================================================

pub const SHORT_PRESS_MS: u32 = 2_000;
pub const LONG_PRESS_MS: u32 = 5_000;
pub const LEARN_PRESS_MS: u32 = 10_000;
pub const VERY_LONG_PRESS_MS: u32 = 30_000;

// ============================================================================
// Light sensor
// ============================================================================

/// Threshold written at boot when the persisted one is unprogrammed.
pub const DEFAULT_LIGHT_THRESHOLD: u16 = 512;

/// Largest reading of the 10-bit light sensor ADC.
pub const MAX_LIGHT_LEVEL: u16 = 1023;

/// Dead band below the threshold before Night mode unlocks the exit.
pub const NIGHT_HYSTERESIS: u16 = 5;
