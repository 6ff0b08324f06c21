//! Lines sent on the diagnostic link.
//!
//! Each [`Response`] renders as exactly one line without terminator. The
//! wording is kept stable for host tools that scrape it: slot numbers are
//! 1-based, identifiers are 6 uppercase hex byte pairs and keys are 4 hex
//! digits.

use crate::{
    command::CommandKind,
    error::{ProtocolError, printable},
};
use petflap_core::{OperatingMode, SlotNumber, TagRecord, constants::TAG_SLOTS};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    // Command responses
    /// Echo of a received leading byte.
    Received(u8),
    /// Announces the command being executed.
    Executing(CommandKind),
    ReadingTagId,
    Status {
        mode: OperatingMode,
        light: u16,
        entry_locked: bool,
        exit_locked: bool,
    },
    ConfigWritten { index: u8, value: u16 },
    ConfigValue { index: u8, value: u16 },
    ModeSet(OperatingMode),
    InvalidMode(u8),
    ListHeader,
    ListEntry(SlotNumber, TagRecord),
    ListTotal(usize),
    Saved(SlotNumber),
    SavedRecord(TagRecord),
    SaveFailed,
    InvalidSlot(u8),
    SlotAlreadyEmpty(SlotNumber),
    Deleted(SlotNumber),
    DeletedRecord(TagRecord),
    SlotEmpty(SlotNumber),
    SlotEntry(SlotNumber, TagRecord),
    Failed(ProtocolError),

    // Unsolicited events
    Ready,
    NoTagsWarning,
    ModeChanged {
        from: OperatingMode,
        to: OperatingMode,
    },
    DoorOpen { relock_delay_ms: u32 },
    DoorClose,
    TagDetected(TagRecord),
    Learned(SlotNumber, TagRecord),
    LearnTimeout,
    Cleared,
    RelockDelaySet(u32),
}

impl Response {
    /// Status bit field: bit 0 entry locked, bit 1 exit locked.
    #[must_use]
    pub fn status_bits(entry_locked: bool, exit_locked: bool) -> u16 {
        u16::from(entry_locked) | (u16::from(exit_locked) << 1)
    }
}

impl From<ProtocolError> for Response {
    fn from(error: ProtocolError) -> Self {
        Response::Failed(error)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Response::Received(byte) => write!(f, "RX: '{}' (0x{byte:02X})", printable(*byte)),
            Response::Executing(kind) => write!(f, "CMD: {kind}"),
            Response::ReadingTagId => f.write_str("Reading cat ID (6 bytes)..."),
            Response::Status {
                mode,
                light,
                entry_locked,
                exit_locked,
            } => write!(
                f,
                "STATUS: Mode={} Light={light} Pos=0 Status=0x{:04X} InLocked={} OutLocked={}",
                mode.to_u8(),
                Self::status_bits(*entry_locked, *exit_locked),
                u8::from(*entry_locked),
                u8::from(*exit_locked),
            ),
            Response::ConfigWritten { index, value } => {
                write!(f, "CONFIG: Set index={index} value={value}")
            }
            Response::ConfigValue { index, value } => {
                write!(f, "CONFIG: Read index={index} value={value}")
            }
            Response::ModeSet(mode) => write!(f, "MODE: Changed to {}", mode.to_u8()),
            Response::InvalidMode(value) => write!(
                f,
                "ERROR: Invalid mode {value} (max={})",
                OperatingMode::Open.to_u8()
            ),
            Response::ListHeader => f.write_str("Registered cats in EEPROM:"),
            Response::ListEntry(slot, record) => write!(f, "  Slot {slot}: {record}"),
            Response::ListTotal(count) => {
                write!(f, "Total: {count} cat(s) registered (max {TAG_SLOTS})")
            }
            Response::Saved(slot) => write!(f, "SUCCESS: Cat saved to slot {slot}"),
            Response::SavedRecord(record) => write!(f, "  {record}"),
            Response::SaveFailed => {
                f.write_str("ERROR: Failed to save cat (EEPROM full or already exists)")
            }
            Response::InvalidSlot(slot) => {
                write!(f, "ERROR: Invalid slot {slot} (valid range: 1-{TAG_SLOTS})")
            }
            Response::SlotAlreadyEmpty(slot) => write!(f, "ERROR: Slot {slot} is already empty"),
            Response::Deleted(slot) => write!(f, "SUCCESS: Deleted cat from slot {slot}"),
            Response::DeletedRecord(record) => {
                write!(f, "  ID was: {} CRC was: 0x{:04X}", record.id, record.key)
            }
            Response::SlotEmpty(slot) => write!(f, "Slot {slot}: Empty"),
            Response::SlotEntry(slot, record) => write!(f, "Slot {slot}: {record}"),
            Response::Failed(error @ ProtocolError::UnknownCommand(_)) => write!(f, "WARN: {error}"),
            Response::Failed(error) => write!(f, "ERROR: {error}"),
            Response::Ready => f.write_str("READY: Pet door serial interface"),
            Response::NoTagsWarning => f.write_str("WARN: No cats registered"),
            Response::ModeChanged { from, to } => write!(
                f,
                "MODE_CHANGE: {from} -> {to} (code: {} -> {})",
                from.to_u8(),
                to.to_u8()
            ),
            Response::DoorOpen { relock_delay_ms } => write!(
                f,
                "DOOR_OPEN: Cat flap unlocked for entry (timeout: {relock_delay_ms} ms)"
            ),
            Response::DoorClose => f.write_str("DOOR_CLOSE: Cat flap locked after timeout"),
            Response::TagDetected(record) => write!(f, "CAT_DETECTED: {record}"),
            Response::Learned(slot, record) => write!(f, "LEARNED: Slot {slot}: {record}"),
            Response::LearnTimeout => f.write_str("LEARN: No cat enrolled"),
            Response::Cleared => f.write_str("CLEARED: All cats removed"),
            Response::RelockDelaySet(ms) => write!(f, "CONFIG: Relock delay {ms} ms"),
        }
    }
}
