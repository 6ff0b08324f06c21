use crate::{
    Result,
    constants::{SLOT_SIZE, TAG_ID_LEN, TAG_SLOTS},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Six-byte transponder identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TagId([u8; TAG_ID_LEN]);

impl TagId {
    /// All-zero identifier, reported for empty or out-of-range slots.
    pub const ZERO: TagId = TagId([0; TAG_ID_LEN]);

    #[must_use]
    pub const fn new(bytes: [u8; TAG_ID_LEN]) -> Self {
        TagId(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; TAG_ID_LEN] {
        &self.0
    }
}

impl From<[u8; TAG_ID_LEN]> for TagId {
    fn from(bytes: [u8; TAG_ID_LEN]) -> Self {
        TagId(bytes)
    }
}

/// Formats as 6 uppercase hex byte pairs, e.g. `0102030A0B0C`.
impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// One slot of the tag store: CRC key plus identifier.
///
/// A record whose key is `0` is an empty slot. The key is the CRC computed
/// over the transponder data block when the tag was enrolled, so it doubles
/// as an integrity check and as the lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TagRecord {
    pub key: u16,
    pub id: TagId,
}

impl TagRecord {
    /// The all-zero record: key 0, identifier all zero.
    pub const EMPTY: TagRecord = TagRecord {
        key: 0,
        id: TagId::ZERO,
    };

    #[must_use]
    pub const fn new(key: u16, id: TagId) -> Self {
        Self { key, id }
    }

    /// Build a record that may be enrolled.
    ///
    /// # Errors
    /// Returns `Error::ZeroKey` because a zero key marks an empty slot.
    pub fn enrollable(key: u16, id: TagId) -> Result<Self> {
        if key == 0 {
            return Err(Error::ZeroKey);
        }
        Ok(Self { key, id })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key == 0
    }

    /// Persisted form: key little-endian first, then the identifier.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SLOT_SIZE] {
        let mut out = [0u8; SLOT_SIZE];
        out[..2].copy_from_slice(&self.key.to_le_bytes());
        out[2..].copy_from_slice(self.id.as_bytes());
        out
    }

    #[must_use]
    pub fn from_bytes(bytes: &[u8; SLOT_SIZE]) -> Self {
        let key = u16::from_le_bytes([bytes[0], bytes[1]]);
        let mut id = [0u8; TAG_ID_LEN];
        id.copy_from_slice(&bytes[2..]);
        Self {
            key,
            id: TagId(id),
        }
    }
}

impl fmt::Display for TagRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ID={} CRC=0x{:04X}", self.id, self.key)
    }
}

/// 1-based slot number as shown on the diagnostic link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotNumber(u8);

impl SlotNumber {
    /// # Errors
    /// Returns `Error::InvalidSlot` outside `1..=TAG_SLOTS`.
    pub fn new(slot: u8) -> Result<Self> {
        if slot == 0 || usize::from(slot) > TAG_SLOTS {
            return Err(Error::InvalidSlot {
                slot,
                max: TAG_SLOTS as u8,
            });
        }
        Ok(SlotNumber(slot))
    }

    /// Slot number for a 0-based table index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        (index < TAG_SLOTS).then(|| SlotNumber(index as u8 + 1))
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0) - 1
    }
}

impl fmt::Display for SlotNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Door operating mode. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OperatingMode {
    /// Entry on a recognized tag, exit free.
    #[default]
    Normal = 0,
    /// Entry on a recognized tag, exit locked.
    Vet = 1,
    /// Both directions locked, no scanning.
    Closed = 2,
    /// Like Normal, exit follows the light sensor.
    Night = 3,
    /// Transient: enroll one tag, then back to Normal.
    Learn = 4,
    /// Transient: erase every tag, then back to Normal.
    Clear = 5,
    /// Both directions free.
    Open = 6,
}

impl OperatingMode {
    pub const ALL: [OperatingMode; 7] = [
        OperatingMode::Normal,
        OperatingMode::Vet,
        OperatingMode::Closed,
        OperatingMode::Night,
        OperatingMode::Learn,
        OperatingMode::Clear,
        OperatingMode::Open,
    ];

    /// # Errors
    /// Returns `Error::InvalidMode` for values above 6.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(Error::InvalidMode(value))
    }

    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Modes in which a recognized tag unlocks the entry latch.
    #[must_use]
    pub fn permits_door_open(self) -> bool {
        matches!(
            self,
            OperatingMode::Normal | OperatingMode::Vet | OperatingMode::Night
        )
    }

    /// Learn and Clear run to completion and fall back to Normal.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, OperatingMode::Learn | OperatingMode::Clear)
    }

    /// Latch positions `(entry_locked, exit_locked)` applied on entering the mode.
    #[must_use]
    pub fn latch_policy(self) -> (bool, bool) {
        match self {
            OperatingMode::Normal
            | OperatingMode::Night
            | OperatingMode::Learn
            | OperatingMode::Clear => (true, false),
            OperatingMode::Vet | OperatingMode::Closed => (true, true),
            OperatingMode::Open => (false, false),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            OperatingMode::Normal => "NORMAL",
            OperatingMode::Vet => "VET",
            OperatingMode::Closed => "CLOSED",
            OperatingMode::Night => "NIGHT",
            OperatingMode::Learn => "LEARN",
            OperatingMode::Clear => "CLEAR",
            OperatingMode::Open => "OPEN",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Entry of the extended settings menu.
///
/// Navigation is cyclic in both directions. The 1-based position is also the
/// number of beeps announcing the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsCursor {
    #[default]
    Exit,
    Open,
    Silent,
    LightLevel,
    LockTime,
    LowBattery,
    Timer,
}

impl SettingsCursor {
    pub const ALL: [SettingsCursor; 7] = [
        SettingsCursor::Exit,
        SettingsCursor::Open,
        SettingsCursor::Silent,
        SettingsCursor::LightLevel,
        SettingsCursor::LockTime,
        SettingsCursor::LowBattery,
        SettingsCursor::Timer,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Successor, wrapping from `Timer` to `Exit`.
    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Predecessor, wrapping from `Exit` to `Timer`.
    #[must_use]
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// 1-based menu position.
    #[must_use]
    pub fn position(self) -> u8 {
        self.index() as u8 + 1
    }
}

/// Physical latch solenoids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Latch {
    /// Green latch, controls the way in.
    Entry,
    /// Red latch, controls the way out.
    Exit,
}

impl fmt::Display for Latch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Latch::Entry => write!(f, "Entry"),
            Latch::Exit => write!(f, "Exit"),
        }
    }
}

/// Front panel indicator LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Led {
    Green,
    Red,
}
