//! Tag table operations.

use petflap_core::{
    SlotNumber, TagRecord,
    constants::{SLOT_SIZE, TABLE_OFFSET, TAG_SLOTS},
};
use petflap_hardware::{Actuator, Clock, NvMemory};
use tracing::{debug, info, trace, warn};

/// Confirmation beeps played after the table was cleared.
pub const CLEAR_BEEPS: u8 = 5;

/// Pause between two clear confirmation beeps.
pub const CLEAR_BEEP_INTERVAL_MS: u32 = 100;

/// Tag table and configuration region over one non-volatile medium.
///
/// Configuration operations live in [`config`](crate::config).
#[derive(Debug)]
pub struct TagStore<M> {
    memory: M,
}

fn slot_offset(index: usize) -> usize {
    TABLE_OFFSET + index * SLOT_SIZE
}

impl<M: NvMemory> TagStore<M> {
    pub fn new(memory: M) -> Self {
        Self { memory }
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn into_inner(self) -> M {
        self.memory
    }

    pub(crate) fn read_u16(&self, addr: usize) -> u16 {
        u16::from_le_bytes([self.memory.read(addr), self.memory.read(addr + 1)])
    }

    /// Write `value` at `addr` unless the byte already holds it.
    pub(crate) fn write_if_changed(&mut self, addr: usize, value: u8) -> bool {
        if self.memory.read(addr) == value {
            return false;
        }
        trace!(addr, value, "EEPROM write");
        self.memory.write(addr, value);
        true
    }

    /// Returns the number of bytes actually written.
    pub(crate) fn write_bytes(&mut self, addr: usize, bytes: &[u8]) -> usize {
        let mut written = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            if self.write_if_changed(addr + i, byte) {
                written += 1;
            }
        }
        written
    }

    fn slot_key(&self, index: usize) -> u16 {
        self.read_u16(slot_offset(index))
    }

    /// Store `record` in the first empty slot.
    ///
    /// Returns the slot that already holds the same key without writing
    /// anything, so enrolling a known tag again is free. Returns `None` when
    /// the table is full, or for a zero key, which would be
    /// indistinguishable from an empty slot.
    pub fn insert(&mut self, record: TagRecord) -> Option<SlotNumber> {
        if record.is_empty() {
            warn!("Refusing to store a tag with key 0x0000");
            return None;
        }

        for index in 0..TAG_SLOTS {
            let key = self.slot_key(index);
            if key == record.key {
                debug!(slot = index + 1, key = record.key, "Tag already stored");
                return SlotNumber::from_index(index);
            }
            if key == 0 {
                let written = self.write_bytes(slot_offset(index), &record.to_bytes());
                info!(slot = index + 1, %record, written, "Tag stored");
                return SlotNumber::from_index(index);
            }
        }

        warn!(%record, "Tag table full");
        None
    }

    /// Find the slot whose key equals `candidate_key`.
    ///
    /// A slot only matches when `confirm_key` is non-zero and equal to the
    /// stored key as well. Callers pass the computed CRC as the candidate and
    /// the CRC embedded in the transmission as the confirmation, so a read
    /// that only collides with an empty slot can never open the door.
    pub fn lookup(&self, candidate_key: u16, confirm_key: u16) -> Option<(SlotNumber, TagRecord)> {
        if confirm_key == 0 || confirm_key != candidate_key {
            return None;
        }
        (0..TAG_SLOTS)
            .find(|&index| self.slot_key(index) == candidate_key)
            .and_then(|index| Some((SlotNumber::from_index(index)?, self.get_slot(index))))
    }

    /// Record at 0-based `index`; the all-zero record when out of range.
    pub fn get_slot(&self, index: usize) -> TagRecord {
        if index >= TAG_SLOTS {
            return TagRecord::EMPTY;
        }
        let offset = slot_offset(index);
        let mut bytes = [0u8; SLOT_SIZE];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.memory.read(offset + i);
        }
        TagRecord::from_bytes(&bytes)
    }

    /// Empty the slot at 0-based `index` by zeroing its key.
    ///
    /// The identifier bytes are left in place. Returns `true` when the slot
    /// was occupied.
    pub fn delete_slot(&mut self, index: usize) -> bool {
        if index >= TAG_SLOTS || self.slot_key(index) == 0 {
            return false;
        }
        self.write_bytes(slot_offset(index), &[0, 0]);
        info!(slot = index + 1, "Tag deleted");
        true
    }

    /// Zero the key of every slot, then confirm with a series of beeps.
    pub fn clear_all<A: Actuator, C: Clock>(&mut self, actuator: &mut A, clock: &C) {
        let written: usize = (0..TAG_SLOTS)
            .map(|index| self.write_bytes(slot_offset(index), &[0, 0]))
            .sum();
        info!(written, "Tag table cleared");

        for _ in 0..CLEAR_BEEPS {
            actuator.sound_confirmation();
            clock.delay_ms(CLEAR_BEEP_INTERVAL_MS);
        }
    }

    /// `true` when at least one slot holds a tag.
    pub fn any_programmed(&self) -> bool {
        (0..TAG_SLOTS).any(|index| self.slot_key(index) != 0)
    }

    /// Occupied slots in table order.
    pub fn entries(&self) -> impl Iterator<Item = (SlotNumber, TagRecord)> + '_ {
        (0..TAG_SLOTS).filter_map(move |index| {
            let record = self.get_slot(index);
            if record.is_empty() {
                return None;
            }
            SlotNumber::from_index(index).map(|slot| (slot, record))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petflap_core::TagId;
    use petflap_hardware::mock::{RecordingActuator, SimClock, SimEeprom, SimEepromHandle, Sound};
    use rstest::rstest;

    fn store() -> (TagStore<SimEeprom>, SimEepromHandle) {
        let (eeprom, handle) = SimEeprom::new();
        (TagStore::new(eeprom), handle)
    }

    fn record(key: u16) -> TagRecord {
        let [lo, hi] = key.to_le_bytes();
        TagRecord::new(key, TagId::new([lo, hi, 0xA0, 0xB0, 0xC0, 0xD0]))
    }

    #[test]
    fn test_insert_fills_slots_in_order() {
        let (mut store, _) = store();
        assert_eq!(store.insert(record(0x1111)).map(SlotNumber::get), Some(1));
        assert_eq!(store.insert(record(0x2222)).map(SlotNumber::get), Some(2));
        assert_eq!(store.get_slot(1), record(0x2222));
    }

    #[test]
    fn test_insert_is_idempotent_without_writes() {
        let (mut store, handle) = store();
        let first = store.insert(record(0xBEEF));
        let writes = handle.write_count();
        assert_eq!(writes, SLOT_SIZE);

        let second = store.insert(record(0xBEEF));

        assert_eq!(first, second);
        assert_eq!(handle.write_count(), writes);
    }

    #[test]
    fn test_seventeenth_insert_is_rejected() {
        let (mut store, _) = store();
        for key in 1..=16u16 {
            assert_eq!(store.insert(record(key)).map(SlotNumber::get), Some(key as u8));
        }
        assert_eq!(store.insert(record(17)), None);
        // Known keys are still found when the table is full.
        assert_eq!(store.insert(record(9)).map(SlotNumber::get), Some(9));
    }

    #[test]
    fn test_zero_key_is_never_stored() {
        let (mut store, handle) = store();
        assert_eq!(store.insert(TagRecord::new(0, TagId::new([1; 6]))), None);
        assert_eq!(handle.write_count(), 0);
    }

    #[test]
    fn test_insert_reuses_deleted_slot_and_skips_same_bytes() {
        let (mut store, handle) = store();
        store.insert(record(0x1111));
        store.insert(record(0x2222));
        assert!(store.delete_slot(0));
        handle.reset_write_log();

        // Same identifier bytes as the deleted record, different key.
        let replacement = TagRecord::new(0x3333, record(0x1111).id);
        assert_eq!(store.insert(replacement).map(SlotNumber::get), Some(1));
        assert_eq!(
            handle.written_addresses(),
            vec![TABLE_OFFSET, TABLE_OFFSET + 1]
        );
    }

    #[rstest]
    #[case(0xBEEF, 0xBEEF, true)]
    #[case(0xBEEF, 0x0000, false)]
    #[case(0xBEEF, 0xBEEE, false)]
    #[case(0xBEEE, 0xBEEE, false)]
    fn test_lookup_requires_confirmation(
        #[case] candidate: u16,
        #[case] confirm: u16,
        #[case] expected: bool,
    ) {
        let (mut store, _) = store();
        store.insert(record(0x1234));
        store.insert(record(0xBEEF));

        let found = store.lookup(candidate, confirm);

        assert_eq!(found.is_some(), expected);
        if let Some((slot, found)) = found {
            assert_eq!(slot.get(), 2);
            assert_eq!(found, record(0xBEEF));
        }
    }

    #[test]
    fn test_zero_key_never_matches_empty_slot() {
        let (store, _) = store();
        assert_eq!(store.lookup(0, 0), None);
    }

    #[test]
    fn test_lookup_scans_every_slot() {
        let (mut store, _) = store();
        for key in 1..=16u16 {
            store.insert(record(key));
        }
        for key in 1..=16u16 {
            let (slot, _) = store.lookup(key, key).unwrap();
            assert_eq!(slot.get(), key as u8);
        }
    }

    #[rstest]
    #[case(16)]
    #[case(200)]
    fn test_out_of_range_slot_is_inert(#[case] index: usize) {
        let (mut store, handle) = store();
        store.insert(record(0x1111));
        handle.reset_write_log();

        assert_eq!(store.get_slot(index), TagRecord::EMPTY);
        assert!(!store.delete_slot(index));
        assert_eq!(handle.write_count(), 0);
    }

    #[test]
    fn test_delete_zeroes_only_the_key() {
        let (mut store, handle) = store();
        store.insert(record(0xABCD));
        handle.reset_write_log();

        assert!(store.delete_slot(0));
        assert_eq!(handle.written_addresses(), vec![TABLE_OFFSET, TABLE_OFFSET + 1]);
        let slot = store.get_slot(0);
        assert!(slot.is_empty());
        assert_eq!(slot.id, record(0xABCD).id);

        assert!(!store.delete_slot(0));
        assert_eq!(handle.write_count(), 2);
    }

    #[test]
    fn test_clear_all_zeroes_keys_and_beeps() {
        let (mut store, handle) = store();
        let clock = SimClock::new();
        let (mut actuator, sounds) = RecordingActuator::new(clock.clone());
        store.insert(record(0x00FF));
        store.insert(record(0x0102));
        handle.reset_write_log();

        store.clear_all(&mut actuator, &clock);

        // 0x00FF only has a non-zero low byte.
        assert_eq!(handle.write_count(), 3);
        assert!(!store.any_programmed());
        assert_eq!(sounds.sounds(), vec![Sound::Confirmation; 5]);
        assert!(clock.micros() >= 500_000);

        handle.reset_write_log();
        store.clear_all(&mut actuator, &clock);
        assert_eq!(handle.write_count(), 0);
    }

    #[test]
    fn test_any_programmed_and_entries() {
        let (mut store, _) = store();
        assert!(!store.any_programmed());
        assert_eq!(store.entries().count(), 0);

        store.insert(record(0x0A0A));
        store.insert(record(0x0B0B));
        store.delete_slot(0);

        assert!(store.any_programmed());
        let entries: Vec<_> = store.entries().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.get(), 2);
        assert_eq!(entries[0].1, record(0x0B0B));
    }
}
