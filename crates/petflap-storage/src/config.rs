//! Configuration entries in the region preceding the tag table.
//!
//! An entry is a 16-bit little-endian value at byte offset `index * 2`.
//! Indices whose offset falls at or beyond [`CONFIG_SIZE`] would overlap the
//! tag table and are refused: reads return `0`, writes are dropped.

use crate::store::TagStore;
use petflap_core::constants::{
    CONFIG_SIZE, DEFAULT_LIGHT_THRESHOLD, DEFAULT_RELOCK_DELAY_MS, MAX_LIGHT_LEVEL,
    MAX_RELOCK_DELAY_MS, MIN_RELOCK_DELAY_MS, config_index,
};
use petflap_hardware::NvMemory;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

fn config_offset(index: u8) -> Option<usize> {
    let offset = usize::from(index) * 2;
    (offset < CONFIG_SIZE).then_some(offset)
}

impl<M: NvMemory> TagStore<M> {
    /// Persisted value of entry `index`, or `0` when the index is out of range.
    pub fn config_get(&self, index: u8) -> u16 {
        config_offset(index).map_or(0, |offset| self.read_u16(offset))
    }

    /// Persist `value` at entry `index`, writing only the bytes that differ.
    ///
    /// Returns `false` when the index is out of range and nothing was done.
    pub fn config_set(&mut self, index: u8, value: u16) -> bool {
        let Some(offset) = config_offset(index) else {
            warn!(index, "Configuration index out of range");
            return false;
        };
        let written = self.write_bytes(offset, &value.to_le_bytes());
        debug!(index, value, written, "Configuration entry saved");
        true
    }

    /// Load the persisted settings, repairing and rewriting invalid entries.
    ///
    /// An unprogrammed medium reads as `0xFFFF` everywhere, which is out of
    /// range for every entry, so the first boot writes `defaults`.
    pub fn load_settings(&mut self, defaults: &PersistedSettings) -> PersistedSettings {
        let mut settings = PersistedSettings::default();

        let threshold = self.config_get(config_index::LIGHT_THRESHOLD);
        settings.light_threshold = if threshold > MAX_LIGHT_LEVEL {
            warn!(threshold, "Repairing light threshold");
            self.config_set(config_index::LIGHT_THRESHOLD, defaults.light_threshold);
            defaults.light_threshold
        } else {
            threshold
        };

        let relock = u32::from(self.config_get(config_index::RELOCK_DELAY));
        settings.relock_delay_ms =
            if (MIN_RELOCK_DELAY_MS..=MAX_RELOCK_DELAY_MS).contains(&relock) {
                relock
            } else {
                warn!(relock, "Repairing relock delay");
                self.save_relock_delay(defaults.relock_delay_ms)
            };

        settings.silent = match self.config_get(config_index::SILENT) {
            0 => false,
            1 => true,
            raw => {
                warn!(raw, "Repairing silent flag");
                self.config_set(config_index::SILENT, u16::from(defaults.silent));
                defaults.silent
            }
        };

        settings
    }

    /// Persist the relock delay, clamped to its valid range.
    pub fn save_relock_delay(&mut self, delay_ms: u32) -> u32 {
        let delay = delay_ms.clamp(MIN_RELOCK_DELAY_MS, MAX_RELOCK_DELAY_MS);
        // The clamp keeps the value within u16.
        self.config_set(config_index::RELOCK_DELAY, delay as u16);
        delay
    }

    /// Persist the light threshold, capped at the sensor range.
    pub fn save_light_threshold(&mut self, threshold: u16) -> u16 {
        let threshold = threshold.min(MAX_LIGHT_LEVEL);
        self.config_set(config_index::LIGHT_THRESHOLD, threshold);
        threshold
    }

    pub fn save_silent(&mut self, silent: bool) {
        self.config_set(config_index::SILENT, u16::from(silent));
    }
}

/// Settings persisted in the configuration region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSettings {
    /// Night mode light threshold (0..=1023).
    pub light_threshold: u16,
    /// Time the entry latch stays open after a match.
    pub relock_delay_ms: u32,
    /// Suppress the chime played when a known tag opens the door.
    pub silent: bool,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            light_threshold: DEFAULT_LIGHT_THRESHOLD,
            relock_delay_ms: DEFAULT_RELOCK_DELAY_MS,
            silent: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petflap_core::constants::{NV_SIZE, TABLE_OFFSET};
    use petflap_hardware::mock::{SimEeprom, SimEepromHandle};
    use rstest::rstest;

    fn store() -> (TagStore<SimEeprom>, SimEepromHandle) {
        let (eeprom, handle) = SimEeprom::new();
        (TagStore::new(eeprom), handle)
    }

    #[test]
    fn test_config_roundtrip_little_endian() {
        let (mut store, handle) = store();
        assert!(store.config_set(3, 0x1234));
        assert_eq!(store.config_get(3), 0x1234);

        let image = handle.snapshot();
        assert_eq!(&image[6..8], &[0x34, 0x12]);
    }

    #[test]
    fn test_same_value_twice_writes_nothing() {
        let (mut store, handle) = store();
        store.config_set(0, 700);
        handle.reset_write_log();

        store.config_set(0, 700);

        assert_eq!(handle.write_count(), 0);
    }

    #[test]
    fn test_changed_value_writes_only_differing_byte() {
        let (mut store, handle) = store();
        store.config_set(0, 0x0201);
        handle.reset_write_log();

        store.config_set(0, 0x0202);

        assert_eq!(handle.written_addresses(), vec![0]);
    }

    #[rstest]
    #[case(64)]
    #[case(100)]
    #[case(255)]
    fn test_index_reaching_table_is_refused(#[case] index: u8) {
        let (mut store, handle) = store();
        let before = handle.snapshot();

        assert!(!store.config_set(index, 0xFFFF));

        assert_eq!(store.config_get(index), 0);
        assert_eq!(handle.write_count(), 0);
        assert_eq!(handle.snapshot()[TABLE_OFFSET..], before[TABLE_OFFSET..]);
    }

    #[test]
    fn test_last_index_fits_before_table() {
        let (mut store, handle) = store();
        assert!(store.config_set(63, 0xABCD));
        assert_eq!(handle.written_addresses(), vec![126, 127]);
        assert!(handle.snapshot()[TABLE_OFFSET..NV_SIZE].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_fresh_medium_is_repaired_to_defaults() {
        let (eeprom, _) = SimEeprom::blank();
        let mut store = TagStore::new(eeprom);
        let defaults = PersistedSettings {
            relock_delay_ms: 6_000,
            ..PersistedSettings::default()
        };

        let settings = store.load_settings(&defaults);

        assert_eq!(settings, defaults);
        assert_eq!(store.config_get(config_index::LIGHT_THRESHOLD), 512);
        assert_eq!(store.config_get(config_index::RELOCK_DELAY), 6_000);
        assert_eq!(store.config_get(config_index::SILENT), 0);
    }

    #[test]
    fn test_valid_settings_are_kept_without_writes() {
        let (mut store, handle) = store();
        store.config_set(config_index::LIGHT_THRESHOLD, 300);
        store.config_set(config_index::RELOCK_DELAY, 9_000);
        store.config_set(config_index::SILENT, 1);
        handle.reset_write_log();

        let settings = store.load_settings(&PersistedSettings::default());

        assert_eq!(
            settings,
            PersistedSettings {
                light_threshold: 300,
                relock_delay_ms: 9_000,
                silent: true,
            }
        );
        assert_eq!(handle.write_count(), 0);
    }

    #[rstest]
    #[case(0, 1_000)]
    #[case(999_999, 25_000)]
    #[case(12_345, 12_345)]
    fn test_relock_delay_is_clamped(#[case] requested: u32, #[case] expected: u32) {
        let (mut store, _) = store();
        assert_eq!(store.save_relock_delay(requested), expected);
        assert_eq!(u32::from(store.config_get(config_index::RELOCK_DELAY)), expected);
    }

    #[test]
    fn test_normalized_saves_survive_reload() {
        let (mut store, _) = store();
        assert_eq!(store.save_light_threshold(4_000), MAX_LIGHT_LEVEL);
        store.save_relock_delay(500);
        store.save_silent(true);

        let settings = store.load_settings(&PersistedSettings::default());

        assert_eq!(
            settings,
            PersistedSettings {
                light_threshold: MAX_LIGHT_LEVEL,
                relock_delay_ms: 1_000,
                silent: true,
            }
        );
    }

    #[test]
    fn test_settings_serialize_as_json_object() {
        let json = serde_json::to_string(&PersistedSettings::default()).unwrap();
        assert_eq!(
            json,
            r#"{"light_threshold":512,"relock_delay_ms":4000,"silent":false}"#
        );
    }
}
