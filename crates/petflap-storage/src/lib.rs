//! Non-volatile storage for enrolled tags and persisted settings.
//!
//! The medium is a small byte-addressable EEPROM with a finite write-cycle
//! budget. It is split in two regions:
//!
//! ```text
//! [0, CONFIG_SIZE)                       configuration entries, 2 bytes LE each
//! [CONFIG_SIZE, CONFIG_SIZE + 16 * 8)    tag table, 16 slots of key(2 LE) + id(6)
//! ```
//!
//! # Wear minimization
//!
//! Every write path reads the current byte first and only writes bytes that
//! differ. Re-enrolling a known tag, re-saving an unchanged setting or
//! clearing an already empty table costs no write cycles at all.
//!
//! # Failure model
//!
//! Nothing here returns an error. Out-of-range slot indices read as the
//! all-zero record and are ignored on delete; configuration indices that
//! would reach into the tag table read as zero and are ignored on write.
//! Callers treat a zero record or a zero setting as "absent".
//!
//! # Examples
//!
//! ```
//! use petflap_core::{TagId, TagRecord};
//! use petflap_hardware::mock::SimEeprom;
//! use petflap_storage::TagStore;
//!
//! let (eeprom, _handle) = SimEeprom::new();
//! let mut store = TagStore::new(eeprom);
//!
//! let record = TagRecord::new(0xEEA7, TagId::new([1, 2, 3, 4, 5, 6]));
//! let slot = store.insert(record).unwrap();
//! assert_eq!(slot.get(), 1);
//!
//! let (found, _) = store.lookup(0xEEA7, 0xEEA7).unwrap();
//! assert_eq!(found, slot);
//! ```

pub mod config;
pub mod store;

pub use config::PersistedSettings;
pub use store::TagStore;
