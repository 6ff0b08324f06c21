//! FDX-B transponder decoder.
//!
//! Turns the raw analog front end exposed by
//! [`SampleSource`](petflap_hardware::SampleSource) into a validated tag read.
//! One call to [`Decoder::decode`] is one complete attempt: the carrier is
//! switched on, the decoder waits for a loaded field, synchronizes on the
//! header, reads the ten frame bytes and checks the CRC, and the carrier is
//! switched off again whatever the outcome.
//!
//! ```text
//! CarrierWait ─▶ EdgeWait ─▶ Header (10 cells) ─▶ Bytes (10 × [start + 8 bits]) ─▶ CRC
//!      ▲                         │ mismatch
//!      └─────────────────────────┘   (until the 100 ms sync budget runs out)
//! ```
//!
//! # Example
//!
//! ```
//! use petflap_hardware::mock::{SimClock, SimTransponder};
//! use petflap_rfid::Decoder;
//!
//! let clock = SimClock::new();
//! let (reader, handle) = SimTransponder::new(clock.clone());
//! handle.present_tag([0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x01, 0x80]);
//!
//! let mut decoder = Decoder::new(reader);
//! let read = decoder.decode(&clock).unwrap();
//! assert_eq!(read.identifier.to_string(), "112233445566");
//! assert_eq!(read.crc_embedded, read.crc_computed);
//! ```

pub mod decoder;

pub use decoder::{DecodeResult, Decoder};
