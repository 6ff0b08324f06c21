//! Bit-level decoding of the demodulated transponder stream.
//!
//! The stream is differential biphase: a cell whose sampled level matches
//! the level expected from the previous cell decodes as `1`. Each cell spans
//! [`TICKS_PER_CELL`] timer ticks and is only sampled at ticks
//! [`CELL_SAMPLE_FIRST`]..=[`CELL_SAMPLE_LAST`]. Whatever the decoded value,
//! the expected level for the next cell is the inverse of the last sample.

use petflap_core::{
    DecodeError, TagId, TagRecord,
    constants::{
        CELL_SAMPLE_FIRST, CELL_SAMPLE_LAST, DATA_BYTES, FRAME_BYTES, HEADER_BIT, HEADER_BITS,
        RFID_CARRIER_THRESHOLD, RFID_LEVEL_THRESHOLD, RFID_STABILIZATION_DELAY_MS,
        RFID_SYNC_TIMEOUT_MS, TAG_ID_LEN, TICKS_PER_CELL,
    },
    crc16,
};
use petflap_hardware::{Clock, SampleSource};
use tracing::{debug, trace};

/// A tag read whose embedded CRC matched the data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeResult {
    /// First six bytes of the data block.
    pub identifier: TagId,
    /// Full data block covered by the CRC.
    pub data: [u8; DATA_BYTES],
    /// CRC transmitted by the tag (little-endian after the data block).
    pub crc_embedded: u16,
    /// CRC computed over the received data block.
    pub crc_computed: u16,
}

impl DecodeResult {
    /// Allow-list key of this tag.
    #[must_use]
    pub fn key(&self) -> u16 {
        self.crc_computed
    }

    /// `true` when the read can be enrolled: both CRCs agree and are non-zero.
    #[must_use]
    pub fn is_enrollable(&self) -> bool {
        self.crc_computed != 0 && self.crc_embedded == self.crc_computed
    }

    /// Record to store for this tag.
    #[must_use]
    pub fn record(&self) -> TagRecord {
        TagRecord::new(self.key(), self.identifier)
    }

    fn from_frame(frame: &[u8; FRAME_BYTES]) -> Self {
        let mut data = [0u8; DATA_BYTES];
        data.copy_from_slice(&frame[..DATA_BYTES]);
        let mut identifier = [0u8; TAG_ID_LEN];
        identifier.copy_from_slice(&frame[..TAG_ID_LEN]);

        Self {
            identifier: TagId::new(identifier),
            data,
            crc_embedded: u16::from_le_bytes([frame[DATA_BYTES], frame[DATA_BYTES + 1]]),
            crc_computed: crc16(&data),
        }
    }
}

/// RFID decoder owning the analog front end.
///
/// The clock is borrowed per attempt so the controller can share one clock
/// between the decoder and everything else it drives.
#[derive(Debug)]
pub struct Decoder<S> {
    source: S,
    /// Level the next cell must show to decode as `1`.
    expected: bool,
}

impl<S: SampleSource> Decoder<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            expected: false,
        }
    }

    /// Run one complete decode attempt.
    ///
    /// Busy-waits for at most the 100 ms synchronization budget plus the
    /// duration of one frame. The carrier is on for the whole attempt and
    /// off when this returns.
    ///
    /// # Errors
    /// - `DecodeError::NoHeader` when no header was found within the budget,
    ///   including when no tag loaded the field.
    /// - `DecodeError::BadCrc` when the embedded CRC does not match.
    pub fn decode<C: Clock>(&mut self, clock: &C) -> Result<DecodeResult, DecodeError> {
        self.source.set_excitation(true);
        clock.delay_ms(RFID_STABILIZATION_DELAY_MS);

        let result = self.synchronize(clock).and_then(|()| self.read_frame());

        self.source.set_excitation(false);

        match &result {
            Ok(read) => debug!(id = %read.identifier, key = read.key(), "Tag decoded"),
            Err(e @ DecodeError::BadCrc { .. }) => debug!(code = e.code(), "Read rejected: {e}"),
            Err(e) => trace!(code = e.code(), "No tag: {e}"),
        }
        result
    }

    /// Give the front end back, e.g. to inspect a simulated one.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn level(&mut self) -> bool {
        self.source.stream_level() > RFID_LEVEL_THRESHOLD
    }

    /// Wait for a loaded carrier, an edge, and ten header cells.
    fn synchronize<C: Clock>(&mut self, clock: &C) -> Result<(), DecodeError> {
        let start = clock.now_ms();
        while clock.elapsed_since(start) < RFID_SYNC_TIMEOUT_MS {
            if self.source.field_strength() > RFID_CARRIER_THRESHOLD {
                continue;
            }
            self.expected = self.wait_edge(clock);
            if (0..HEADER_BITS).all(|_| self.read_bit() == HEADER_BIT) {
                trace!(elapsed_ms = clock.elapsed_since(start), "Header found");
                return Ok(());
            }
        }
        Err(DecodeError::NoHeader)
    }

    /// Poll until the level changes and return the new level.
    ///
    /// Gives up after the sync budget and returns the inverse of the initial
    /// level anyway, so a silent stream cannot stall the loop.
    fn wait_edge<C: Clock>(&mut self, clock: &C) -> bool {
        let initial = self.level();
        let start = clock.now_ms();
        while self.level() == initial {
            if clock.elapsed_since(start) > RFID_SYNC_TIMEOUT_MS {
                break;
            }
        }
        !initial
    }

    fn read_bit(&mut self) -> bool {
        let expected = self.expected;
        let mut bit = true;
        for tick in 0..TICKS_PER_CELL {
            self.source.wait_tick();
            if (CELL_SAMPLE_FIRST..=CELL_SAMPLE_LAST).contains(&tick) {
                let level = self.level();
                if level != expected {
                    bit = false;
                }
                self.expected = !level;
            }
        }
        bit
    }

    /// One start cell (read and discarded) then eight bits LSB-first.
    fn read_byte(&mut self) -> u8 {
        self.read_bit();
        (0..8).fold(0u8, |byte, i| {
            if self.read_bit() { byte | (1 << i) } else { byte }
        })
    }

    fn read_frame(&mut self) -> Result<DecodeResult, DecodeError> {
        let mut frame = [0u8; FRAME_BYTES];
        for byte in &mut frame {
            *byte = self.read_byte();
        }

        let read = DecodeResult::from_frame(&frame);
        if read.crc_embedded != read.crc_computed {
            return Err(DecodeError::BadCrc {
                embedded: read.crc_embedded,
                computed: read.crc_computed,
            });
        }
        Ok(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petflap_hardware::mock::{SimClock, SimTransponder, SimTransponderHandle};
    use rstest::rstest;

    fn setup() -> (SimClock, Decoder<SimTransponder>, SimTransponderHandle) {
        let clock = SimClock::new();
        let (reader, handle) = SimTransponder::new(clock.clone());
        (clock, Decoder::new(reader), handle)
    }

    #[rstest]
    #[case([0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08])]
    #[case([0xFF; 8])]
    #[case([0x80, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00])]
    #[case([0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0x00, 0x00])]
    fn test_decodes_presented_tag(#[case] data: [u8; 8]) {
        let (clock, mut decoder, handle) = setup();
        handle.present_tag(data);

        let read = decoder.decode(&clock).unwrap();

        assert_eq!(read.data, data);
        assert_eq!(read.identifier.as_bytes(), &data[..6]);
        assert_eq!(read.crc_computed, crc16(&data));
        assert_eq!(read.crc_embedded, read.crc_computed);
        assert!(!handle.is_excited());
    }

    #[test]
    fn test_no_tag_is_no_header_after_budget() {
        let (clock, mut decoder, handle) = setup();
        let start = clock.now_ms();

        assert_eq!(decoder.decode(&clock), Err(DecodeError::NoHeader));

        let elapsed = clock.elapsed_since(start);
        assert!(elapsed >= RFID_SYNC_TIMEOUT_MS);
        assert!(elapsed < RFID_SYNC_TIMEOUT_MS + 10);
        assert_eq!(handle.excitation_cycles(), 1);
        assert!(!handle.is_excited());
    }

    #[test]
    fn test_bad_crc_reports_both_values() {
        let (clock, mut decoder, handle) = setup();
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut frame = [0u8; FRAME_BYTES];
        frame[..8].copy_from_slice(&data);
        frame[8..].copy_from_slice(&0x1234u16.to_le_bytes());
        handle.present_frame(frame);

        assert_eq!(
            decoder.decode(&clock),
            Err(DecodeError::BadCrc {
                embedded: 0x1234,
                computed: 0xEEA7,
            })
        );
        assert!(!handle.is_excited());
    }

    #[test]
    fn test_each_attempt_brackets_the_carrier() {
        let (clock, mut decoder, handle) = setup();
        handle.present_tag([9; 8]);

        for _ in 0..3 {
            decoder.decode(&clock).unwrap();
        }
        handle.remove_tag();
        let _ = decoder.decode(&clock);

        assert_eq!(handle.excitation_cycles(), 4);
        assert!(!handle.is_excited());
    }

    #[test]
    fn test_zero_block_decodes_but_is_not_enrollable() {
        let (clock, mut decoder, handle) = setup();
        handle.present_tag([0; 8]);

        let read = decoder.decode(&clock).unwrap();

        assert_eq!(read.key(), 0);
        assert!(!read.is_enrollable());
    }

    #[test]
    fn test_record_uses_computed_key() {
        let mut frame = [0u8; FRAME_BYTES];
        frame[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        frame[8..].copy_from_slice(&0xEEA7u16.to_le_bytes());

        let read = DecodeResult::from_frame(&frame);

        assert!(read.is_enrollable());
        assert_eq!(
            read.record(),
            TagRecord::new(0xEEA7, TagId::new([1, 2, 3, 4, 5, 6]))
        );
    }

    #[test]
    fn test_header_without_payload_reads_as_zero_key() {
        let (clock, mut decoder, handle) = setup();
        // The bytes after the header are read from the quiet stream.
        handle.present_cells(&[HEADER_BIT; HEADER_BITS]);

        let read = decoder.decode(&clock).unwrap();

        assert_eq!(read.data, [0; DATA_BYTES]);
        assert_eq!(read.key(), 0);
        assert!(!read.is_enrollable());
    }
}
