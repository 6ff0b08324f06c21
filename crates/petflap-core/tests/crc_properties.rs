//! Property-based tests for the tag CRC.
//!
//! The CRC is persisted as the allow-list key, so these properties pin the
//! algorithm down against an independent reflected formulation.

use petflap_core::crc16;
use proptest::prelude::*;

/// Reflected (LSB-first) formulation with the mirrored polynomial 0x8408.
fn reflected_reference(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in bytes {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0x8408
            } else {
                crc >> 1
            };
        }
    }
    crc
}

proptest! {
    /// Property: the shift-then-mirror algorithm equals the reflected one.
    #[test]
    fn prop_matches_reflected_reference(data in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assert_eq!(crc16(&data), reflected_reference(&data));
    }

    /// Property: appending the CRC little-endian always leaves a zero residue,
    /// which is what makes the embedded CRC of a transponder frame verifiable.
    #[test]
    fn prop_residue_is_zero(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let crc = crc16(&data);
        let mut frame = data.clone();
        frame.extend_from_slice(&crc.to_le_bytes());
        prop_assert_eq!(crc16(&frame), 0);
    }

    /// Property: a single flipped bit in an 8-byte block always changes the CRC.
    #[test]
    fn prop_detects_single_bit_errors(
        data in prop::array::uniform8(any::<u8>()),
        byte in 0usize..8,
        bit in 0u8..8,
    ) {
        let mut corrupted = data;
        corrupted[byte] ^= 1 << bit;
        prop_assert_ne!(crc16(&data), crc16(&corrupted));
    }

    /// Property: repeated calls are deterministic.
    #[test]
    fn prop_deterministic(data in prop::collection::vec(any::<u8>(), 0..32)) {
        prop_assert_eq!(crc16(&data), crc16(&data));
    }
}
