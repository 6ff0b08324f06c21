//! Bit-reversed CCITT CRC used for tag validation and as the allow-list key.
//!
//! Each input byte is fed into a CCITT (0x1021) shift register least
//! significant bit first, starting from a zero register. When all bytes are
//! processed the 16-bit register is mirrored (bit 0 ↔ bit 15) to produce the
//! result. The outcome is the CRC carried by ISO 11784/11785 FDX-B
//! transponders (also known as CRC-16/KERMIT).
//!
//! The value is persisted in the tag store as the lookup key, so it must stay
//! bit-exact across firmware revisions.
//!
//! # Examples
//!
//! ```
//! use petflap_core::crc16;
//!
//! assert_eq!(crc16(b"123456789"), 0x2189);
//! assert_eq!(crc16(&[0; 8]), 0x0000);
//! ```

/// CCITT generator polynomial (x^16 + x^12 + x^5 + 1).
pub const CCITT_POLYNOMIAL: u16 = 0x1021;

/// Feed one byte into the shift register, least significant bit first.
#[inline]
fn update(register: u16, byte: u8) -> u16 {
    let mut reg = register;
    for i in 0..8 {
        let input = (byte >> i) & 1 == 1;
        let top = reg & 0x8000 != 0;
        reg <<= 1;
        if top ^ input {
            reg ^= CCITT_POLYNOMIAL;
        }
    }
    reg
}

/// Compute the bit-reversed CCITT CRC of `bytes`.
///
/// Pure and infallible. An empty slice, or any run of zero bytes, yields `0`,
/// which the tag store treats as "empty slot".
#[must_use]
pub fn crc16(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |reg, &byte| update(reg, byte))
        .reverse_bits()
}
