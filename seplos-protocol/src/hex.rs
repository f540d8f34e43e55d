//! ASCII-hex encoding of header fields and payload sub-fields
//!
//! Everything between `SOI` and `EOI` is sent as upper case hex digits,
//! most significant nibble first. Decoding accepts both cases.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

pub fn nibble_encode_hex(value: u8) -> u8 {
    DIGITS[(value & 0xF) as usize]
}
pub fn u8_encode_hex(value: u8) -> [u8; 2] {
    [nibble_encode_hex(value >> 4), nibble_encode_hex(value)]
}
pub fn u16_encode_hex(value: u16) -> [u8; 4] {
    let [high, low] = value.to_be_bytes();
    let [a, b] = u8_encode_hex(high);
    let [c, d] = u8_encode_hex(low);
    [a, b, c, d]
}

pub fn is_hex_digit(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

/// Decodes hex digits while remembering whether any of them was invalid
///
/// A non-hex character decodes as `0` and marks the decoder invalid,
/// so a whole header can be decoded first and checked once afterwards.
#[derive(Debug, Default)]
pub struct HexDecoder {
    invalid: bool,
}
impl HexDecoder {
    pub fn new() -> Self {
        Self::default()
    }
    /// Mark the decoded data invalid for a reason other than a bad digit
    pub fn invalidate(&mut self) {
        self.invalid = true;
    }
    /// `true` once any decoded character was not a hex digit
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }
    pub fn nibble(&mut self, c: u8) -> u8 {
        match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'f' => c - b'a' + 10,
            b'A'..=b'F' => c - b'A' + 10,
            _ => {
                self.invalid = true;
                0
            }
        }
    }
    pub fn u8(&mut self, ascii: &[u8; 2]) -> u8 {
        (self.nibble(ascii[0]) << 4) | self.nibble(ascii[1])
    }
    pub fn u16(&mut self, ascii: &[u8; 4]) -> u16 {
        ascii
            .iter()
            .fold(0, |acc, c| (acc << 4) | self.nibble(*c) as u16)
    }
}

/// Two hex digits holding one byte, as laid out in a record
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(transparent)]
pub struct Hex2(pub [u8; 2]);
impl Hex2 {
    pub fn decode(&self, hex: &mut HexDecoder) -> u8 {
        hex.u8(&self.0)
    }
}

/// Four hex digits holding a 16 bit word, as laid out in a record
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(transparent)]
pub struct Hex4(pub [u8; 4]);
impl Hex4 {
    pub fn decode(&self, hex: &mut HexDecoder) -> u16 {
        hex.u16(&self.0)
    }
}
