//! The two checksums of a frame
//!
//! `LCHKSUM` protects the 12 bit payload length, `CHKSUM` protects every
//! ASCII character from the version field up to the end of the payload.
//! Neither covers `SOI`, the checksum itself or `EOI`.

/// Mask of the payload length inside the `LENGTH` field
pub const LENGTH_MASK: u16 = 0x0FFF;
/// Mask of the length checksum inside the `LENGTH` field
pub const LENGTH_CHECKSUM_MASK: u16 = 0xF000;

/// Calculate `LCHKSUM` for a payload of `length` ASCII characters
///
/// The three nibbles of the length are summed and the sum negated,
/// the low nibble of the result lands in the top nibble of the field.
///
/// ## Example
/// A length of `0x002` sums to `2`, negated that is `0xE`, so the
/// checksum is `0xE000` and the transmitted field `0xE002`.
pub fn length_checksum(length: u16) -> u16 {
    let sum = ((length >> 8) & 0xF) + ((length >> 4) & 0xF) + (length & 0xF);
    let negated = (!(sum as u8)).wrapping_add(1) as u16;
    (negated << 12) & LENGTH_CHECKSUM_MASK
}

/// Build the transmitted `LENGTH` field for `length` ASCII payload characters
pub fn length_field(length: u16) -> u16 {
    length_checksum(length & LENGTH_MASK) | (length & LENGTH_MASK)
}

/// Check the `LCHKSUM` nibble of a received `LENGTH` field
pub fn length_field_is_valid(field: u16) -> bool {
    length_checksum(field & LENGTH_MASK) == field & LENGTH_CHECKSUM_MASK
}

/// Calculate `CHKSUM` over `data`
///
/// `data` is the ASCII encoded frame from the version field through the
/// end of the payload.
///
/// ## Example
/// Given the `data` `b"1203400456ABCEFE"`, the calculated checksum is
/// `0xFC71`.
pub fn overall_checksum(data: &[u8]) -> u16 {
    let mut checksum = Checksum::new();
    checksum.update(data);
    checksum.finalize()
}

/// `CHKSUM` that can be updated multiple times before finalizing
#[derive(Debug, Default)]
pub struct Checksum {
    acc: u32,
}
impl Checksum {
    pub fn new() -> Self {
        Self::default()
    }
    /// Update the checksum with new data
    pub fn update(&mut self, data: &[u8]) {
        for value in data {
            self.acc = self.acc.wrapping_add(*value as u32);
        }
    }
    /// Finalize the checksum
    ///
    /// The negation is truncated to the 16 bits of the field, a sum that is a
    /// multiple of `0x10000` yields `0x0000`.
    /// Also resets the internal state for reuse.
    pub fn finalize(&mut self) -> u16 {
        let checksum = ((!self.acc) & 0xFFFF).wrapping_add(1);
        self.acc = 0;
        checksum as u16
    }
}
