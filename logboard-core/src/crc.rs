//! CRC-32C checksums used by the record framing.

/// Offset added to the rotated checksum by [`masked_crc32c`].
const MASK_DELTA: u32 = 0xa282_ead8;

/// Computes the CRC-32C (Castagnoli) checksum of `buf`.
///
/// The checksum of an empty buffer is `0`.
pub fn crc32c(buf: &[u8]) -> u32 {
    ::crc32c::crc32c(buf)
}

/// Computes the masked CRC-32C checksum of `buf`.
///
/// The raw checksum is rotated right by 15 bits and offset by a fixed constant,
/// so that data which itself contains embedded checksums does not validate by accident.
pub fn masked_crc32c(buf: &[u8]) -> u32 {
    let crc = crc32c(buf);
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}
