//! Table-driven CRC-32, one byte at a time.
//!
//! This is the reference algorithm every vector path is checked against, and
//! the engine that finishes whatever the folding engine leaves behind.

use crate::constants::REFLECTED_POLYNOMIAL;

/// CRC-32 lookup table (polynomial 0xEDB88320, reflected).
pub const TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ REFLECTED_POLYNOMIAL;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Advance the running CRC register over `data`.
///
/// `crc` is the raw register (no pre- or post-inversion happens here). An
/// empty slice returns `crc` unchanged.
#[inline]
pub fn update(mut crc: u32, data: &[u8]) -> u32 {
    for &byte in data {
        crc = TABLE[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc
}
