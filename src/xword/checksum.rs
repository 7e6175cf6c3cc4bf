//! The rolling 16-bit checksum used throughout the `.puz` format.
//!
//! The same primitive serves two purposes: structural checksums that
//! detect truncated or corrupted regions of a binary file, and the
//! scramble-verification checksum that lets a key be checked without
//! exposing the plain solution.

/// Runs the `.puz` checksum over `data`, continuing from `seed`.
///
/// # Algorithm
/// For each byte: if the low bit of the accumulator is set, rotate the
/// set bit to the top (`acc >> 1 | 0x8000`), otherwise shift right; then
/// add the byte with wrapping arithmetic.
///
/// Chaining: `cksum_region(b, cksum_region(a, 0))` checksums `a ++ b`.
pub fn cksum_region(data: &[u8], seed: u16) -> u16 {
    let mut cksum = seed;
    for &byte in data {
        if cksum & 1 != 0 {
            cksum = (cksum >> 1) + 0x8000;
        } else {
            cksum >>= 1;
        }
        cksum = cksum.wrapping_add(u16::from(byte));
    }
    cksum
}
