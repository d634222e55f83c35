//! Adler-32 checksum.
//!
//! Symbol hashes are computed once at intern time over the case-folded name
//! and stored in the symbol block, so table probes and GC rehashing never
//! touch the name bytes again.

const ADLER_MOD: u32 = 65521;

/// Computes the Adler-32 checksum of `bytes`.
pub fn adler32(bytes: &[u8]) -> u32 {
    let mut a: u32 = 1;
    let mut b: u32 = 0;
    for &byte in bytes {
        a = (a + u32::from(byte)) % ADLER_MOD;
        b = (b + a) % ADLER_MOD;
    }
    (b << 16) | a
}
