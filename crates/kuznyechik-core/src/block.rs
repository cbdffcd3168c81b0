//! Block representation helpers.

/// Kuznyechik block of 16 bytes.
///
/// Byte 0 holds the most significant coefficient `a15` of the standard's
/// big-endian notation, so test vectors can be written left to right.
pub type Block = [u8; 16];

/// XORs two blocks, writing the result into `dst`.
#[inline]
pub fn xor_in_place(dst: &mut Block, rhs: &Block) {
    for (d, r) in dst.iter_mut().zip(rhs.iter()) {
        *d ^= *r;
    }
}
