//! Multiplication by constants in GF(2^8) modulo `x^8 + x^7 + x^6 + x + 1`.
//!
//! The linear layer only ever multiplies by eight distinct field elements, so
//! the products are precomputed into an 8×256 table at compile time. Lookups
//! replace the bit-serial multiply on the hot path.

/// Low byte of the reduction polynomial `x^8 + x^7 + x^6 + x + 1` (0x1C3).
pub const POLYNOMIAL: u8 = 0xc3;

/// Field elements backing each table row: row `c` multiplies by `MULTIPLIERS[c]`.
pub const MULTIPLIERS: [u8; 8] = [1, 16, 32, 133, 148, 192, 194, 251];

/// Precomputed products, `GF_TABLE[c][x] = MULTIPLIERS[c] * x`.
pub static GF_TABLE: [[u8; 256]; 8] = build_table();

/// Field product of `a` and `b`.
pub const fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    let mut i = 0;
    while i < 8 {
        if b & 1 != 0 {
            product ^= a;
        }
        let hi_bit_set = a & 0x80;
        a <<= 1;
        if hi_bit_set != 0 {
            a ^= POLYNOMIAL;
        }
        b >>= 1;
        i += 1;
    }
    product
}

/// Multiplies `byte` by the coefficient stored in table row `row` (0..8).
#[inline(always)]
pub fn multiply(row: usize, byte: u8) -> u8 {
    GF_TABLE[row][byte as usize]
}

const fn build_table() -> [[u8; 256]; 8] {
    let mut table = [[0u8; 256]; 8];
    let mut row = 0;
    while row < MULTIPLIERS.len() {
        let mut x = 0;
        while x < 256 {
            table[row][x] = gf_mul(MULTIPLIERS[row], x as u8);
            x += 1;
        }
        row += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_zero_is_identity() {
        for x in 0..=255u8 {
            assert_eq!(multiply(0, x), x);
        }
    }

    #[test]
    fn table_matches_known_products() {
        // x^8 reduces to the low byte of the polynomial
        assert_eq!(gf_mul(2, 0x80), 0xc3);
        assert_eq!(multiply(1, 16), 195);
        let last_column: [u8; 8] = core::array::from_fn(|row| multiply(row, 255));
        assert_eq!(last_column, [255, 43, 86, 30, 202, 55, 10, 124]);
        let column_16: [u8; 8] = core::array::from_fn(|row| multiply(row, 16));
        assert_eq!(column_16, [16, 195, 69, 135, 84, 93, 125, 107]);
    }

    #[test]
    fn multiplication_commutes_and_distributes() {
        for a in (0..=255u8).step_by(7) {
            for b in 0..=255u8 {
                assert_eq!(gf_mul(a, b), gf_mul(b, a));
                assert_eq!(gf_mul(a, b ^ 0x5a), gf_mul(a, b) ^ gf_mul(a, 0x5a));
            }
        }
    }

    #[test]
    fn every_row_is_a_permutation() {
        for row in GF_TABLE.iter() {
            let mut seen = [false; 256];
            for &v in row.iter() {
                assert!(!seen[v as usize]);
                seen[v as usize] = true;
            }
        }
    }
}
