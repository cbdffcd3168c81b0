//! Kuznyechik linear layer `L` and its inverse.
//!
//! `L` is sixteen applications of the shift register step `R`. Both directions
//! take no parameters other than the block, so the masked engine reuses them
//! unchanged to advance its mask alongside the state.

use crate::block::Block;
use crate::gf::multiply;

/// Multiplier-table row applied to each input position by the combining step.
///
/// Corresponds to the coefficients `148, 32, 133, 16, 194, 192, 1, 251, 1, 192,
/// 194, 16, 133, 32, 148, 1` of the standard's linear function `ℓ`.
pub const L_ROWS: [usize; 16] = [4, 2, 3, 1, 6, 5, 0, 7, 0, 5, 6, 1, 3, 2, 4, 0];

#[inline(always)]
fn combine(block: &Block) -> u8 {
    let mut acc = 0u8;
    for (&byte, &row) in block.iter().zip(L_ROWS.iter()) {
        acc ^= multiply(row, byte);
    }
    acc
}

/// One step `R`: byte 0 becomes `ℓ(block)` and the remaining bytes shift up by one position.
#[inline]
pub fn step(block: &mut Block) {
    let head = combine(block);
    block.copy_within(0..15, 1);
    block[0] = head;
}

/// Inverse step `R⁻¹`: bytes shift down by one position and byte 15 becomes
/// `ℓ` of the rotated input `(b1, …, b15, b0)`.
#[inline]
pub fn inverse_step(block: &mut Block) {
    block.rotate_left(1);
    block[15] = combine(block);
}

/// Full linear transform `L = R^16`.
#[inline]
pub fn transform(block: &mut Block) {
    for _ in 0..16 {
        step(block);
    }
}

/// Inverse linear transform `L⁻¹ = (R⁻¹)^16`.
#[inline]
pub fn inverse_transform(block: &mut Block) {
    for _ in 0..16 {
        inverse_step(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::xor_in_place;
    use hex_literal::hex;
    use proptest::prelude::*;

    #[test]
    fn step_matches_standard_examples() {
        let mut block = hex!("00000000000000000000000000000100");
        step(&mut block);
        assert_eq!(block, hex!("94000000000000000000000000000001"));
        step(&mut block);
        assert_eq!(block, hex!("a5940000000000000000000000000000"));
    }

    #[test]
    fn transform_matches_standard_example() {
        let mut block = hex!("64a59400000000000000000000000000");
        transform(&mut block);
        assert_eq!(block, hex!("d456584dd0e3e84cc3166e4b7fa2890d"));
        inverse_transform(&mut block);
        assert_eq!(block, hex!("64a59400000000000000000000000000"));
    }

    #[test]
    fn inverse_step_undoes_step() {
        let mut block = hex!("0123456789abcdeffedcba9876543210");
        let original = block;
        step(&mut block);
        assert_ne!(block, original);
        inverse_step(&mut block);
        assert_eq!(block, original);
    }

    proptest! {
        #[test]
        fn inverse_transform_undoes_transform(block in any::<[u8; 16]>()) {
            let mut state = block;
            transform(&mut state);
            inverse_transform(&mut state);
            prop_assert_eq!(state, block);

            inverse_transform(&mut state);
            transform(&mut state);
            prop_assert_eq!(state, block);
        }

        #[test]
        fn transform_is_linear_over_xor(a in any::<[u8; 16]>(), b in any::<[u8; 16]>()) {
            let mut sum = a;
            xor_in_place(&mut sum, &b);
            transform(&mut sum);

            let mut la = a;
            let mut lb = b;
            transform(&mut la);
            transform(&mut lb);
            xor_in_place(&mut la, &lb);
            prop_assert_eq!(sum, la);
        }
    }
}
