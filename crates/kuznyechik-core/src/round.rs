//! Kuznyechik round transformations.

use crate::block::{xor_in_place, Block};
use crate::sbox::{inv_sbox, masked_inv_sbox, masked_sbox, sbox};

/// Applies the substitution layer `S` to the state in place.
#[inline]
pub fn sub_bytes(state: &mut Block) {
    for byte in state.iter_mut() {
        *byte = sbox(*byte);
    }
}

/// Applies the inverse substitution layer `S⁻¹`.
#[inline]
pub fn inv_sub_bytes(state: &mut Block) {
    for byte in state.iter_mut() {
        *byte = inv_sbox(*byte);
    }
}

/// Applies `S` to a state blinded by `mask`, byte `i` using `mask[i]`.
///
/// The mask is not modified; the output remains blinded by it.
#[inline]
pub fn masked_sub_bytes(state: &mut Block, mask: &Block) {
    for (byte, &m) in state.iter_mut().zip(mask.iter()) {
        *byte = masked_sbox(*byte, m);
    }
}

/// Applies `S⁻¹` to a state blinded by `mask`.
#[inline]
pub fn masked_inv_sub_bytes(state: &mut Block, mask: &Block) {
    for (byte, &m) in state.iter_mut().zip(mask.iter()) {
        *byte = masked_inv_sbox(*byte, m);
    }
}

/// Adds (XORs) a round key into the state.
#[inline]
pub fn add_round_key(state: &mut Block, round_key: &Block) {
    xor_in_place(state, round_key);
}
