//! Mask values and the blinded state threaded through the masked round engine.

use kuznyechik_core::linear::{inverse_transform, transform};
use kuznyechik_core::round::{add_round_key, masked_inv_sub_bytes, masked_sub_bytes};
use kuznyechik_core::{xor_in_place, Block};
use core::fmt;

use zeroize::Zeroize;

/// 16-byte additive mask owned by a single cipher invocation.
#[derive(Clone, Copy, Default, PartialEq, Eq, Zeroize)]
pub struct Mask(pub Block);

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Mask { ... }")
    }
}

impl From<Block> for Mask {
    fn from(value: Block) -> Self {
        Self(value)
    }
}

/// Blinds `block` with `mask` in place.
#[inline]
pub fn blind(block: &mut Block, mask: &Mask) {
    xor_in_place(block, &mask.0);
}

/// Removes the blind. XOR is self-inverse, so this is the same operation as [`blind`].
#[inline]
pub fn unblind(block: &mut Block, mask: &Mask) {
    xor_in_place(block, &mask.0);
}

/// A blinded state together with the mask that blinds it.
///
/// Every operation keeps `state == real ^ mask` for the real intermediate
/// value `real`. The linear layer is applied to state and mask through
/// separate methods so the engine can schedule the two updates explicitly.
#[derive(Clone, Copy, PartialEq, Eq, Zeroize)]
pub struct MaskedState {
    /// Blinded state bytes.
    pub state: Block,
    /// Current mask.
    pub mask: Mask,
}

impl fmt::Debug for MaskedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MaskedState { ... }")
    }
}

impl MaskedState {
    /// Blinds `block` with `mask`.
    pub fn blind(mut block: Block, mask: Mask) -> Self {
        blind(&mut block, &mask);
        Self { state: block, mask }
    }

    /// Returns the real (unblinded) value without consuming the state.
    pub fn unmasked(&self) -> Block {
        let mut out = self.state;
        unblind(&mut out, &self.mask);
        out
    }

    /// XORs a round key into the state. The mask is unaffected.
    #[inline]
    pub fn add_round_key(&mut self, round_key: &Block) {
        add_round_key(&mut self.state, round_key);
    }

    /// Masked forward substitution using the current mask.
    #[inline]
    pub fn sub_bytes(&mut self) {
        masked_sub_bytes(&mut self.state, &self.mask.0);
    }

    /// Masked inverse substitution using the current mask.
    #[inline]
    pub fn inv_sub_bytes(&mut self) {
        masked_inv_sub_bytes(&mut self.state, &self.mask.0);
    }

    /// Applies `L` to the blinded state only.
    #[inline]
    pub fn transform_state(&mut self) {
        transform(&mut self.state);
    }

    /// Applies `L⁻¹` to the blinded state only.
    #[inline]
    pub fn inverse_transform_state(&mut self) {
        inverse_transform(&mut self.state);
    }

    /// Applies `L` to the mask only.
    #[inline]
    pub fn transform_mask(&mut self) {
        transform(&mut self.mask.0);
    }

    /// Applies `L⁻¹` to the mask only.
    #[inline]
    pub fn inverse_transform_mask(&mut self) {
        inverse_transform(&mut self.mask.0);
    }
}
