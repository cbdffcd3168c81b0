//! Masked round engine and the keyed masked cipher.

use kuznyechik_core::{Block, Key256, Kuznyechik, RoundKeys, FULL_ROUNDS};
use zeroize::Zeroize;

use crate::config::MaskingConfig;
use crate::mask::{Mask, MaskedState};
use crate::source::{ConfiguredMaskSource, MaskSource};
use crate::trace::{NoopObserver, RoundEvent, RoundObserver};

/// Runs the forward rounds on a blinded state.
///
/// On return `state.unmasked()` is the ciphertext and `state.mask` is the
/// mask after nine applications of `L`.
pub fn cipher_rounds<O: RoundObserver + ?Sized>(
    state: &mut MaskedState,
    round_keys: &RoundKeys,
    observer: &mut O,
) {
    for round in 0..FULL_ROUNDS {
        state.add_round_key(round_keys.get(round));
        observer.observe(RoundEvent::AddRoundKey(round), state);
        state.sub_bytes();
        observer.observe(RoundEvent::Substitution(round), state);
        state.transform_state();
        observer.observe(RoundEvent::LinearState(round), state);
        state.transform_mask();
        observer.observe(RoundEvent::LinearMask(round), state);
    }
    state.add_round_key(round_keys.get(FULL_ROUNDS));
    observer.observe(RoundEvent::AddRoundKey(FULL_ROUNDS), state);
}

/// Runs the inverse rounds on a blinded state.
///
/// The mask is moved through `L⁻¹` before the round key is added. The order
/// must match the state's path: `S⁻¹` has to see the mask that blinds its
/// input.
pub fn inv_cipher_rounds<O: RoundObserver + ?Sized>(
    state: &mut MaskedState,
    round_keys: &RoundKeys,
    observer: &mut O,
) {
    for round in (1..=FULL_ROUNDS).rev() {
        state.inverse_transform_mask();
        observer.observe(RoundEvent::LinearMask(round), state);
        state.add_round_key(round_keys.get(round));
        observer.observe(RoundEvent::AddRoundKey(round), state);
        state.inverse_transform_state();
        observer.observe(RoundEvent::LinearState(round), state);
        state.inv_sub_bytes();
        observer.observe(RoundEvent::Substitution(round), state);
    }
    state.add_round_key(round_keys.get(0));
    observer.observe(RoundEvent::AddRoundKey(0), state);
}

/// Kuznyechik engine that blinds every block with a fresh first-order mask.
///
/// Inputs and outputs are identical to [`Kuznyechik`]; only the intermediate
/// values differ. Each call draws its own [`Mask`] from the source and wipes
/// it before returning, so concurrent engines never share a mask.
#[derive(Debug)]
pub struct MaskedKuznyechik<S: MaskSource = ConfiguredMaskSource> {
    engine: Kuznyechik,
    source: S,
}

impl<S: MaskSource> MaskedKuznyechik<S> {
    /// Creates a masked engine for `key` drawing masks from `source`.
    pub fn new(key: &Key256, source: S) -> Self {
        Self {
            engine: Kuznyechik::new(key),
            source,
        }
    }

    /// Replaces the active key, recomputing every round key.
    pub fn set_key(&mut self, key: &Key256) {
        self.engine.set_key(key);
    }

    /// Returns the expanded round keys.
    pub fn round_keys(&self) -> &RoundKeys {
        self.engine.round_keys()
    }

    /// Returns the mask source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Encrypts `block` in place.
    pub fn encrypt(&mut self, block: &mut Block) {
        self.encrypt_traced(block, &mut NoopObserver);
    }

    /// Decrypts `block` in place.
    pub fn decrypt(&mut self, block: &mut Block) {
        self.decrypt_traced(block, &mut NoopObserver);
    }

    /// Encrypts `block` in place, reporting each intermediate value to `observer`.
    pub fn encrypt_traced<O: RoundObserver + ?Sized>(
        &mut self,
        block: &mut Block,
        observer: &mut O,
    ) {
        let mut state = self.blind(block, observer);
        cipher_rounds(&mut state, self.engine.round_keys(), observer);
        *block = state.unmasked();
        state.zeroize();
    }

    /// Decrypts `block` in place, reporting each intermediate value to `observer`.
    pub fn decrypt_traced<O: RoundObserver + ?Sized>(
        &mut self,
        block: &mut Block,
        observer: &mut O,
    ) {
        let mut state = self.blind(block, observer);
        inv_cipher_rounds(&mut state, self.engine.round_keys(), observer);
        *block = state.unmasked();
        state.zeroize();
    }

    fn blind<O: RoundObserver + ?Sized>(
        &mut self,
        block: &Block,
        observer: &mut O,
    ) -> MaskedState {
        let mask = self.source.generate(block);
        let state = MaskedState::blind(*block, mask);
        observer.observe(RoundEvent::Blinded, &state);
        state
    }
}

impl MaskedKuznyechik<ConfiguredMaskSource> {
    /// Creates a masked engine whose mask source is described by `config`.
    pub fn with_config(key: &Key256, config: &MaskingConfig) -> Self {
        Self::new(key, config.build_source())
    }
}
