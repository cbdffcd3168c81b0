//! Kuznyechik block encryption/decryption and the keyed engine.

use core::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::block::Block;
use crate::key::{Key256, RoundKeys};
use crate::linear::{inverse_transform, transform};
use crate::round::{add_round_key, inv_sub_bytes, sub_bytes};
use crate::schedule::expand_key;

/// Number of full `LSX` rounds before the final key addition.
pub const FULL_ROUNDS: usize = 9;

/// Encrypts a single 16-byte block with pre-expanded round keys.
pub fn encrypt_block(block: &Block, round_keys: &RoundKeys) -> Block {
    let mut state = *block;

    for round in 0..FULL_ROUNDS {
        add_round_key(&mut state, round_keys.get(round));
        sub_bytes(&mut state);
        transform(&mut state);
    }
    add_round_key(&mut state, round_keys.get(FULL_ROUNDS));

    state
}

/// Decrypts a single 16-byte block with pre-expanded round keys.
pub fn decrypt_block(block: &Block, round_keys: &RoundKeys) -> Block {
    let mut state = *block;

    for round in (1..=FULL_ROUNDS).rev() {
        add_round_key(&mut state, round_keys.get(round));
        inverse_transform(&mut state);
        inv_sub_bytes(&mut state);
    }
    add_round_key(&mut state, round_keys.get(0));

    state
}

/// Kuznyechik (GOST R 34.12-2015) engine holding the expanded key.
///
/// Constructing the engine runs the key schedule, so a value of this type
/// never exposes stale or partially computed round keys. Re-keying takes
/// `&mut self` and therefore cannot overlap a cipher call on the same engine.
/// Round keys are wiped when the engine is dropped.
pub struct Kuznyechik {
    round_keys: RoundKeys,
}

impl Kuznyechik {
    /// Creates an engine for `key`.
    pub fn new(key: &Key256) -> Self {
        Self {
            round_keys: expand_key(key),
        }
    }

    /// Replaces the active key, recomputing every round key.
    pub fn set_key(&mut self, key: &Key256) {
        self.round_keys.zeroize();
        self.round_keys = expand_key(key);
    }

    /// Returns the expanded round keys.
    pub fn round_keys(&self) -> &RoundKeys {
        &self.round_keys
    }

    /// Encrypts `block` in place.
    #[inline]
    pub fn encrypt(&self, block: &mut Block) {
        *block = encrypt_block(block, &self.round_keys);
    }

    /// Decrypts `block` in place.
    #[inline]
    pub fn decrypt(&self, block: &mut Block) {
        *block = decrypt_block(block, &self.round_keys);
    }
}

impl Drop for Kuznyechik {
    fn drop(&mut self) {
        self.round_keys.zeroize();
    }
}

impl ZeroizeOnDrop for Kuznyechik {}

impl fmt::Debug for Kuznyechik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Kuznyechik { ... }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use proptest::prelude::*;
    use rand::RngCore;

    const STD_KEY: [u8; 32] =
        hex!("8899aabbccddeeff0011223344556677fedcba98765432100123456789abcdef");
    const STD_PLAIN: Block = hex!("1122334455667700ffeeddccbbaa9988");
    const STD_CIPHER: Block = hex!("7f679d90bebc24305a468d42b9d4edcd");

    #[test]
    fn encrypt_matches_standard_vector() {
        let round_keys = expand_key(&Key256::from(STD_KEY));
        assert_eq!(encrypt_block(&STD_PLAIN, &round_keys), STD_CIPHER);
    }

    #[test]
    fn decrypt_matches_standard_vector() {
        let round_keys = expand_key(&Key256::from(STD_KEY));
        assert_eq!(decrypt_block(&STD_CIPHER, &round_keys), STD_PLAIN);
    }

    #[test]
    fn engine_works_in_place() {
        let engine = Kuznyechik::new(&Key256::from(STD_KEY));
        let mut block = STD_PLAIN;
        engine.encrypt(&mut block);
        assert_eq!(block, STD_CIPHER);
        engine.decrypt(&mut block);
        assert_eq!(block, STD_PLAIN);
    }

    #[test]
    fn set_key_replaces_every_round_key() {
        let mut engine = Kuznyechik::new(&Key256::from([0u8; 32]));
        let before = *engine.round_keys();

        engine.set_key(&Key256::from(STD_KEY));
        assert_eq!(*engine.round_keys(), expand_key(&Key256::from(STD_KEY)));
        for round in 0..10 {
            assert_ne!(engine.round_keys().get(round), before.get(round));
        }

        let mut block = STD_PLAIN;
        engine.encrypt(&mut block);
        assert_eq!(block, STD_CIPHER);
    }

    #[test]
    fn encrypt_decrypt_round_trip_random() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let mut key_bytes = [0u8; 32];
            let mut block = [0u8; 16];
            rng.fill_bytes(&mut key_bytes);
            rng.fill_bytes(&mut block);
            let rks = expand_key(&Key256::from(key_bytes));
            let ct = encrypt_block(&block, &rks);
            let pt = decrypt_block(&ct, &rks);
            assert_eq!(pt, block);
        }
    }

    proptest! {
        #[test]
        fn engine_round_trip(key in any::<[u8; 32]>(), block in any::<[u8; 16]>()) {
            let engine = Kuznyechik::new(&Key256::from(key));
            let mut state = block;
            engine.encrypt(&mut state);
            engine.decrypt(&mut state);
            prop_assert_eq!(state, block);
        }
    }
}
