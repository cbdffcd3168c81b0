//! Mask sources.
//!
//! A [`MaskSource`] produces the fresh mask for one cipher invocation. The
//! default [`RngMaskSource`] draws from a cryptographically secure generator.
//! [`PlaintextSeeded`] reproduces the firmware behavior this engine is
//! evaluated against: it seeds a minimal-standard LCG from three bytes of the
//! unblinded input, so anyone who observes those bytes can recompute the mask.
//! That mode is demonstration grade and exists only for side-channel
//! evaluation parity.

use core::fmt;

use kuznyechik_core::Block;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::mask::Mask;

/// Source of per-invocation masks.
pub trait MaskSource {
    /// Generates a mask for `block`, the unblinded input of the upcoming call.
    fn generate(&mut self, block: &Block) -> Mask;
}

impl<T: MaskSource + ?Sized> MaskSource for &mut T {
    fn generate(&mut self, block: &Block) -> Mask {
        (**self).generate(block)
    }
}

impl<T: MaskSource + ?Sized> MaskSource for Box<T> {
    fn generate(&mut self, block: &Block) -> Mask {
        (**self).generate(block)
    }
}

/// ChaCha20 seeded from a `u64`, zero-extended little endian to the full 32-byte seed.
///
/// Two generators built from the same value produce the same stream, so a
/// caller that also draws plaintexts must not reuse the seed for masks.
pub fn seeded_chacha(seed: u64) -> ChaCha20Rng {
    let mut seed_bytes = [0u8; 32];
    seed_bytes[..8].copy_from_slice(&seed.to_le_bytes());
    ChaCha20Rng::from_seed(seed_bytes)
}

/// Masks drawn from a cryptographically secure RNG; independent of the input.
#[derive(Clone)]
pub struct RngMaskSource<R: RngCore + CryptoRng> {
    rng: R,
}

impl<R: RngCore + CryptoRng> RngMaskSource<R> {
    /// Wraps `rng`.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Returns the wrapped RNG.
    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl RngMaskSource<ChaCha20Rng> {
    /// ChaCha20 seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(ChaCha20Rng::from_entropy())
    }

    /// ChaCha20 with a fixed seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self::new(seeded_chacha(seed))
    }
}

impl<R: RngCore + CryptoRng> fmt::Debug for RngMaskSource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RngMaskSource { ... }")
    }
}

impl Default for RngMaskSource<ChaCha20Rng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: RngCore + CryptoRng> MaskSource for RngMaskSource<R> {
    fn generate(&mut self, _block: &Block) -> Mask {
        let mut mask = Mask::default();
        self.rng.fill_bytes(&mut mask.0);
        mask
    }
}

/// Park–Miller "minimal standard" generator as shipped by the AVR C library's `rand()`.
///
/// Not cryptographically secure. Each draw is 15 bits (`0..=0x7fff`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MinStdRng {
    state: u32,
}

impl MinStdRng {
    const MODULUS: i64 = 0x7fff_ffff;
    const ZERO_SEED_REPLACEMENT: i64 = 123_459_876;

    /// Seeds the generator the way `srand(seed)` does.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Returns the next 15-bit draw.
    pub fn next_draw(&mut self) -> u16 {
        let mut x = i64::from(self.state);
        if x == 0 {
            x = Self::ZERO_SEED_REPLACEMENT;
        }
        // Schrage's method for 16807 * x mod (2^31 - 1)
        let hi = x / 127_773;
        let lo = x % 127_773;
        x = 16_807 * lo - 2_836 * hi;
        if x < 0 {
            x += Self::MODULUS;
        }
        self.state = x as u32;
        (x % 0x8000) as u16
    }
}

impl RngCore for MinStdRng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    /// Each output byte is the low byte of one draw, as the firmware truncates `rand()`.
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest.iter_mut() {
            *byte = self.next_draw() as u8;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Weak mask source seeded from `block[10] ^ block[11] ^ block[14]`.
///
/// Only 256 distinct masks exist and the one used is fully determined by
/// public input bytes. Side-channel resistance in this mode is
/// demonstration grade, not production grade.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaintextSeeded;

impl PlaintextSeeded {
    /// Seed the firmware derives from the unblinded block.
    pub fn seed_for(block: &Block) -> u8 {
        block[10] ^ block[11] ^ block[14]
    }
}

impl MaskSource for PlaintextSeeded {
    fn generate(&mut self, block: &Block) -> Mask {
        let mut rng = MinStdRng::new(u32::from(Self::seed_for(block)));
        let mut mask = Mask::default();
        rng.fill_bytes(&mut mask.0);
        mask
    }
}

/// Mask source selected at runtime from a [`crate::MaskingConfig`].
#[derive(Clone, Debug)]
pub enum ConfiguredMaskSource {
    /// CSPRNG-backed masks.
    Secure(RngMaskSource<ChaCha20Rng>),
    /// Firmware-parity weak masks.
    PlaintextSeeded(PlaintextSeeded),
}

impl MaskSource for ConfiguredMaskSource {
    fn generate(&mut self, block: &Block) -> Mask {
        match self {
            Self::Secure(source) => source.generate(block),
            Self::PlaintextSeeded(source) => source.generate(block),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn min_std_matches_reference_sequence() {
        let mut rng = MinStdRng::new(1);
        assert_eq!(rng.next_draw(), 16807);
        assert_eq!(rng.next_draw(), 15089);
        assert_eq!(rng.next_draw(), 11481);
    }

    #[test]
    fn min_std_replaces_zero_seed() {
        let mut rng = MinStdRng::new(0);
        assert_eq!(rng.next_draw(), 20034);
        assert_eq!(rng.next_draw(), 24315);
    }

    #[test]
    fn plaintext_seeded_mask_is_reproducible() {
        let block = hex!("1122334455667700ffeeddccbbaa9988");
        assert_eq!(PlaintextSeeded::seed_for(&block), 0x88);
        let mask = PlaintextSeeded.generate(&block);
        assert_eq!(mask.0, hex!("b819ae8e585dc64cf467f46ed1141f00"));
        assert_eq!(PlaintextSeeded.generate(&block), mask);
    }

    #[test]
    fn plaintext_seeded_depends_only_on_seed_bytes() {
        let a = hex!("1122334455667700ffeeddccbbaa9988");
        let mut b = a;
        b[0] ^= 0xff;
        b[15] ^= 0x01;
        assert_eq!(PlaintextSeeded.generate(&a), PlaintextSeeded.generate(&b));

        b[10] ^= 0x01;
        assert_ne!(PlaintextSeeded.generate(&a), PlaintextSeeded.generate(&b));
    }

    #[test]
    fn rng_source_ignores_input_and_varies_per_call() {
        let mut source = RngMaskSource::seeded(7);
        let block = [0u8; 16];
        let first = source.generate(&block);
        let second = source.generate(&block);
        assert_ne!(first, second);

        let mut replay = RngMaskSource::seeded(7);
        assert_eq!(replay.generate(&[0xffu8; 16]), first);
    }

    #[test]
    fn seeded_source_draws_from_seeded_chacha() {
        let mut rng = seeded_chacha(7);
        let mut expected = [0u8; 16];
        rng.fill_bytes(&mut expected);
        assert_eq!(RngMaskSource::seeded(7).generate(&[0u8; 16]).0, expected);
        assert_eq!(format!("{:?}", RngMaskSource::seeded(7)), "RngMaskSource { ... }");
    }
}
