//! Key types for Kuznyechik.

use core::fmt;

use thiserror::Error;
use zeroize::Zeroize;

use crate::block::Block;

/// Number of round keys produced by the key schedule.
pub const ROUND_KEY_COUNT: usize = 10;

/// Error returned when a byte slice has the wrong length for a key or block.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("expected {expected} bytes, got {actual}")]
pub struct InvalidLength {
    /// Required length in bytes.
    pub expected: usize,
    /// Length that was supplied.
    pub actual: usize,
}

/// 256-bit Kuznyechik key wrapper.
#[derive(Clone, Copy, PartialEq, Eq, Zeroize)]
pub struct Key256(pub [u8; 32]);

impl Key256 {
    /// Splits the key into the two halves used as the first two round keys.
    pub fn halves(&self) -> (Block, Block) {
        let mut first = [0u8; 16];
        let mut second = [0u8; 16];
        first.copy_from_slice(&self.0[..16]);
        second.copy_from_slice(&self.0[16..]);
        (first, second)
    }
}

impl From<[u8; 32]> for Key256 {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl TryFrom<&[u8]> for Key256 {
    type Error = InvalidLength;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let key: [u8; 32] = bytes.try_into().map_err(|_| InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(key))
    }
}

impl fmt::Debug for Key256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key256 { ... }")
    }
}

/// Expanded round keys for Kuznyechik.
#[derive(Clone, Copy, PartialEq, Eq, Zeroize)]
pub struct RoundKeys(pub [Block; ROUND_KEY_COUNT]);

impl fmt::Debug for RoundKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoundKeys { ... }")
    }
}

impl RoundKeys {
    /// Returns the round key at the requested index (0..=9).
    #[inline]
    pub fn get(&self, round: usize) -> &Block {
        &self.0[round]
    }
}

/// Parses a 16-byte block from a slice.
pub fn block_from_slice(bytes: &[u8]) -> Result<Block, InvalidLength> {
    bytes.try_into().map_err(|_| InvalidLength {
        expected: 16,
        actual: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_from_slice_checks_length() {
        let bytes = [7u8; 31];
        let err = Key256::try_from(&bytes[..]).unwrap_err();
        assert_eq!(err, InvalidLength { expected: 32, actual: 31 });
        assert_eq!(err.to_string(), "expected 32 bytes, got 31");

        let key = Key256::try_from(&[9u8; 32][..]).expect("32 bytes");
        assert_eq!(key.0, [9u8; 32]);
    }

    #[test]
    fn halves_split_in_order() {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let (first, second) = Key256::from(bytes).halves();
        assert_eq!(first[0], 0);
        assert_eq!(first[15], 15);
        assert_eq!(second[0], 16);
        assert_eq!(second[15], 31);
    }

    #[test]
    fn debug_does_not_print_key_material() {
        let key = Key256::from([0xabu8; 32]);
        assert_eq!(format!("{key:?}"), "Key256 { ... }");
        let round_keys = RoundKeys([[0xabu8; 16]; ROUND_KEY_COUNT]);
        assert_eq!(format!("{round_keys:?}"), "RoundKeys { ... }");
    }

    #[test]
    fn block_from_slice_rejects_short_input() {
        assert!(block_from_slice(&[0u8; 15]).is_err());
        assert_eq!(block_from_slice(&[1u8; 16]), Ok([1u8; 16]));
    }
}
