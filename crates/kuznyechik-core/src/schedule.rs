//! Kuznyechik key schedule.
//!
//! The master key halves are fed through a Feistel network whose round
//! function is `LSX[C_i]`; every eight Feistel rounds emit the next pair of
//! round keys.

use crate::block::{xor_in_place, Block};
use crate::key::{Key256, RoundKeys, ROUND_KEY_COUNT};
use crate::linear::transform;
use crate::round::sub_bytes;

/// Feistel rounds between two emitted round-key pairs.
const FEISTEL_ROUNDS_PER_PAIR: usize = 8;

/// Iteration constants `C_1..C_32`, `C_i = L(vec(i))`.
pub const ROUND_CONSTANTS: [Block; 32] = [
    [
        0x6e, 0xa2, 0x76, 0x72, 0x6c, 0x48, 0x7a, 0xb8,
        0x5d, 0x27, 0xbd, 0x10, 0xdd, 0x84, 0x94, 0x01,
    ],
    [
        0xdc, 0x87, 0xec, 0xe4, 0xd8, 0x90, 0xf4, 0xb3,
        0xba, 0x4e, 0xb9, 0x20, 0x79, 0xcb, 0xeb, 0x02,
    ],
    [
        0xb2, 0x25, 0x9a, 0x96, 0xb4, 0xd8, 0x8e, 0x0b,
        0xe7, 0x69, 0x04, 0x30, 0xa4, 0x4f, 0x7f, 0x03,
    ],
    [
        0x7b, 0xcd, 0x1b, 0x0b, 0x73, 0xe3, 0x2b, 0xa5,
        0xb7, 0x9c, 0xb1, 0x40, 0xf2, 0x55, 0x15, 0x04,
    ],
    [
        0x15, 0x6f, 0x6d, 0x79, 0x1f, 0xab, 0x51, 0x1d,
        0xea, 0xbb, 0x0c, 0x50, 0x2f, 0xd1, 0x81, 0x05,
    ],
    [
        0xa7, 0x4a, 0xf7, 0xef, 0xab, 0x73, 0xdf, 0x16,
        0x0d, 0xd2, 0x08, 0x60, 0x8b, 0x9e, 0xfe, 0x06,
    ],
    [
        0xc9, 0xe8, 0x81, 0x9d, 0xc7, 0x3b, 0xa5, 0xae,
        0x50, 0xf5, 0xb5, 0x70, 0x56, 0x1a, 0x6a, 0x07,
    ],
    [
        0xf6, 0x59, 0x36, 0x16, 0xe6, 0x05, 0x56, 0x89,
        0xad, 0xfb, 0xa1, 0x80, 0x27, 0xaa, 0x2a, 0x08,
    ],
    [
        0x98, 0xfb, 0x40, 0x64, 0x8a, 0x4d, 0x2c, 0x31,
        0xf0, 0xdc, 0x1c, 0x90, 0xfa, 0x2e, 0xbe, 0x09,
    ],
    [
        0x2a, 0xde, 0xda, 0xf2, 0x3e, 0x95, 0xa2, 0x3a,
        0x17, 0xb5, 0x18, 0xa0, 0x5e, 0x61, 0xc1, 0x0a,
    ],
    [
        0x44, 0x7c, 0xac, 0x80, 0x52, 0xdd, 0xd8, 0x82,
        0x4a, 0x92, 0xa5, 0xb0, 0x83, 0xe5, 0x55, 0x0b,
    ],
    [
        0x8d, 0x94, 0x2d, 0x1d, 0x95, 0xe6, 0x7d, 0x2c,
        0x1a, 0x67, 0x10, 0xc0, 0xd5, 0xff, 0x3f, 0x0c,
    ],
    [
        0xe3, 0x36, 0x5b, 0x6f, 0xf9, 0xae, 0x07, 0x94,
        0x47, 0x40, 0xad, 0xd0, 0x08, 0x7b, 0xab, 0x0d,
    ],
    [
        0x51, 0x13, 0xc1, 0xf9, 0x4d, 0x76, 0x89, 0x9f,
        0xa0, 0x29, 0xa9, 0xe0, 0xac, 0x34, 0xd4, 0x0e,
    ],
    [
        0x3f, 0xb1, 0xb7, 0x8b, 0x21, 0x3e, 0xf3, 0x27,
        0xfd, 0x0e, 0x14, 0xf0, 0x71, 0xb0, 0x40, 0x0f,
    ],
    [
        0x2f, 0xb2, 0x6c, 0x2c, 0x0f, 0x0a, 0xac, 0xd1,
        0x99, 0x35, 0x81, 0xc3, 0x4e, 0x97, 0x54, 0x10,
    ],
    [
        0x41, 0x10, 0x1a, 0x5e, 0x63, 0x42, 0xd6, 0x69,
        0xc4, 0x12, 0x3c, 0xd3, 0x93, 0x13, 0xc0, 0x11,
    ],
    [
        0xf3, 0x35, 0x80, 0xc8, 0xd7, 0x9a, 0x58, 0x62,
        0x23, 0x7b, 0x38, 0xe3, 0x37, 0x5c, 0xbf, 0x12,
    ],
    [
        0x9d, 0x97, 0xf6, 0xba, 0xbb, 0xd2, 0x22, 0xda,
        0x7e, 0x5c, 0x85, 0xf3, 0xea, 0xd8, 0x2b, 0x13,
    ],
    [
        0x54, 0x7f, 0x77, 0x27, 0x7c, 0xe9, 0x87, 0x74,
        0x2e, 0xa9, 0x30, 0x83, 0xbc, 0xc2, 0x41, 0x14,
    ],
    [
        0x3a, 0xdd, 0x01, 0x55, 0x10, 0xa1, 0xfd, 0xcc,
        0x73, 0x8e, 0x8d, 0x93, 0x61, 0x46, 0xd5, 0x15,
    ],
    [
        0x88, 0xf8, 0x9b, 0xc3, 0xa4, 0x79, 0x73, 0xc7,
        0x94, 0xe7, 0x89, 0xa3, 0xc5, 0x09, 0xaa, 0x16,
    ],
    [
        0xe6, 0x5a, 0xed, 0xb1, 0xc8, 0x31, 0x09, 0x7f,
        0xc9, 0xc0, 0x34, 0xb3, 0x18, 0x8d, 0x3e, 0x17,
    ],
    [
        0xd9, 0xeb, 0x5a, 0x3a, 0xe9, 0x0f, 0xfa, 0x58,
        0x34, 0xce, 0x20, 0x43, 0x69, 0x3d, 0x7e, 0x18,
    ],
    [
        0xb7, 0x49, 0x2c, 0x48, 0x85, 0x47, 0x80, 0xe0,
        0x69, 0xe9, 0x9d, 0x53, 0xb4, 0xb9, 0xea, 0x19,
    ],
    [
        0x05, 0x6c, 0xb6, 0xde, 0x31, 0x9f, 0x0e, 0xeb,
        0x8e, 0x80, 0x99, 0x63, 0x10, 0xf6, 0x95, 0x1a,
    ],
    [
        0x6b, 0xce, 0xc0, 0xac, 0x5d, 0xd7, 0x74, 0x53,
        0xd3, 0xa7, 0x24, 0x73, 0xcd, 0x72, 0x01, 0x1b,
    ],
    [
        0xa2, 0x26, 0x41, 0x31, 0x9a, 0xec, 0xd1, 0xfd,
        0x83, 0x52, 0x91, 0x03, 0x9b, 0x68, 0x6b, 0x1c,
    ],
    [
        0xcc, 0x84, 0x37, 0x43, 0xf6, 0xa4, 0xab, 0x45,
        0xde, 0x75, 0x2c, 0x13, 0x46, 0xec, 0xff, 0x1d,
    ],
    [
        0x7e, 0xa1, 0xad, 0xd5, 0x42, 0x7c, 0x25, 0x4e,
        0x39, 0x1c, 0x28, 0x23, 0xe2, 0xa3, 0x80, 0x1e,
    ],
    [
        0x10, 0x03, 0xdb, 0xa7, 0x2e, 0x34, 0x5f, 0xf6,
        0x64, 0x3b, 0x95, 0x33, 0x3f, 0x27, 0x14, 0x1f,
    ],
    [
        0x5e, 0xa7, 0xd8, 0x58, 0x1e, 0x14, 0x9b, 0x61,
        0xf1, 0x6a, 0xc1, 0x45, 0x9c, 0xed, 0xa8, 0x20,
    ],
];

/// Derives the iteration constant `C_index` (1-based) from scratch.
pub fn round_constant(index: u8) -> Block {
    let mut c = [0u8; 16];
    c[15] = index;
    transform(&mut c);
    c
}

/// One Feistel round: `(a, b) -> (L(S(a ^ c)) ^ b, a)`.
fn feistel_round(a: &mut Block, b: &mut Block, constant: &Block) {
    let mut work = *a;
    xor_in_place(&mut work, constant);
    sub_bytes(&mut work);
    transform(&mut work);
    xor_in_place(&mut work, b);
    *b = *a;
    *a = work;
}

/// Expands a 256-bit key into 10 round keys.
pub fn expand_key(key: &Key256) -> RoundKeys {
    let (mut a, mut b) = key.halves();
    let mut round_keys = [[0u8; 16]; ROUND_KEY_COUNT];
    round_keys[0] = a;
    round_keys[1] = b;

    let mut constants = ROUND_CONSTANTS.iter();
    for pair in 1..ROUND_KEY_COUNT / 2 {
        for constant in constants.by_ref().take(FEISTEL_ROUNDS_PER_PAIR) {
            feistel_round(&mut a, &mut b, constant);
        }
        round_keys[2 * pair] = a;
        round_keys[2 * pair + 1] = b;
    }
    debug_assert!(constants.next().is_none());

    RoundKeys(round_keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    const KEY: [u8; 32] =
        hex!("8899aabbccddeeff0011223344556677fedcba98765432100123456789abcdef");

    #[test]
    fn constants_table_matches_derivation() {
        for (i, constant) in ROUND_CONSTANTS.iter().enumerate() {
            assert_eq!(*constant, round_constant(i as u8 + 1), "C_{}", i + 1);
        }
    }

    #[test]
    fn expands_standard_key() {
        let round_keys = expand_key(&Key256::from(KEY));
        let expected = [
            hex!("8899aabbccddeeff0011223344556677"),
            hex!("fedcba98765432100123456789abcdef"),
            hex!("db31485315694343228d6aef8cc78c44"),
            hex!("3d4553d8e9cfec6815ebadc40a9ffd04"),
            hex!("57646468c44a5e28d3e59246f429f1ac"),
            hex!("bd079435165c6432b532e82834da581b"),
            hex!("51e640757e8745de705727265a0098b1"),
            hex!("5a7925017b9fdd3ed72a91a22286f984"),
            hex!("bb44e25378c73123a5f32f73cdb6e517"),
            hex!("72e9dd7416bcf45b755dbaa88e4a4043"),
        ];
        assert_eq!(round_keys.0, expected);
    }

    #[test]
    fn schedule_is_deterministic_and_key_dependent() {
        let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
        for _ in 0..16 {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            let key = Key256::from(bytes);
            assert_eq!(expand_key(&key), expand_key(&key));

            bytes[31] ^= 1;
            let other = expand_key(&Key256::from(bytes));
            assert_ne!(expand_key(&key).get(9), other.get(9));
        }
    }
}
