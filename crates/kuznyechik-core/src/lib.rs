//! Reference Kuznyechik (GOST R 34.12-2015) implementation shared by the plain
//! and masked engines.
//!
//! This crate provides:
//! - The GF(2^8) multiplier table and the linear layer `L` built on it.
//! - The substitution layer, including the per-byte masked lookups.
//! - The key schedule and single-block encryption and decryption.
//! - Public types shared across the workspace.
//!
//! The implementation is table driven and runs a fixed, input-independent
//! number of steps, but it is not constant time: S-box and multiplier lookups
//! index memory with secret data. It should not be treated as side-channel
//! hardened.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod block;
mod cipher;
pub mod gf;
mod key;
pub mod linear;
pub mod round;
pub mod sbox;
mod schedule;

pub use crate::block::{xor_in_place, Block};
pub use crate::cipher::{decrypt_block, encrypt_block, Kuznyechik, FULL_ROUNDS};
pub use crate::key::{block_from_slice, InvalidLength, Key256, RoundKeys, ROUND_KEY_COUNT};
pub use crate::schedule::{expand_key, round_constant, ROUND_CONSTANTS};
