//! First-order masked Kuznyechik for side-channel evaluation.
//!
//! Every block is XORed with a fresh 16-byte mask before the rounds run.
//! Key addition commutes with the mask, the masked S-box lookups preserve
//! it, and the mask is pushed through the linear layer in lock step with the
//! state, so the final state unblinds to the ordinary ciphertext.
//!
//! The scheme is first order only and the lookups are not constant time.
//! With [`MaskingMode::PlaintextSeeded`] the mask is a public function of
//! three input bytes. Treat this crate as demonstration grade; it makes no
//! production side-channel claims.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cipher;
mod config;
pub mod leakage;
mod mask;
mod source;
mod trace;

pub use cipher::{cipher_rounds, inv_cipher_rounds, MaskedKuznyechik};
pub use config::{MaskingConfig, MaskingMode};
pub use mask::{blind, unblind, Mask, MaskedState};
pub use source::{
    seeded_chacha, ConfiguredMaskSource, MaskSource, MinStdRng, PlaintextSeeded, RngMaskSource,
};
pub use trace::{NoopObserver, RoundEvent, RoundObserver, TraceRecorder, TraceSample};
