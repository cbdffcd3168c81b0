//! Masking configuration.

use crate::source::{ConfiguredMaskSource, PlaintextSeeded, RngMaskSource};

/// How per-invocation masks are produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaskingMode {
    /// Masks from a ChaCha20 CSPRNG.
    #[default]
    Secure,
    /// Masks seeded from three plaintext bytes, matching the evaluated firmware.
    PlaintextSeeded,
}

/// Configuration for the masked engine.
#[derive(Clone, Debug, Default)]
pub struct MaskingConfig {
    /// Mask generation mode.
    pub mode: MaskingMode,
    /// Optional seed for the secure generator, for reproducible runs. Ignored by
    /// [`MaskingMode::PlaintextSeeded`].
    pub seed: Option<u64>,
}

impl MaskingConfig {
    /// Builds the mask source described by this configuration.
    pub fn build_source(&self) -> ConfiguredMaskSource {
        match self.mode {
            MaskingMode::Secure => ConfiguredMaskSource::Secure(match self.seed {
                Some(seed) => RngMaskSource::seeded(seed),
                None => RngMaskSource::from_entropy(),
            }),
            MaskingMode::PlaintextSeeded => ConfiguredMaskSource::PlaintextSeeded(PlaintextSeeded),
        }
    }
}
