//! Round observers for capturing intermediate masked values.
//!
//! The masked engine reports every layer it applies to an observer. The
//! default [`NoopObserver`] compiles away; [`TraceRecorder`] keeps a copy of
//! the blinded state and mask at each point, which is what a power or EM
//! measurement would see on the device.

use kuznyechik_core::Block;

use crate::mask::MaskedState;

/// Layer of the masked engine that just completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundEvent {
    /// Input blinded with a fresh mask.
    Blinded,
    /// Round key `n` added.
    AddRoundKey(usize),
    /// Masked (inverse) substitution in the round using key `n`.
    Substitution(usize),
    /// Linear layer (or its inverse) applied to the state in the round using key `n`.
    LinearState(usize),
    /// Linear layer (or its inverse) applied to the mask in the round using key `n`.
    LinearMask(usize),
}

/// Receives the blinded state after each layer.
pub trait RoundObserver {
    /// Called after `event` with the current blinded state.
    fn observe(&mut self, event: RoundEvent, state: &MaskedState);
}

/// Observer that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl RoundObserver for NoopObserver {
    #[inline(always)]
    fn observe(&mut self, _event: RoundEvent, _state: &MaskedState) {}
}

/// One recorded intermediate value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceSample {
    /// Layer that produced the value.
    pub event: RoundEvent,
    /// Blinded state after the layer.
    pub state: Block,
    /// Mask after the layer.
    pub mask: Block,
}

/// Records every intermediate value of one or more invocations.
#[derive(Clone, Debug, Default)]
pub struct TraceRecorder {
    samples: Vec<TraceSample>,
}

impl TraceRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded samples in order.
    pub fn samples(&self) -> &[TraceSample] {
        &self.samples
    }

    /// Blinded states in order; the values a leakage model would be applied to.
    pub fn states(&self) -> impl Iterator<Item = &Block> + '_ {
        self.samples.iter().map(|sample| &sample.state)
    }

    /// Drops all recorded samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl RoundObserver for TraceRecorder {
    fn observe(&mut self, event: RoundEvent, state: &MaskedState) {
        self.samples.push(TraceSample {
            event,
            state: state.state,
            mask: state.mask.0,
        });
    }
}
