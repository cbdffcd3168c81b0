//! Simulated power analysis against the last round key.
//!
//! Traces are built from [`TraceSample`]s by taking the Hamming weight of
//! every blinded state byte, the usual first-order model of a device
//! register. [`CpaCampaign`] correlates those traces with the hypothesis
//! `HW(ciphertext[b] ^ guess)`, the value held just before the final key
//! addition, and reports the strongest correlation per guess. Without
//! masking the correct byte of `K10` correlates perfectly; with fresh masks
//! the blinded state is independent of the hypothesis.

use kuznyechik_core::{Block, RoundKeys};
use thiserror::Error;

use crate::cipher::cipher_rounds;
use crate::mask::{Mask, MaskedState};
use crate::trace::{RoundEvent, RoundObserver, TraceSample};

/// Number of hypotheses per key byte.
pub const KEY_GUESSES: usize = 256;

/// Errors raised while building or analysing a campaign.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LeakageError {
    /// A trace does not have the same number of points as the first one.
    #[error("trace has {actual} points, campaign expects {expected}")]
    TraceLength {
        /// Points per trace fixed by the first trace.
        expected: usize,
        /// Points in the rejected trace.
        actual: usize,
    },
    /// Correlation needs at least two traces.
    #[error("need at least 2 traces, got {0}")]
    NotEnoughTraces(usize),
}

/// Number of set bits in `byte`.
#[inline]
pub fn hamming_weight(byte: u8) -> u32 {
    byte.count_ones()
}

/// Simulated leakage of `samples`: one point per blinded state byte.
pub fn hamming_weight_trace(samples: &[TraceSample]) -> Vec<f64> {
    samples
        .iter()
        .flat_map(|sample| sample.state.iter().map(|&b| f64::from(hamming_weight(b))))
        .collect()
}

/// Runs the unprotected rounds under `observer` and returns the ciphertext.
///
/// The state is "blinded" with the all-zero mask, so the observer sees the
/// real intermediate values at the same events, and in the same order, as a
/// masked encryption.
pub fn trace_unmasked<O: RoundObserver + ?Sized>(
    block: &Block,
    round_keys: &RoundKeys,
    observer: &mut O,
) -> Block {
    let mut state = MaskedState::blind(*block, Mask::default());
    observer.observe(RoundEvent::Blinded, &state);
    cipher_rounds(&mut state, round_keys, observer);
    state.unmasked()
}

/// Correlation results for one key byte.
#[derive(Clone, Debug)]
pub struct ByteReport {
    peaks: Vec<f64>,
}

impl ByteReport {
    /// Largest absolute correlation over all trace points for `guess`.
    pub fn peak(&self, guess: u8) -> f64 {
        self.peaks[usize::from(guess)]
    }

    /// Guess with the highest peak; the lowest value wins ties.
    pub fn best_guess(&self) -> u8 {
        let mut best = 0;
        for (guess, &peak) in self.peaks.iter().enumerate() {
            if peak > self.peaks[best] {
                best = guess;
            }
        }
        best as u8
    }

    /// Position of `guess` when guesses are ordered by descending peak.
    ///
    /// Zero means the attack ranks `guess` first. In the Hamming-weight model
    /// `guess ^ 0xff` is anti-correlated with the same magnitude, so a fully
    /// recovered byte ranks 0 or 1.
    pub fn rank(&self, guess: u8) -> usize {
        let index = usize::from(guess);
        let target = self.peaks[index];
        self.peaks
            .iter()
            .enumerate()
            .filter(|&(other, &peak)| peak > target || (peak == target && other < index))
            .count()
    }
}

/// Correlation results for all sixteen bytes of the last round key.
#[derive(Clone, Debug)]
pub struct CpaReport {
    bytes: Vec<ByteReport>,
}

impl CpaReport {
    /// Per-byte results, in key byte order.
    pub fn bytes(&self) -> &[ByteReport] {
        &self.bytes
    }

    /// Best guess for every byte.
    pub fn best_key(&self) -> Block {
        let mut key = [0u8; 16];
        for (byte, report) in key.iter_mut().zip(&self.bytes) {
            *byte = report.best_guess();
        }
        key
    }

    /// Partial guessing entropy: the rank of each byte of the known key.
    pub fn guessing_entropy(&self, known: &Block) -> [usize; 16] {
        let mut ranks = [0usize; 16];
        for ((rank, report), &byte) in ranks.iter_mut().zip(&self.bytes).zip(known) {
            *rank = report.rank(byte);
        }
        ranks
    }
}

/// Ciphertexts and their leakage traces, collected for a correlation attack.
#[derive(Clone, Debug, Default)]
pub struct CpaCampaign {
    ciphertexts: Vec<Block>,
    traces: Vec<Vec<f64>>,
}

impl CpaCampaign {
    /// Creates an empty campaign.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded traces.
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Whether no trace has been recorded.
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Adds one encryption. Every trace must have as many points as the first.
    pub fn push(&mut self, ciphertext: Block, trace: Vec<f64>) -> Result<(), LeakageError> {
        if let Some(first) = self.traces.first() {
            if first.len() != trace.len() {
                return Err(LeakageError::TraceLength {
                    expected: first.len(),
                    actual: trace.len(),
                });
            }
        }
        self.ciphertexts.push(ciphertext);
        self.traces.push(trace);
        Ok(())
    }

    /// Correlates every key-byte guess against every trace point.
    pub fn analyze(&self) -> Result<CpaReport, LeakageError> {
        let count = self.traces.len();
        if count < 2 {
            return Err(LeakageError::NotEnoughTraces(count));
        }
        let points = self.traces[0].len();

        let mut mean = vec![0.0f64; points];
        for trace in &self.traces {
            for (m, x) in mean.iter_mut().zip(trace) {
                *m += x;
            }
        }
        for m in &mut mean {
            *m /= count as f64;
        }

        let mut spread = vec![0.0f64; points];
        for trace in &self.traces {
            for ((s, x), m) in spread.iter_mut().zip(trace).zip(&mean) {
                let d = x - m;
                *s += d * d;
            }
        }

        let bytes = (0..16)
            .map(|byte| self.analyze_byte(byte, &mean, &spread))
            .collect();
        Ok(CpaReport { bytes })
    }

    fn analyze_byte(&self, byte: usize, mean: &[f64], spread: &[f64]) -> ByteReport {
        let points = mean.len();

        // The hypothesis only depends on the ciphertext byte, so centred
        // traces are summed per byte value once and reused for every guess.
        let mut counts = [0usize; 256];
        let mut grouped = vec![0.0f64; 256 * points];
        for (ciphertext, trace) in self.ciphertexts.iter().zip(&self.traces) {
            let value = usize::from(ciphertext[byte]);
            counts[value] += 1;
            let row = &mut grouped[value * points..(value + 1) * points];
            for ((g, x), m) in row.iter_mut().zip(trace).zip(mean) {
                *g += x - m;
            }
        }

        let total = self.traces.len() as f64;
        let mut peaks = vec![0.0f64; KEY_GUESSES];
        let mut numerator = vec![0.0f64; points];
        for (guess, peak) in peaks.iter_mut().enumerate() {
            let hypothesis = |value: usize| f64::from(hamming_weight((value ^ guess) as u8));
            let mean_h = (0..256)
                .map(|value| counts[value] as f64 * hypothesis(value))
                .sum::<f64>()
                / total;
            let spread_h: f64 = (0..256)
                .map(|value| {
                    let d = hypothesis(value) - mean_h;
                    counts[value] as f64 * d * d
                })
                .sum();

            numerator.iter_mut().for_each(|n| *n = 0.0);
            for value in (0..256).filter(|&value| counts[value] > 0) {
                let h = hypothesis(value) - mean_h;
                let row = &grouped[value * points..(value + 1) * points];
                for (n, g) in numerator.iter_mut().zip(row) {
                    *n += h * g;
                }
            }

            *peak = numerator
                .iter()
                .zip(spread)
                .map(|(n, s)| {
                    let den = (spread_h * s).sqrt();
                    if den > 0.0 {
                        (n / den).abs()
                    } else {
                        0.0
                    }
                })
                .fold(0.0, f64::max);
        }

        ByteReport { peaks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::MaskedKuznyechik;
    use crate::source::RngMaskSource;
    use crate::trace::TraceRecorder;
    use hex_literal::hex;
    use kuznyechik_core::{encrypt_block, expand_key, Key256, FULL_ROUNDS};
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    const STD_KEY: [u8; 32] =
        hex!("8899aabbccddeeff0011223344556677fedcba98765432100123456789abcdef");

    // Final round: AddRoundKey(8) through AddRoundKey(9).
    const WINDOW: usize = 5;

    fn record<F>(count: usize, mut encrypt: F) -> CpaCampaign
    where
        F: FnMut(&mut Block, &mut TraceRecorder),
    {
        let mut rng = ChaCha20Rng::from_seed([9u8; 32]);
        let mut recorder = TraceRecorder::new();
        let mut campaign = CpaCampaign::new();
        for _ in 0..count {
            let mut block = [0u8; 16];
            rng.fill_bytes(&mut block);
            recorder.clear();
            encrypt(&mut block, &mut recorder);
            let samples = recorder.samples();
            let trace = hamming_weight_trace(&samples[samples.len() - WINDOW..]);
            campaign.push(block, trace).unwrap();
        }
        campaign
    }

    #[test]
    fn hamming_weight_trace_has_one_point_per_byte() {
        let mut recorder = TraceRecorder::new();
        let round_keys = expand_key(&Key256::from(STD_KEY));
        trace_unmasked(&[0xffu8; 16], &round_keys, &mut recorder);

        let trace = hamming_weight_trace(recorder.samples());
        assert_eq!(trace.len(), recorder.samples().len() * 16);
        assert!(trace[..16].iter().all(|&p| p == 8.0));
    }

    #[test]
    fn unmasked_trace_produces_ciphertext() {
        let round_keys = expand_key(&Key256::from(STD_KEY));
        let plain = hex!("1122334455667700ffeeddccbbaa9988");
        let mut recorder = TraceRecorder::new();
        let cipher = trace_unmasked(&plain, &round_keys, &mut recorder);
        assert_eq!(cipher, encrypt_block(&plain, &round_keys));
        assert_eq!(recorder.samples().len(), 2 + 4 * FULL_ROUNDS);
    }

    #[test]
    fn unmasked_rounds_leak_last_round_key() {
        let round_keys = expand_key(&Key256::from(STD_KEY));
        let campaign = record(200, |block, recorder| {
            *block = trace_unmasked(block, &round_keys, recorder);
        });
        let report = campaign.analyze().unwrap();

        let last = *round_keys.get(FULL_ROUNDS);
        for (byte_report, &byte) in report.bytes().iter().zip(&last) {
            assert!(byte_report.peak(byte) > 0.99);
            assert!(byte_report.rank(byte) <= 1);
        }
        assert!(report.guessing_entropy(&last).iter().all(|&rank| rank <= 1));
    }

    #[test]
    fn fresh_masks_hide_last_round_key() {
        let key = Key256::from(STD_KEY);
        let mut engine = MaskedKuznyechik::new(&key, RngMaskSource::seeded(3));
        let campaign = record(400, |block, recorder| engine.encrypt_traced(block, recorder));
        let report = campaign.analyze().unwrap();

        let last = *engine.round_keys().get(FULL_ROUNDS);
        for (byte_report, &byte) in report.bytes().iter().zip(&last) {
            assert!(byte_report.peak(byte) < 0.35);
        }
    }

    #[test]
    fn campaign_rejects_ragged_or_short_input() {
        let mut campaign = CpaCampaign::new();
        assert_eq!(
            campaign.analyze().unwrap_err(),
            LeakageError::NotEnoughTraces(0)
        );
        campaign.push([0u8; 16], vec![1.0; 4]).unwrap();
        assert_eq!(
            campaign.push([1u8; 16], vec![1.0; 3]),
            Err(LeakageError::TraceLength {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(campaign.len(), 1);
    }

    #[test]
    fn rank_orders_by_peak_then_guess() {
        let mut peaks = vec![0.0f64; KEY_GUESSES];
        peaks[7] = 0.9;
        peaks[3] = 0.9;
        peaks[200] = 0.5;
        let report = ByteReport { peaks };
        assert_eq!(report.best_guess(), 3);
        assert_eq!(report.rank(3), 0);
        assert_eq!(report.rank(7), 1);
        assert_eq!(report.rank(200), 2);
    }
}
