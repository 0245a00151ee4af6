//! # Pitch Detection Module
//!
//! Fundamental-frequency estimation by normalized autocorrelation.
//!
//! ## Algorithm
//! 1. RMS noise gate: frames quieter than the energy threshold are rejected.
//! 2. Brute-force lag search over `[min_lag, max_lag)`; each correlation sum is
//!    divided by the number of terms so short lags are not favoured.
//! 3. The lag with the largest positive normalized correlation gives the
//!    period, and `sample_rate / lag` the frequency.
//! 4. Optionally, sub-harmonic suppression walks back to the first strong
//!    correlation peak (see [`PitchEstimator::with_subharmonic_suppression`]).
//!
//! ## Frequency resolution
//! No sub-sample interpolation is performed. An estimate at lag `L` cannot be
//! distinguished from its neighbours more finely than
//! `sample_rate / L - sample_rate / (L + 1)` Hz, which grows quadratically with
//! frequency. See [`resolution_floor`].
//!
//! ## Octave ambiguity
//! The normalized correlation at two or more periods can exceed the value at one
//! period, so the raw search may report an integer fraction of the true pitch.
//! Sub-harmonic suppression corrects this for clean tones; with it disabled the
//! raw behaviour is reproduced exactly.
//!
//! ## Accuracy
//! Measured on clean sines at 44.1 kHz with a 4096-sample frame, lags 20..1024
//! and suppression on:
//! - From 160 Hz up to `sample_rate / min_lag` (2205 Hz) the estimate is
//!   within one resolution step of the true frequency.
//! - Between roughly 118 and 156 Hz a few isolated frequencies miss by a
//!   fraction of a step.
//! - Below roughly 118 Hz only a few periods fit in the frame and the partial
//!   period at the frame edge biases the peak by up to about eight steps
//!   (under 15 cents).
//! - Tones whose period is close to `max_lag` (43.1 to 43.4 Hz here) have no
//!   correlation peak inside the range and give
//!   [`PitchEstimate::NoCorrelationPeak`].
//!
//! The raw search is much worse: besides the octave errors above, tones below
//! about 45 Hz read as `sample_rate / min_lag` because the correlation is still
//! falling away from lag zero at the first searched lag.

use crate::config::TunerConfig;

/// Fraction of the strongest correlation peak an earlier peak must reach
/// to be preferred by sub-harmonic suppression.
pub const SUBHARMONIC_PEAK_RATIO: f64 = 0.9;

/// Outcome of one pitch estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PitchEstimate {
    /// A correlation peak was found.
    Valid {
        /// Estimated fundamental frequency in Hz.
        frequency: f32,
        /// Winning lag in samples.
        lag: usize,
        /// Sample rate the frame was captured at.
        sample_rate: u32,
    },
    /// Frame RMS was under the energy threshold.
    BelowEnergyThreshold,
    /// No lag in the search range correlated positively.
    NoCorrelationPeak,
}

impl PitchEstimate {
    /// The estimated frequency, if the estimate is valid.
    pub fn frequency(&self) -> Option<f32> {
        match *self {
            PitchEstimate::Valid { frequency, .. } => Some(frequency),
            _ => None,
        }
    }

    /// Resolution floor at the winning lag, in Hz.
    pub fn resolution(&self) -> Option<f32> {
        match *self {
            PitchEstimate::Valid {
                lag, sample_rate, ..
            } => Some(resolution_floor(sample_rate, lag)),
            _ => None,
        }
    }
}

/// Root-mean-square energy of a frame. Empty frames have zero energy.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = signal.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / signal.len() as f64).sqrt() as f32
}

/// Smallest frequency step distinguishable at `lag`:
/// `sample_rate / lag - sample_rate / (lag + 1)`.
pub fn resolution_floor(sample_rate: u32, lag: usize) -> f32 {
    let sr = sample_rate as f64;
    let lag = lag as f64;
    (sr / lag - sr / (lag + 1.0)) as f32
}

/// Autocorrelation pitch estimator.
#[derive(Debug, Clone)]
pub struct PitchEstimator {
    energy_threshold: f32,
    min_lag: usize,
    max_lag: usize,
    subharmonic_suppression: bool,
}

impl PitchEstimator {
    /// Creates an estimator gating at `energy_threshold` and searching lags
    /// `lag_range.0 .. lag_range.1`. Sub-harmonic suppression is off.
    pub fn new(energy_threshold: f32, lag_range: (usize, usize)) -> Self {
        Self {
            energy_threshold,
            min_lag: lag_range.0.max(1),
            max_lag: lag_range.1,
            subharmonic_suppression: false,
        }
    }

    /// Creates an estimator from the pipeline configuration.
    ///
    /// # Arguments
    /// * `config` - Supplies the energy threshold, lag search range and
    ///   sub-harmonic suppression switch
    pub fn from_config(config: &TunerConfig) -> Self {
        Self::new(config.energy_threshold, config.lag_search_range)
            .with_subharmonic_suppression(config.subharmonic_suppression)
    }

    /// Prefer the first correlation peak reaching [`SUBHARMONIC_PEAK_RATIO`]
    /// of the strongest peak over the global maximum itself.
    ///
    /// A peak is a positive lag whose correlation is above its left
    /// neighbour and not below its right one. The lags just outside the
    /// search range serve as neighbours for the first and last lag, so a
    /// period exactly at `min_lag` can win while a correlation still falling
    /// away from lag zero cannot. If no lag in the range is a peak the
    /// estimate is [`PitchEstimate::NoCorrelationPeak`].
    pub fn with_subharmonic_suppression(mut self, enabled: bool) -> Self {
        self.subharmonic_suppression = enabled;
        self
    }

    /// Estimates the fundamental frequency of `signal` captured at `sample_rate`.
    ///
    /// # Arguments
    /// * `signal` - Mono samples of one frame
    /// * `sample_rate` - Capture rate in Hz
    ///
    /// # Returns
    /// A valid estimate, or the reason no pitch could be measured.
    pub fn estimate(&self, signal: &[f32], sample_rate: u32) -> PitchEstimate {
        let frame_size = signal.len();

        // --- Noise gate ---
        if rms(signal) < self.energy_threshold || frame_size == 0 {
            return PitchEstimate::BelowEnergyThreshold;
        }

        // The sum at lag L has N - L terms, so L must stay below N.
        let max_lag = self.max_lag.min(frame_size);
        if self.min_lag >= max_lag {
            return PitchEstimate::NoCorrelationPeak;
        }

        // --- Normalized autocorrelation over the lag range ---
        let correlations: Vec<f64> = (self.min_lag..max_lag)
            .map(|lag| normalized_correlation(signal, lag))
            .collect();

        // --- Global peak, strictly positive ---
        let mut best_corr = 0.0;
        let mut best_index = None;
        for (i, &corr) in correlations.iter().enumerate() {
            if corr > best_corr {
                best_corr = corr;
                best_index = Some(i);
            }
        }

        let Some(mut best_index) = best_index else {
            return PitchEstimate::NoCorrelationPeak;
        };

        if self.subharmonic_suppression {
            // min_lag is at least 1, so the left neighbour always exists.
            let before = normalized_correlation(signal, self.min_lag - 1);
            let after = if max_lag < frame_size {
                normalized_correlation(signal, max_lag)
            } else {
                f64::NEG_INFINITY
            };
            match first_strong_peak(&correlations, before, after) {
                Some(i) => best_index = i,
                None => return PitchEstimate::NoCorrelationPeak,
            }
        }

        let lag = self.min_lag + best_index;
        PitchEstimate::Valid {
            frequency: sample_rate as f32 / lag as f32,
            lag,
            sample_rate,
        }
    }
}

/// `sum(s[i] * s[i + lag]) / (N - lag)`, accumulated in f64. `lag` must be below `N`.
fn normalized_correlation(signal: &[f32], lag: usize) -> f64 {
    let terms = signal.len() - lag;
    let sum: f64 = signal[..terms]
        .iter()
        .zip(&signal[lag..])
        .map(|(&a, &b)| a as f64 * b as f64)
        .sum();
    sum / terms as f64
}

/// Index of the first local peak whose value reaches
/// `SUBHARMONIC_PEAK_RATIO` times the strongest local peak.
///
/// `before` and `after` are the correlations at the lags just outside the
/// searched range; `f64::NEG_INFINITY` stands for a lag past the frame.
fn first_strong_peak(correlations: &[f64], before: f64, after: f64) -> Option<usize> {
    let is_peak = |i: usize| {
        let c = correlations[i];
        let left = if i == 0 { before } else { correlations[i - 1] };
        let right = correlations.get(i + 1).copied().unwrap_or(after);
        c > 0.0 && c > left && c >= right
    };

    let strongest = (0..correlations.len())
        .filter(|&i| is_peak(i))
        .map(|i| correlations[i])
        .reduce(f64::max)?;

    let floor = SUBHARMONIC_PEAK_RATIO * strongest;
    (0..correlations.len()).find(|&i| is_peak(i) && correlations[i] >= floor)
}
