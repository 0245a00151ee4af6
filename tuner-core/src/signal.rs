//! Synthetic test signals.
//!
//! A pure sine generator and an [`AudioSource`] that serves it, so the tuning
//! pipeline can run without a sound card (tests and the host's demo mode).

use std::f64::consts::PI;

use crate::audio::{AudioError, AudioFrame, AudioSource};

/// `len` samples of `amplitude * sin(2π f t)` starting at phase zero.
pub fn sine_wave(frequency: f32, amplitude: f32, sample_rate: u32, len: usize) -> Vec<f32> {
    sine_wave_from(frequency, amplitude, sample_rate, 0, len)
}

fn sine_wave_from(
    frequency: f32,
    amplitude: f32,
    sample_rate: u32,
    start: u64,
    len: usize,
) -> Vec<f32> {
    let f = frequency as f64;
    let sr = sample_rate as f64;
    (0..len as u64)
        .map(|i| (amplitude as f64 * (2.0 * PI * f * (start + i) as f64 / sr).sin()) as f32)
        .collect()
}

/// An audio source producing a continuous sine tone.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    frequency: f32,
    amplitude: f32,
    sample_rate: u32,
    frame_size: usize,
    position: u64,
    started: bool,
    continuous: bool,
}

impl SyntheticSource {
    /// Creates an unstarted source.
    ///
    /// # Arguments
    /// * `frequency` - Tone frequency in Hz
    /// * `amplitude` - Peak amplitude, nominally at most 1.0
    /// * `sample_rate` - Rate reported with every frame
    /// * `frame_size` - Samples per frame
    pub fn new(frequency: f32, amplitude: f32, sample_rate: u32, frame_size: usize) -> Self {
        Self {
            frequency,
            amplitude,
            sample_rate,
            frame_size,
            position: 0,
            started: false,
            continuous: false,
        }
    }

    /// Advance the phase between frames like a live stream would.
    ///
    /// By default every frame starts at phase zero.
    pub fn continuous(mut self) -> Self {
        self.continuous = true;
        self
    }
}

impl AudioSource for SyntheticSource {
    fn start(&mut self) -> Result<(), AudioError> {
        self.started = true;
        tracing::info!(
            frequency = self.frequency,
            sample_rate = self.sample_rate,
            "Synthetic source started"
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<AudioFrame>, AudioError> {
        if !self.started {
            return Err(AudioError::NotStarted);
        }
        let samples = sine_wave_from(
            self.frequency,
            self.amplitude,
            self.sample_rate,
            self.position,
            self.frame_size,
        );
        if self.continuous {
            self.position += self.frame_size as u64;
        }
        Ok(Some(AudioFrame {
            samples,
            sample_rate: self.sample_rate,
        }))
    }
}
