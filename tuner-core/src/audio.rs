//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! The [`AudioSource`] trait is the seam between the tuner loop and whatever
//! produces samples; [`AudioSession`] implements it on top of the default
//! input device.
//!
//! ## Capture pipeline
//! - The CPAL callback downmixes each callback buffer to mono and forwards it
//!   over a bounded channel. If the consumer falls behind and the channel is
//!   full, the chunk is dropped and an overflow flag is raised.
//! - [`AudioSession::next_frame`] drains the channel into a sliding window and
//!   hands out the newest `frame_size` samples. After an overflow the window
//!   restarts from empty, so a frame never spans a gap in the audio.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use thiserror::Error;

/// Preferred capture rate in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 44_100;

/// Number of callback buffers that may queue up between two frame pulls.
const CHANNEL_CAPACITY: usize = 64;

/// Errors raised by audio sources.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No input device available")]
    NoInputDevice,

    #[error("No suitable f32 input format found")]
    NoSupportedConfig,

    #[error("Could not read device name: {0}")]
    DeviceName(#[from] cpal::DeviceNameError),

    #[error("Could not query input formats: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("Failed to open stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to start stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Audio source has not been started")]
    NotStarted,

    #[error("Audio stream terminated")]
    StreamTerminated,
}

/// One frame of mono samples, nominally in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// A producer of audio frames.
pub trait AudioSource {
    /// Acquires the underlying device. Failure here is fatal to the tuner.
    fn start(&mut self) -> Result<(), AudioError>;

    /// The newest frame, or `None` if not enough audio has arrived yet.
    fn next_frame(&mut self) -> Result<Option<AudioFrame>, AudioError>;
}

/// Live handles owned by a started session.
struct Capture {
    stream: cpal::Stream,
    receiver: Receiver<Vec<f32>>,
    failed: Arc<AtomicBool>,
    /// Set by the callback when a chunk was dropped on a full channel
    overflowed: Arc<AtomicBool>,
    sample_rate: u32,
}

/// Capture from the default input device.
///
/// Constructed once by the host and passed by reference to the tuner loop.
/// No device is touched until [`AudioSource::start`] is called.
pub struct AudioSession {
    frame_size: usize,
    window: VecDeque<f32>,
    capture: Option<Capture>,
}

impl AudioSession {
    /// Creates an unstarted session.
    ///
    /// # Arguments
    /// * `frame_size` - Number of mono samples in each delivered frame
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame_size,
            window: VecDeque::with_capacity(frame_size * 2),
            capture: None,
        }
    }

    /// Sample rate of the running stream.
    pub fn sample_rate(&self) -> Option<u32> {
        self.capture.as_ref().map(|c| c.sample_rate)
    }

    /// Appends a chunk to the window, keeping only the newest `frame_size` samples.
    fn push_samples(&mut self, chunk: &[f32]) {
        self.window.extend(chunk.iter().copied());
        let excess = self.window.len().saturating_sub(self.frame_size);
        self.window.drain(..excess);
    }

    /// Feeds chunks drained from the capture channel into the window.
    ///
    /// After an overflow, the window and the drained chunks may straddle the
    /// dropped audio, so all of it is discarded and the window refills.
    fn absorb(&mut self, chunks: Vec<Vec<f32>>, overflowed: bool) {
        if overflowed {
            tracing::debug!(
                discarded_chunks = chunks.len(),
                "Capture channel overflowed, restarting window"
            );
            self.window.clear();
            return;
        }
        for chunk in &chunks {
            self.push_samples(chunk);
        }
    }
}

impl AudioSource for AudioSession {
    /// Opens the default input device and starts streaming.
    ///
    /// # Audio Configuration
    /// - Sample Rate: closest supported rate to 44.1 kHz
    /// - Format: 32-bit float
    /// - Channels: mono preferred, otherwise downmixed
    fn start(&mut self) -> Result<(), AudioError> {
        if self.capture.is_some() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(AudioError::NoInputDevice)?;

        let device_name = device.name()?;
        tracing::info!(device = %device_name, "Using audio input device");

        let configs = device.supported_input_configs()?.collect::<Vec<_>>();
        let supported_config =
            find_supported_config(configs, TARGET_SAMPLE_RATE).ok_or(AudioError::NoSupportedConfig)?;

        let rate = TARGET_SAMPLE_RATE.clamp(
            supported_config.min_sample_rate().0,
            supported_config.max_sample_rate().0,
        );
        let config = supported_config.with_sample_rate(cpal::SampleRate(rate));
        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        let config: cpal::StreamConfig = config.into();

        tracing::info!(sample_rate, channels, "Selected input format");

        let (sender, receiver) = crossbeam_channel::bounded::<Vec<f32>>(CHANNEL_CAPACITY);
        let failed = Arc::new(AtomicBool::new(false));
        let failed_flag = Arc::clone(&failed);
        let overflowed = Arc::new(AtomicBool::new(false));
        let overflow_flag = Arc::clone(&overflowed);

        let err_fn = move |err: cpal::StreamError| {
            tracing::error!("Input stream error: {}", err);
            if matches!(err, cpal::StreamError::DeviceNotAvailable) {
                failed_flag.store(true, Ordering::Release);
            }
        };

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                forward_chunk(&sender, &overflow_flag, data, channels);
            },
            err_fn,
            None,
        )?;

        stream.play()?;

        self.window.clear();
        self.capture = Some(Capture {
            stream,
            receiver,
            failed,
            overflowed,
            sample_rate,
        });
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<AudioFrame>, AudioError> {
        let capture = self.capture.as_ref().ok_or(AudioError::NotStarted)?;
        if capture.failed.load(Ordering::Acquire) {
            return Err(AudioError::StreamTerminated);
        }

        let sample_rate = capture.sample_rate;
        let mut chunks = Vec::new();
        loop {
            match capture.receiver.try_recv() {
                Ok(chunk) => chunks.push(chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(AudioError::StreamTerminated),
            }
        }
        // Checked after draining: a drop during the drain is caught now,
        // and everything still queued was sent after it.
        let overflowed = capture.overflowed.swap(false, Ordering::AcqRel);
        self.absorb(chunks, overflowed);

        if self.window.len() < self.frame_size {
            return Ok(None);
        }
        Ok(Some(AudioFrame {
            samples: self.window.iter().copied().collect(),
            sample_rate,
        }))
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        if let Some(capture) = self.capture.take() {
            if let Err(e) = capture.stream.pause() {
                tracing::warn!("Error pausing stream: {}", e);
            }
        }
    }
}

/// Downmixes one callback buffer and hands it to the consumer without
/// blocking. A full channel drops the chunk and raises `overflowed`.
fn forward_chunk(sender: &Sender<Vec<f32>>, overflowed: &AtomicBool, data: &[f32], channels: usize) {
    if let Err(TrySendError::Full(_)) = sender.try_send(downmix(data, channels)) {
        overflowed.store(true, Ordering::Release);
    }
}

/// Averages interleaved channels down to mono.
fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Finds the best supported f32 input configuration.
///
/// Mono configurations win over multi-channel ones; among equals, the one
/// whose rate range lies closest to `target_rate` is chosen.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_rate = c.min_sample_rate().0;
            let max_rate = c.max_sample_rate().0;
            let rate_distance = if (min_rate..=max_rate).contains(&target_rate) {
                0
            } else {
                min_rate.abs_diff(target_rate).min(max_rate.abs_diff(target_rate))
            };
            (c.channels() != 1, rate_distance)
        })
}
