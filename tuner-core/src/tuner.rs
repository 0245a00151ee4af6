//! # Tuner Loop
//!
//! The per-frame control cycle. The host calls [`TunerLoop::tick`] once per
//! display refresh; each call pulls the newest audio frame, estimates its
//! pitch, matches it to the note table and hands a [`DisplayUpdate`] to the
//! renderer. The loop never recurses or sleeps, and stops when the host
//! stops calling it.

use crate::audio::{AudioFrame, AudioSource};
use crate::config::TunerConfig;
use crate::error::TunerError;
use crate::matcher::match_note;
use crate::pitch::{PitchEstimate, PitchEstimator};
use crate::tuning::NoteTable;
use crate::{DisplayUpdate, FrameStatus};

/// Receives one display update per cycle.
pub trait Renderer {
    /// Shows `update`. Called at most once per [`TunerLoop::tick`].
    fn render(&mut self, update: &DisplayUpdate);
}

/// Loop state. Idle until the host explicitly starts listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not started, or the source failed to start
    Idle,
    /// Started; each tick processes one frame
    Listening,
}

/// Ties the estimator, note table and display policy together.
pub struct TunerLoop {
    estimator: PitchEstimator,
    table: NoteTable,
    accepted_range: (f32, f32),
    needle_range: f32,
    state: LoopState,
    last_status: Option<FrameStatus>,
}

impl TunerLoop {
    /// Builds the loop from an already validated configuration.
    ///
    /// # Arguments
    /// * `config` - Estimator settings, tuning mode, accepted range and
    ///   needle clamp
    ///
    /// # Returns
    /// An idle loop. Nothing is captured until [`TunerLoop::start`].
    pub fn new(config: &TunerConfig) -> Self {
        Self {
            estimator: PitchEstimator::from_config(config),
            table: NoteTable::build(config.tuning_mode),
            accepted_range: config.accepted_frequency_range,
            needle_range: config.needle_range_hz,
            state: LoopState::Idle,
            last_status: None,
        }
    }

    /// Current loop state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The note table estimates are matched against.
    pub fn table(&self) -> &NoteTable {
        &self.table
    }

    /// Starts `source` and switches to listening.
    ///
    /// A source that fails to start leaves the loop idle for good; the error
    /// is meant to be shown to the user, not retried.
    pub fn start(&mut self, source: &mut dyn AudioSource) -> Result<(), TunerError> {
        if self.state == LoopState::Listening {
            return Ok(());
        }
        source.start().map_err(|e| {
            tracing::error!(error = %e, "Audio acquisition failed");
            TunerError::Acquisition(e)
        })?;
        self.state = LoopState::Listening;
        tracing::info!(
            mode = ?self.table.mode(),
            notes = self.table.len(),
            "Tuner listening"
        );
        Ok(())
    }

    /// Runs one cycle.
    ///
    /// # Arguments
    /// * `source` - The started audio source to pull a frame from
    /// * `renderer` - Receives the update for this cycle
    ///
    /// # Returns
    /// The status of the rendered update, or `None` when idle or when the
    /// source has no frame ready yet (nothing is rendered then). A source
    /// error is returned as [`TunerError::SourceTerminated`].
    pub fn tick(
        &mut self,
        source: &mut dyn AudioSource,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<FrameStatus>, TunerError> {
        if self.state == LoopState::Idle {
            return Ok(None);
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::error!(error = %e, "Audio source stopped delivering frames");
                return Err(TunerError::SourceTerminated(e));
            }
        };

        let update = self.process_frame(&frame);
        if self.last_status != Some(update.status) {
            tracing::debug!(from = ?self.last_status, to = ?update.status, "Frame status changed");
            self.last_status = Some(update.status);
        }
        tracing::trace!(
            note = %update.note_label,
            frequency = %update.frequency_text,
            offset = update.needle_offset,
            "Cycle"
        );

        renderer.render(&update);
        Ok(Some(update.status))
    }

    /// Estimates, matches and formats one frame.
    pub fn process_frame(&self, frame: &AudioFrame) -> DisplayUpdate {
        let estimate = self.estimator.estimate(&frame.samples, frame.sample_rate);
        self.process_estimate(estimate)
    }

    /// Turns a pitch estimate into a display update.
    ///
    /// Invalid estimates and frequencies outside the open accepted range
    /// become placeholders. Matched updates carry the frequency with two
    /// decimals and the offset clamped to the needle range.
    pub fn process_estimate(&self, estimate: PitchEstimate) -> DisplayUpdate {
        let frequency = match estimate {
            PitchEstimate::Valid { frequency, .. } => frequency,
            PitchEstimate::BelowEnergyThreshold => {
                return DisplayUpdate::placeholder(FrameStatus::Silent);
            }
            PitchEstimate::NoCorrelationPeak => {
                return DisplayUpdate::placeholder(FrameStatus::Ambiguous);
            }
        };

        let (min_freq, max_freq) = self.accepted_range;
        if !(frequency > min_freq && frequency < max_freq) {
            return DisplayUpdate::placeholder(FrameStatus::OutOfRange);
        }

        let Some(deviation) = match_note(frequency, self.table.notes()) else {
            return DisplayUpdate::placeholder(FrameStatus::Ambiguous);
        };

        DisplayUpdate {
            note_label: deviation.matched_note.name.clone(),
            frequency_text: format!("{frequency:.2}"),
            needle_offset: deviation
                .offset_hz
                .clamp(-self.needle_range, self.needle_range),
            cents: Some(deviation.cents()),
            status: FrameStatus::Matched,
        }
    }
}
