// tuner-core/src/lib.rs

//! The core logic for the instrument tuner.
//! This crate is responsible for audio capture, autocorrelation pitch
//! detection and nearest-note matching. It is completely headless
//! and contains no GUI code.

pub mod audio;
pub mod config;
pub mod error;
pub mod matcher;
pub mod pitch;
pub mod signal;
pub mod tuner;
pub mod tuning;

pub use audio::{AudioError, AudioFrame, AudioSession, AudioSource};
pub use config::{ConfigError, TunerConfig};
pub use error::TunerError;
pub use tuner::{LoopState, Renderer, TunerLoop};
pub use tuning::{NoteTable, ReferenceNote, TuningMode};

/// Text shown in place of a note or frequency when nothing is matched.
pub const PLACEHOLDER: &str = "--";

/// Why a cycle produced the update it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// A note was matched.
    Matched,
    /// Frame energy was under the noise gate.
    Silent,
    /// No positive correlation peak was found.
    Ambiguous,
    /// The estimate fell outside the accepted frequency range.
    OutOfRange,
}

/// What the renderer shows for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUpdate {
    /// The matched note name, or "--".
    pub note_label: String,
    /// The measured frequency with two decimals, or "--".
    pub frequency_text: String,
    /// Measured minus reference frequency in Hz, clamped to the needle range.
    /// Positive is sharp, negative is flat, 0 for placeholders.
    pub needle_offset: f32,
    /// Deviation in cents when a note was matched.
    pub cents: Option<f32>,
    /// Why this update was produced
    pub status: FrameStatus,
}

impl DisplayUpdate {
    /// Creates the "nothing to show" update.
    ///
    /// # Arguments
    /// * `status` - Why no note is shown
    ///
    /// # Returns
    /// An update with "--" labels, a centred needle and no cents.
    pub fn placeholder(status: FrameStatus) -> Self {
        Self {
            note_label: PLACEHOLDER.to_string(),
            frequency_text: PLACEHOLDER.to_string(),
            needle_offset: 0.0,
            cents: None,
            status,
        }
    }

    /// True unless a note was matched.
    pub fn is_placeholder(&self) -> bool {
        self.status != FrameStatus::Matched
    }
}
