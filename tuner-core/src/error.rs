//! Errors that stop the tuner loop.
//!
//! Silent, ambiguous and out-of-range frames are ordinary outcomes and are
//! reported through [`crate::FrameStatus`], not here.

use thiserror::Error;

use crate::audio::AudioError;

/// Fatal tuner loop errors. Both carry the underlying audio error.
#[derive(Error, Debug)]
pub enum TunerError {
    /// The audio source could not be started (no device, permission denied).
    #[error("Could not start audio input: {0}")]
    Acquisition(#[source] AudioError),

    /// The audio source stopped delivering frames.
    #[error("Audio input stopped: {0}")]
    SourceTerminated(#[source] AudioError),
}
