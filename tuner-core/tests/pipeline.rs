//! End-to-end scenarios: synthetic audio through the whole tuner loop.

use tuner_core::signal::{SyntheticSource, sine_wave};
use tuner_core::{
    AudioError, AudioFrame, AudioSource, DisplayUpdate, FrameStatus, LoopState, Renderer,
    TunerConfig, TunerError, TunerLoop, TuningMode,
};

const SR: u32 = 44_100;

#[derive(Default)]
struct RecordingRenderer {
    updates: Vec<DisplayUpdate>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, update: &DisplayUpdate) {
        self.updates.push(update.clone());
    }
}

/// Plays back a fixed list of pull results, then reports termination.
struct ScriptedSource {
    fail_start: bool,
    script: Vec<Option<AudioFrame>>,
}

impl AudioSource for ScriptedSource {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.fail_start {
            Err(AudioError::NoInputDevice)
        } else {
            Ok(())
        }
    }

    fn next_frame(&mut self) -> Result<Option<AudioFrame>, AudioError> {
        if self.script.is_empty() {
            return Err(AudioError::StreamTerminated);
        }
        Ok(self.script.remove(0))
    }
}

#[test]
fn test_a2_sine_reads_as_a2() {
    let config = TunerConfig::default();
    let mut tuner = TunerLoop::new(&config);
    let mut source = SyntheticSource::new(110.0, 0.5, SR, 4096);
    let mut renderer = RecordingRenderer::default();

    tuner.start(&mut source).expect("synthetic source starts");
    let status = tuner.tick(&mut source, &mut renderer).expect("cycle runs");

    assert_eq!(status, Some(FrameStatus::Matched));
    let update = &renderer.updates[0];
    assert_eq!(update.note_label, "A2");
    assert!(update.needle_offset.abs() < 1.0, "offset {}", update.needle_offset);
    assert!(update.frequency_text.starts_with("109.") || update.frequency_text.starts_with("110."));
}

#[test]
fn test_guitar_strings_match_in_both_modes() {
    for mode in [TuningMode::FixedPreset, TuningMode::Chromatic] {
        let config = TunerConfig {
            tuning_mode: mode,
            ..TunerConfig::default()
        };
        let tuner = TunerLoop::new(&config);
        for (name, frequency) in [("E2", 82.41), ("D3", 146.83), ("B3", 246.94), ("E4", 329.63)] {
            let frame = AudioFrame {
                samples: sine_wave(frequency, 0.5, SR, 4096),
                sample_rate: SR,
            };
            let update = tuner.process_frame(&frame);
            assert_eq!(update.note_label, name, "{mode:?} at {frequency} Hz");
            assert!(update.needle_offset.abs() < 1.0);
        }
    }
}

#[test]
fn test_chromatic_a4_with_suppression() {
    let config = TunerConfig {
        tuning_mode: TuningMode::Chromatic,
        ..TunerConfig::default()
    };
    let tuner = TunerLoop::new(&config);
    let frame = AudioFrame {
        samples: sine_wave(440.0, 0.5, SR, 4096),
        sample_rate: SR,
    };
    let update = tuner.process_frame(&frame);
    assert_eq!(update.note_label, "A4");
    assert_eq!(update.status, FrameStatus::Matched);
}

#[test]
fn test_energy_just_below_threshold_gives_placeholder() {
    let config = TunerConfig::default();
    let tuner = TunerLoop::new(&config);
    let level = config.energy_threshold - 1e-4;
    let frame = AudioFrame {
        samples: vec![level; 4096],
        sample_rate: SR,
    };
    let update = tuner.process_frame(&frame);
    assert_eq!(update.note_label, "--");
    assert_eq!(update.frequency_text, "--");
    assert_eq!(update.needle_offset, 0.0);
    assert_eq!(update.status, FrameStatus::Silent);
}

#[test]
fn test_silent_source_keeps_rendering_placeholders() {
    let mut tuner = TunerLoop::new(&TunerConfig::default());
    let mut source = SyntheticSource::new(110.0, 0.0, SR, 4096).continuous();
    let mut renderer = RecordingRenderer::default();

    tuner.start(&mut source).expect("synthetic source starts");
    for _ in 0..3 {
        let status = tuner.tick(&mut source, &mut renderer).expect("cycle runs");
        assert_eq!(status, Some(FrameStatus::Silent));
    }
    assert_eq!(renderer.updates.len(), 3);
    assert!(renderer.updates.iter().all(DisplayUpdate::is_placeholder));
}

#[test]
fn test_idle_loop_renders_nothing() {
    let mut tuner = TunerLoop::new(&TunerConfig::default());
    let mut source = SyntheticSource::new(110.0, 0.5, SR, 4096);
    let mut renderer = RecordingRenderer::default();

    assert_eq!(tuner.tick(&mut source, &mut renderer).expect("idle tick"), None);
    assert!(renderer.updates.is_empty());
    assert_eq!(tuner.state(), LoopState::Idle);
}

#[test]
fn test_acquisition_failure_keeps_loop_idle() {
    let mut tuner = TunerLoop::new(&TunerConfig::default());
    let mut source = ScriptedSource {
        fail_start: true,
        script: Vec::new(),
    };
    let err = tuner.start(&mut source).expect_err("start must fail");
    assert!(matches!(err, TunerError::Acquisition(AudioError::NoInputDevice)));
    assert_eq!(tuner.state(), LoopState::Idle);
}

#[test]
fn test_missing_frame_skips_cycle_then_termination_is_reported() {
    let mut tuner = TunerLoop::new(&TunerConfig::default());
    let mut source = ScriptedSource {
        fail_start: false,
        script: vec![
            None,
            Some(AudioFrame {
                samples: sine_wave(196.0, 0.5, SR, 4096),
                sample_rate: SR,
            }),
        ],
    };
    let mut renderer = RecordingRenderer::default();

    tuner.start(&mut source).expect("scripted source starts");
    assert_eq!(tuner.state(), LoopState::Listening);

    assert_eq!(tuner.tick(&mut source, &mut renderer).expect("cycle"), None);
    assert!(renderer.updates.is_empty());

    assert_eq!(
        tuner.tick(&mut source, &mut renderer).expect("cycle"),
        Some(FrameStatus::Matched)
    );
    assert_eq!(renderer.updates[0].note_label, "G3");

    let err = tuner
        .tick(&mut source, &mut renderer)
        .expect_err("source is exhausted");
    assert!(matches!(err, TunerError::SourceTerminated(AudioError::StreamTerminated)));
}

#[test]
fn test_valid_peak_outside_accepted_range_is_discarded() {
    // A narrow accepted range turns an otherwise good A2 reading into a placeholder.
    let config = TunerConfig {
        accepted_frequency_range: (200.0, 4000.0),
        ..TunerConfig::default()
    };
    let tuner = TunerLoop::new(&config);
    let frame = AudioFrame {
        samples: sine_wave(110.0, 0.5, SR, 4096),
        sample_rate: SR,
    };
    let update = tuner.process_frame(&frame);
    assert_eq!(update.status, FrameStatus::OutOfRange);
    assert_eq!(update.note_label, "--");
}
