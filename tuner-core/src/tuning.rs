//! # Musical Tuning Module
//!
//! This module builds the reference note tables the tuner matches against.
//! Two tuning modes are supported:
//!
//! - **Fixed preset**: the six open strings of a standard-tuned guitar.
//! - **Chromatic**: every equal-tempered semitone from C2 up to B6.
//!
//! Tables are immutable once built and always ordered by strictly
//! increasing frequency.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Reference pitch for A4 (MIDI note 69) in Hz.
pub const CONCERT_A: f32 = 440.0;

/// Semitone names starting at C, as used in MIDI octave numbering.
const SEMITONE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// First and last octave generated in chromatic mode (inclusive).
const CHROMATIC_OCTAVES: std::ops::RangeInclusive<u8> = 2..=6;

/// Standard guitar tuning, low E to high E.
const GUITAR_STANDARD: [(&str, f32); 6] = [
    ("E2", 82.41),
    ("A2", 110.00),
    ("D3", 146.83),
    ("G3", 196.00),
    ("B3", 246.94),
    ("E4", 329.63),
];

/// A single reference note with its name and frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceNote {
    /// Note name (e.g., "A2", "C#4")
    pub name: String,
    /// Frequency in Hz
    pub frequency: f32,
}

/// Which set of reference notes the tuner matches against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TuningMode {
    /// Six-string guitar in standard tuning.
    #[default]
    FixedPreset,
    /// All twelve semitones for octaves 2 through 6.
    Chromatic,
}

static FIXED_PRESET: Lazy<Vec<ReferenceNote>> = Lazy::new(|| {
    GUITAR_STANDARD
        .iter()
        .map(|&(name, frequency)| ReferenceNote {
            name: name.to_string(),
            frequency,
        })
        .collect()
});

static CHROMATIC: Lazy<Vec<ReferenceNote>> = Lazy::new(|| {
    let mut notes = Vec::with_capacity(CHROMATIC_OCTAVES.len() * SEMITONE_NAMES.len());
    for octave in CHROMATIC_OCTAVES {
        for semitone in 0..SEMITONE_NAMES.len() as u8 {
            let midi = (octave + 1) * 12 + semitone;
            notes.push(ReferenceNote {
                name: note_name(midi),
                frequency: equal_temperament_frequency(midi),
            });
        }
    }
    notes
});

/// Equal-tempered frequency of a MIDI note, with A4 = 440 Hz.
pub fn equal_temperament_frequency(midi: u8) -> f32 {
    CONCERT_A * 2.0_f32.powf((midi as f32 - 69.0) / 12.0)
}

/// Scientific pitch name of a MIDI note (60 is "C4").
pub fn note_name(midi: u8) -> String {
    let octave = (midi / 12) as i32 - 1;
    format!("{}{}", SEMITONE_NAMES[(midi % 12) as usize], octave)
}

/// Deviation of `freq` from `target_freq` in cents.
///
/// Positive values are sharp, negative values are flat.
pub fn calculate_cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

/// An ordered, immutable set of reference notes for one tuning mode.
#[derive(Debug, Clone)]
pub struct NoteTable {
    mode: TuningMode,
    notes: Vec<ReferenceNote>,
}

impl NoteTable {
    /// Builds the table for `mode`. Entries are in ascending frequency order.
    pub fn build(mode: TuningMode) -> Self {
        let notes = match mode {
            TuningMode::FixedPreset => FIXED_PRESET.clone(),
            TuningMode::Chromatic => CHROMATIC.clone(),
        };
        tracing::debug!(?mode, entries = notes.len(), "Built note table");
        Self { mode, notes }
    }

    /// The mode this table was built for.
    pub fn mode(&self) -> TuningMode {
        self.mode
    }

    /// All reference notes, lowest first.
    ///
    /// # Returns
    /// A slice sorted by strictly increasing frequency, ready for
    /// [`crate::matcher::match_note`].
    pub fn notes(&self) -> &[ReferenceNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn strictly_increasing(notes: &[ReferenceNote]) -> bool {
        notes.windows(2).all(|w| w[0].frequency < w[1].frequency)
    }

    #[test]
    fn test_fixed_preset_is_standard_guitar_tuning() {
        let table = NoteTable::build(TuningMode::FixedPreset);
        let names: Vec<&str> = table.notes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["E2", "A2", "D3", "G3", "B3", "E4"]);
        assert_eq!(table.notes()[1].frequency, 110.0);
        assert_eq!(table.mode(), TuningMode::FixedPreset);
        assert!(strictly_increasing(table.notes()));
    }

    #[test]
    fn test_chromatic_has_five_octaves() {
        let table = NoteTable::build(TuningMode::Chromatic);
        assert_eq!(table.len(), 60);
        assert_eq!(table.notes()[0].name, "C2");
        assert_eq!(table.notes()[59].name, "B6");
        assert!(strictly_increasing(table.notes()));
    }

    #[test]
    fn test_chromatic_a4_is_exactly_concert_a() {
        let table = NoteTable::build(TuningMode::Chromatic);
        let a4 = table
            .notes()
            .iter()
            .find(|n| n.name == "A4")
            .expect("A4 present");
        assert_eq!(a4.frequency, 440.0);
    }

    #[test]
    fn test_chromatic_matches_guitar_strings() {
        let table = NoteTable::build(TuningMode::Chromatic);
        for preset in NoteTable::build(TuningMode::FixedPreset).notes() {
            let chromatic = table
                .notes()
                .iter()
                .find(|n| n.name == preset.name)
                .expect("guitar string in chromatic table");
            assert_relative_eq!(chromatic.frequency, preset.frequency, max_relative = 1e-4);
        }
    }

    #[test]
    fn test_note_name_uses_midi_octaves() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(37), "C#2");
    }

    #[test]
    fn test_cents_deviation_sign() {
        assert_relative_eq!(calculate_cents_deviation(880.0, 440.0), 1200.0);
        assert!(calculate_cents_deviation(438.0, 440.0) < 0.0);
        assert_eq!(calculate_cents_deviation(440.0, 440.0), 0.0);
    }
}
