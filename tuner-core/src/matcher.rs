//! Nearest-note lookup.

use crate::tuning::{ReferenceNote, calculate_cents_deviation};

/// The reference note closest to a measured frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviationResult<'a> {
    /// Closest entry of the table that was searched
    pub matched_note: &'a ReferenceNote,
    /// `measured - matched_note.frequency`; positive is sharp, negative is flat.
    pub offset_hz: f32,
}

impl DeviationResult<'_> {
    /// The measured frequency this result was computed from.
    pub fn measured_frequency(&self) -> f32 {
        self.matched_note.frequency + self.offset_hz
    }

    /// Deviation from the matched note in cents.
    pub fn cents(&self) -> f32 {
        calculate_cents_deviation(self.measured_frequency(), self.matched_note.frequency)
    }
}

/// Finds the entry of `notes` closest to `frequency` by absolute difference.
///
/// Ties go to the earlier entry. The caller is expected to pass a positive
/// frequency from a valid estimate.
///
/// # Arguments
/// * `frequency` - Measured frequency in Hz
/// * `notes` - Reference notes to search, in any order
///
/// # Returns
/// The closest note and the signed offset to it, or `None` for an empty table.
pub fn match_note(frequency: f32, notes: &[ReferenceNote]) -> Option<DeviationResult<'_>> {
    let (first, rest) = notes.split_first()?;

    let mut best = first;
    let mut best_distance = (first.frequency - frequency).abs();
    for note in rest {
        let distance = (note.frequency - frequency).abs();
        if distance < best_distance {
            best = note;
            best_distance = distance;
        }
    }

    Some(DeviationResult {
        matched_note: best,
        offset_hz: frequency - best.frequency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::{NoteTable, TuningMode};
    use approx::assert_abs_diff_eq;

    fn note(name: &str, frequency: f32) -> ReferenceNote {
        ReferenceNote {
            name: name.to_string(),
            frequency,
        }
    }

    #[test]
    fn test_empty_table_has_no_match() {
        assert!(match_note(110.0, &[]).is_none());
    }

    #[test]
    fn test_matches_nearest_guitar_string() {
        let table = NoteTable::build(TuningMode::FixedPreset);
        let result = match_note(111.5, table.notes()).expect("non-empty table");
        assert_eq!(result.matched_note.name, "A2");
        assert_abs_diff_eq!(result.offset_hz, 1.5, epsilon = 1e-4);
        assert!(result.cents() > 0.0);

        let flat = match_note(80.0, table.notes()).expect("non-empty table");
        assert_eq!(flat.matched_note.name, "E2");
        assert!(flat.offset_hz < 0.0);
    }

    #[test]
    fn test_far_outside_table_clamps_to_edge_note() {
        let table = NoteTable::build(TuningMode::FixedPreset);
        let high = match_note(1000.0, table.notes()).expect("non-empty table");
        assert_eq!(high.matched_note.name, "E4");
        let low = match_note(20.0, table.notes()).expect("non-empty table");
        assert_eq!(low.matched_note.name, "E2");
    }

    #[test]
    fn test_equidistant_frequency_picks_lower_entry() {
        let notes = [note("low", 100.0), note("high", 200.0), note("top", 300.0)];
        let result = match_note(150.0, &notes).expect("non-empty table");
        assert_eq!(result.matched_note.name, "low");
        assert_eq!(result.offset_hz, 50.0);

        let result = match_note(250.0, &notes).expect("non-empty table");
        assert_eq!(result.matched_note.name, "high");
    }

    #[test]
    fn test_matching_is_deterministic() {
        let table = NoteTable::build(TuningMode::Chromatic);
        for &f in &[55.0_f32, 261.6, 440.0, 1234.5] {
            let first = match_note(f, table.notes()).expect("non-empty table");
            let second = match_note(f, table.notes()).expect("non-empty table");
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_measured_frequency_round_trips() {
        let table = NoteTable::build(TuningMode::Chromatic);
        let result = match_note(445.0, table.notes()).expect("non-empty table");
        assert_eq!(result.matched_note.name, "A4");
        assert_abs_diff_eq!(result.measured_frequency(), 445.0, epsilon = 1e-3);
    }
}
