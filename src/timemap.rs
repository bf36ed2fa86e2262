//! Compute absolute onsets and durations for each note/rest event of a
//! score.  This is the bridge between the score document and playback
//! time. It answers "when does each event start?" and "how long is it?"
//! in wall-clock seconds.
//!
//! Tempo and divisions are document-wide constants: the first marking
//! found wins and later changes are ignored.

use serde::{Deserialize, Serialize};

use crate::model::{Pitch, ScoreDocument};

/// Default tempo if none is specified in the score.
pub const DEFAULT_TEMPO: f64 = 96.0;
/// Default divisions per quarter note.
pub const DEFAULT_DIVISIONS: f64 = 1.0;

/// One playable event (note or rest) placed on the time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreElement {
    /// Number of the measure this event belongs to
    pub measure_number: i32,
    /// True if the event has a sounding pitch and is not a rest
    pub is_pitched: bool,
    /// Ordinal among pitched elements (the cursor index), if pitched
    pub pitched_index: Option<usize>,
    /// Scientific pitch name of a pitched element, e.g. "Bb3"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_name: Option<String>,
    /// Cumulative start time in seconds from the beginning
    pub onset_seconds: f64,
    /// Duration of this event in seconds
    pub duration_seconds: f64,
}

impl ScoreElement {
    /// End of the event in seconds.
    pub fn end_seconds(&self) -> f64 {
        self.onset_seconds + self.duration_seconds
    }
}

/// Flat, time-ordered index of every playable event in a score.
///
/// Built once per loaded document and never mutated afterwards; load a
/// new document to get a new model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTimeModel {
    /// Quarter notes per minute
    pub tempo_bpm: f64,
    /// Division ticks per quarter note
    pub divisions_per_quarter: f64,
    /// Every event with a readable duration, in document order
    pub elements: Vec<ScoreElement>,
    /// Sum of all event durations (pitched and rest)
    pub total_duration_seconds: f64,
}

impl ScoreTimeModel {
    /// Build the time model for a document with the built-in defaults.
    pub fn from_document(score: &ScoreDocument) -> Self {
        build(score)
    }

    /// Number of cursor stops (pitched elements).
    pub fn pitched_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_pitched).count()
    }

    /// Cursor index of the final pitched element, if the score has any.
    pub fn last_pitched_index(&self) -> Option<usize> {
        self.pitched_count().checked_sub(1)
    }

    /// The pitched element at a cursor index.
    pub fn pitched(&self, index: usize) -> Option<&ScoreElement> {
        self.elements
            .iter()
            .find(|e| e.pitched_index == Some(index))
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Build a time model using the default tempo and divisions for any
/// metadata the document lacks.
pub fn build(score: &ScoreDocument) -> ScoreTimeModel {
    build_with_defaults(score, DEFAULT_TEMPO, DEFAULT_DIVISIONS)
}

/// Build a time model, substituting the given defaults for a missing or
/// non-positive tempo / divisions value.
///
/// Events without a readable positive tick count are skipped: they get no
/// element and do not advance the running time.
pub fn build_with_defaults(
    score: &ScoreDocument,
    default_tempo: f64,
    default_divisions: f64,
) -> ScoreTimeModel {
    let tempo_bpm = positive_or(score.tempo_bpm, default_tempo);
    let divisions_per_quarter = positive_or(score.divisions, default_divisions);
    let seconds_per_quarter = 60.0 / tempo_bpm;

    let mut elements = Vec::new();
    let mut running_seconds = 0.0;
    let mut pitched_count = 0;
    let mut skipped = 0;

    for (measure, note) in score.events() {
        let ticks = match note.duration_ticks {
            Some(t) if t > 0.0 && t.is_finite() => t,
            _ => {
                skipped += 1;
                continue;
            }
        };

        let duration_seconds = (ticks / divisions_per_quarter) * seconds_per_quarter;
        let is_pitched = note.is_pitched();
        let pitched_index = is_pitched.then(|| {
            pitched_count += 1;
            pitched_count - 1
        });

        let pitch_name = note.pitch.as_ref().filter(|_| is_pitched).map(Pitch::name);

        elements.push(ScoreElement {
            measure_number: measure.number,
            is_pitched,
            pitched_index,
            pitch_name,
            onset_seconds: running_seconds,
            duration_seconds,
        });

        running_seconds += duration_seconds;
    }

    if skipped > 0 {
        log::warn!("skipped {skipped} event(s) without a readable duration");
    }

    ScoreTimeModel {
        tempo_bpm,
        divisions_per_quarter,
        elements,
        total_duration_seconds: running_seconds,
    }
}

fn positive_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v > 0.0 && v.is_finite() => v,
        _ => default,
    }
}
