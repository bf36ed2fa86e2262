//! Document model for a parsed MusicXML melody score.
//!
//! Only the information the synchronization engine needs is kept: the
//! document-wide tempo and divisions, and every note/rest event in
//! document order with its raw tick duration.

use serde::{Deserialize, Serialize};

/// A parsed MusicXML score, flattened to its measures and events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreDocument {
    /// Title of the piece
    pub title: Option<String>,
    /// Composer name
    pub composer: Option<String>,
    /// MusicXML version (e.g., "3.1", "4.0")
    pub version: Option<String>,
    /// First tempo marking found in the document (quarter notes per minute)
    pub tempo_bpm: Option<f64>,
    /// First `<divisions>` value found in the document
    pub divisions: Option<f64>,
    /// Measures of every part, in document order
    pub measures: Vec<Measure>,
}

/// A single measure (bar) of music.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    /// Measure number (0 when absent or not numeric)
    pub number: i32,
    /// Notes and rests in this measure, in document order
    pub notes: Vec<NoteEvent>,
}

/// A single note or rest event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Duration in division ticks; `None` if missing or unreadable
    pub duration_ticks: Option<f64>,
    /// Pitch (None for rests and unpitched events)
    pub pitch: Option<Pitch>,
    /// Whether the event carries a `<rest>` marker
    pub rest: bool,
}

/// Pitch of a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    /// Note name: A, B, C, D, E, F, G
    pub step: String,
    /// Octave number (middle C = C4)
    pub octave: i32,
    /// Chromatic alteration: -1.0 = flat, 1.0 = sharp, 0.0 = natural
    pub alter: Option<f64>,
}

impl ScoreDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of measures in the document.
    pub fn measure_count(&self) -> usize {
        self.measures.len()
    }

    /// Iterate every event across all measures, in document order.
    pub fn events(&self) -> impl Iterator<Item = (&Measure, &NoteEvent)> {
        self.measures
            .iter()
            .flat_map(|m| m.notes.iter().map(move |n| (m, n)))
    }
}

impl NoteEvent {
    /// A sounding note: has a pitch and is not marked as a rest.
    pub fn is_pitched(&self) -> bool {
        self.pitch.is_some() && !self.rest
    }
}

impl Pitch {
    /// Scientific pitch name, e.g. "C#4" or "Bb3".
    pub fn name(&self) -> String {
        let accidental = match self.alter.map(|a| a.round() as i32) {
            Some(2) => "##",
            Some(1) => "#",
            Some(-1) => "b",
            Some(-2) => "bb",
            _ => "",
        };
        format!("{}{}{}", self.step, accidental, self.octave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitch(step: &str, octave: i32, alter: Option<f64>) -> Pitch {
        Pitch {
            step: step.to_string(),
            octave,
            alter,
        }
    }

    #[test]
    fn pitch_names() {
        assert_eq!(pitch("C", 4, Some(1.0)).name(), "C#4");
        assert_eq!(pitch("B", 3, Some(-1.0)).name(), "Bb3");
        assert_eq!(pitch("G", 5, None).name(), "G5");
    }

    #[test]
    fn rest_with_pitch_is_not_pitched() {
        let note = NoteEvent {
            duration_ticks: Some(1.0),
            pitch: Some(pitch("C", 4, None)),
            rest: true,
            ..Default::default()
        };
        assert!(!note.is_pitched());
    }
}
