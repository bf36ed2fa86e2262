//! MusicXML parser: converts MusicXML XML into the ScoreDocument model.
//!
//! Parsing is lenient: sparse documents (no tempo, no divisions, notes
//! without durations) still produce a document, with the missing values
//! left as `None` for the time model to default.

use roxmltree::{Document, Node};

use crate::model::*;

/// Parse a MusicXML XML string into a ScoreDocument.
pub fn parse_musicxml(xml: &str) -> Result<ScoreDocument, String> {
    // MusicXML files include a DOCTYPE declaration, so we must allow DTDs
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = Document::parse_with_options(xml, options)
        .map_err(|e| format!("XML parse error: {e}"))?;
    let root = doc.root_element();

    // Verify this is a score-partwise document
    if root.tag_name().name() != "score-partwise" {
        return Err(format!(
            "Unsupported root element: '{}'. Only 'score-partwise' is supported.",
            root.tag_name().name()
        ));
    }

    let mut score = ScoreDocument::new();
    score.version = root.attribute("version").map(String::from);
    score.tempo_bpm = find_tempo(&root);
    score.divisions = root
        .descendants()
        .find(|n| n.has_tag_name("divisions"))
        .and_then(|n| parse_ticks(&n));

    for child in root.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "work" => parse_work(&child, &mut score),
            "identification" => parse_identification(&child, &mut score),
            "part" => parse_part(&child, &mut score),
            _ => {}
        }
    }

    log::debug!(
        "parsed score {:?}: {} measures, tempo {:?}, divisions {:?}",
        score.title,
        score.measures.len(),
        score.tempo_bpm,
        score.divisions
    );

    Ok(score)
}

// ─── Document-wide constants ─────────────────────────────────────────

/// First metronome `<per-minute>` in the document; if there is none, the
/// first `<sound tempo="…">` attribute.
fn find_tempo(root: &Node) -> Option<f64> {
    let metronome = root
        .descendants()
        .filter(|n| n.has_tag_name("metronome"))
        .flat_map(|m| m.children())
        .find(|n| n.has_tag_name("per-minute"));
    if let Some(per_minute) = metronome {
        return parse_f64(&per_minute);
    }

    root.descendants()
        .filter(|n| n.has_tag_name("sound"))
        .find_map(|n| n.attribute("tempo"))
        .and_then(|t| t.trim().parse::<f64>().ok())
}

// ─── Work / Identification ───────────────────────────────────────────

fn parse_work(node: &Node, score: &mut ScoreDocument) {
    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().name() == "work-title" {
            score.title = child.text().map(|t| t.trim().to_string());
        }
    }
}

fn parse_identification(node: &Node, score: &mut ScoreDocument) {
    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().name() == "creator" && child.attribute("type") == Some("composer") {
            score.composer = child.text().map(|t| t.trim().to_string());
        }
    }
}

// ─── Part (measures) ─────────────────────────────────────────────────

fn parse_part(node: &Node, score: &mut ScoreDocument) {
    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().name() == "measure" {
            score.measures.push(parse_measure(&child));
        }
    }
}

// ─── Measure ─────────────────────────────────────────────────────────

fn parse_measure(node: &Node) -> Measure {
    let number = node
        .attribute("number")
        .and_then(|n| n.parse::<i32>().ok())
        .unwrap_or(0);

    let notes = node
        .children()
        .filter(|n| n.has_tag_name("note"))
        .map(|n| parse_note(&n))
        .collect();

    Measure { number, notes }
}

// ─── Note ────────────────────────────────────────────────────────────

fn parse_note(node: &Node) -> NoteEvent {
    let mut note = NoteEvent::default();

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "pitch" => note.pitch = Some(parse_pitch(&child)),
            "duration" => note.duration_ticks = parse_duration(&child),
            "rest" => note.rest = true,
            _ => {}
        }
    }

    note
}

/// An empty `<duration/>` counts as one tick; non-numeric text is unreadable.
fn parse_duration(node: &Node) -> Option<f64> {
    match node.text().map(str::trim) {
        None | Some("") => Some(1.0),
        Some(_) => parse_ticks(node),
    }
}

/// Tick counts are whole numbers: a fractional value is truncated, so
/// `1.5` reads as 1 and `0.5` as 0 (which the time model then skips).
fn parse_ticks(node: &Node) -> Option<f64> {
    parse_f64(node).filter(|t| t.is_finite()).map(f64::trunc)
}

fn parse_pitch(node: &Node) -> Pitch {
    let mut pitch = Pitch {
        step: "C".to_string(),
        octave: 4,
        alter: None,
    };
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "step" => {
                pitch.step = child.text().unwrap_or("C").trim().to_string();
            }
            "octave" => pitch.octave = parse_i32(&child).unwrap_or(4),
            "alter" => pitch.alter = parse_f64(&child),
            _ => {}
        }
    }
    pitch
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn parse_i32(node: &Node) -> Option<i32> {
    node.text()?.trim().parse().ok()
}

fn parse_f64(node: &Node) -> Option<f64> {
    node.text()?.trim().parse().ok()
}
