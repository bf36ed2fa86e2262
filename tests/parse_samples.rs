//! Integration tests: parse the sample files in the sheetmusic/ directory
//! and build their time models.

use pretty_assertions::assert_eq;
use scoresync::{load_time_model, parse_bytes, parse_file, timemap, ScoreTimeModel};
use std::io::{Cursor, Write};
use std::path::PathBuf;

/// Get the path to the sheetmusic directory.
fn sheetmusic_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("sheetmusic")
}

// ─── Uncompressed MusicXML (.musicxml) ──────────────────────────────

#[test]
fn parse_ode_to_joy_musicxml() {
    let path = sheetmusic_dir().join("ode-to-joy.musicxml");
    let score = parse_file(&path).expect("Failed to parse ode-to-joy.musicxml");

    assert_eq!(score.title.as_deref(), Some("Ode to Joy"));
    assert_eq!(score.composer.as_deref(), Some("Ludwig van Beethoven"));
    assert_eq!(score.version.as_deref(), Some("3.1"));
    assert_eq!(score.tempo_bpm, Some(120.0));
    assert_eq!(score.divisions, Some(2.0));
    assert_eq!(score.measure_count(), 7);

    // Measure 4: dotted quarter, eighth, half
    let m4 = &score.measures[3];
    let ticks: Vec<_> = m4.notes.iter().map(|n| n.duration_ticks).collect();
    assert_eq!(ticks, vec![Some(3.0), Some(1.0), Some(4.0)]);

    // Measure 6 is a whole-measure rest
    assert!(score.measures[5].notes[0].rest);
}

#[test]
fn ode_to_joy_time_model() {
    let model = load_time_model(sheetmusic_dir().join("ode-to-joy.musicxml")).unwrap();

    assert_eq!(model.tempo_bpm, 120.0);
    assert_eq!(model.divisions_per_quarter, 2.0);
    assert_eq!(model.elements.len(), 20);
    assert_eq!(model.pitched_count(), 18);
    assert_eq!(model.total_duration_seconds, 14.0);

    // Dotted quarter + eighth in measure 4
    let e = model.pitched(12).unwrap();
    assert_eq!((e.onset_seconds, e.duration_seconds), (6.0, 0.75));
    let d = model.pitched(13).unwrap();
    assert_eq!((d.onset_seconds, d.duration_seconds), (6.75, 0.25));

    // Final whole note in measure 7
    let last = model.pitched(17).unwrap();
    assert_eq!(last.measure_number, 7);
    assert_eq!(last.onset_seconds, 12.0);

    assert_contiguous(&model);
}

// ─── Sparse documents ───────────────────────────────────────────────

#[test]
fn sparse_score_uses_defaults_and_skips_unreadable_events() {
    let model = load_time_model(sheetmusic_dir().join("sparse.musicxml")).unwrap();

    assert_eq!(model.tempo_bpm, 96.0);
    assert_eq!(model.divisions_per_quarter, 1.0);

    // Grace note (no duration) and the F with a garbage duration are gone.
    assert_eq!(model.elements.len(), 3);
    assert_eq!(model.pitched_count(), 2);
    assert_eq!(model.elements[1].onset_seconds, 0.625);
    assert_eq!(model.elements[2].onset_seconds, 1.25);
    assert_eq!(model.total_duration_seconds, 2.5);

    assert_contiguous(&model);
}

// ─── Determinism ────────────────────────────────────────────────────

#[test]
fn building_twice_gives_identical_models() {
    let score = parse_file(sheetmusic_dir().join("ode-to-joy.musicxml")).unwrap();
    let first = timemap::build(&score);
    let second = timemap::build(&score);
    assert_eq!(first, second);

    let reparsed = load_time_model(sheetmusic_dir().join("ode-to-joy.musicxml")).unwrap();
    assert_eq!(first.elements, reparsed.elements);
}

// ─── Compressed MusicXML (.mxl) ─────────────────────────────────────

#[test]
fn mxl_and_musicxml_agree() {
    let xml = std::fs::read(sheetmusic_dir().join("ode-to-joy.musicxml")).unwrap();

    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let stored = || {
            zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored)
        };
        zip.start_file("META-INF/container.xml", stored()).unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?><container><rootfiles><rootfile full-path="ode.xml" media-type="application/vnd.recordare.musicxml+xml"/></rootfiles></container>"#,
        )
        .unwrap();
        zip.start_file("ode.xml", stored()).unwrap();
        zip.write_all(&xml).unwrap();
        zip.finish().unwrap();
    }
    let mxl = buf.into_inner();

    let from_xml = parse_bytes(&xml, Some("musicxml")).unwrap();
    let from_mxl = parse_bytes(&mxl, Some("mxl")).unwrap();
    let sniffed = parse_bytes(&mxl, None).unwrap();
    assert_eq!(from_xml, from_mxl);
    assert_eq!(from_xml, sniffed);
}

#[test]
fn missing_file_is_an_error() {
    let err = parse_file(sheetmusic_dir().join("no-such-score.musicxml")).unwrap_err();
    assert!(err.starts_with("Failed to read file"), "{err}");
}

fn assert_contiguous(model: &ScoreTimeModel) {
    for (i, pair) in model.elements.windows(2).enumerate() {
        assert_eq!(
            pair[0].onset_seconds + pair[0].duration_seconds,
            pair[1].onset_seconds,
            "gap after element {i}"
        );
    }
}
