//! Track metadata handed over by the processing pipeline.
//!
//! Each processed song lives in a directory named after its slug, with a
//! `meta.json` describing it. The score and instrumental audio are served
//! from fixed endpoints derived from the slug.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// One processed song, as shown on the karaoke screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    #[serde(default)]
    pub slug: String,
    pub title: String,
    pub artist: String,
    /// Detected key, e.g. "A minor"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Length of the instrumental in seconds
    pub duration_sec: f64,
    #[serde(default)]
    pub score_url: String,
    #[serde(default)]
    pub audio_url: String,
}

impl TrackInfo {
    /// Parse a `meta.json` body, filling in the slug and endpoint URLs.
    pub fn from_meta_json(slug: &str, json: &str) -> Result<Self, String> {
        let mut track: TrackInfo = serde_json::from_str(json)
            .map_err(|e| format!("Invalid meta.json for '{slug}': {e}"))?;
        track.slug = slug.to_string();
        track.score_url = format!("/api/tracks/{slug}/score");
        track.audio_url = format!("/api/tracks/{slug}/instrumental");
        Ok(track)
    }

    /// Read `<dir>/meta.json`; the directory name is the slug.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, String> {
        let dir = dir.as_ref();
        let slug = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("No track slug in path '{}'", dir.display()))?;
        let meta_path = dir.join("meta.json");
        let json = std::fs::read_to_string(&meta_path)
            .map_err(|e| format!("Failed to read '{}': {e}", meta_path.display()))?;
        Self::from_meta_json(slug, &json)
    }
}

/// Load every track under `root`, skipping directories whose metadata is
/// missing or unreadable. Sorted by slug.
pub fn list_tracks<P: AsRef<Path>>(root: P) -> Vec<TrackInfo> {
    let root = root.as_ref();
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("no track directory at '{}': {e}", root.display());
            return Vec::new();
        }
    };

    let mut tracks: Vec<TrackInfo> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && path.join("meta.json").exists())
        .filter_map(|path| match TrackInfo::from_dir(&path) {
            Ok(track) => Some(track),
            Err(e) => {
                log::error!("{e}");
                None
            }
        })
        .collect();
    tracks.sort_by(|a, b| a.slug.cmp(&b.slug));
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn meta_json_gets_urls() {
        let json = r#"{"title": "Song", "artist": "Band", "key": "C major", "durationSec": 183.5}"#;
        let track = TrackInfo::from_meta_json("song-band", json).unwrap();
        assert_eq!(track.slug, "song-band");
        assert_eq!(track.key.as_deref(), Some("C major"));
        assert_eq!(track.duration_sec, 183.5);
        assert_eq!(track.score_url, "/api/tracks/song-band/score");
        assert_eq!(track.audio_url, "/api/tracks/song-band/instrumental");
    }

    #[test]
    fn key_is_optional() {
        let json = r#"{"title": "Song", "artist": "Band", "durationSec": 60}"#;
        let track = TrackInfo::from_meta_json("s", json).unwrap();
        assert_eq!(track.key, None);
    }

    #[test]
    fn missing_title_is_an_error() {
        let err = TrackInfo::from_meta_json("s", r#"{"artist": "Band", "durationSec": 1}"#).unwrap_err();
        assert!(err.contains("'s'"));
    }

    #[test]
    fn lists_track_directories() {
        let root = std::env::temp_dir().join(format!("scoresync-tracks-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        for (slug, meta) in [
            ("b-song", Some(r#"{"title": "B", "artist": "X", "durationSec": 10}"#)),
            ("a-song", Some(r#"{"title": "A", "artist": "Y", "durationSec": 20}"#)),
            ("broken", Some("{not json")),
            ("pending", None),
        ] {
            let dir = root.join(slug);
            std::fs::create_dir_all(&dir).unwrap();
            if let Some(meta) = meta {
                std::fs::write(dir.join("meta.json"), meta).unwrap();
            }
        }

        let slugs: Vec<String> = list_tracks(&root).into_iter().map(|t| t.slug).collect();
        assert_eq!(slugs, vec!["a-song".to_string(), "b-song".to_string()]);

        std::fs::remove_dir_all(&root).unwrap();
        assert!(list_tracks(&root).is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let track = TrackInfo::from_meta_json(
            "x",
            r#"{"title": "T", "artist": "A", "durationSec": 2}"#,
        )
        .unwrap();
        let json = serde_json::to_string(&track).unwrap();
        assert!(json.contains("\"durationSec\":2.0"));
        assert!(json.contains("\"scoreUrl\":\"/api/tracks/x/score\""));
        assert!(!json.contains("\"key\""));
    }
}
