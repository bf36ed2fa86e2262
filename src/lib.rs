//! scoresync: score-following engine for the karaoke player.
//!
//! Loads a MusicXML melody score (uncompressed `.musicxml` or compressed
//! `.mxl`), turns it into a time-ordered index of notes and rests, and
//! drives a notation cursor so it follows audio playback.
//!
//! # Example
//! ```no_run
//! use scoresync::{load_time_model, locate};
//!
//! let model = load_time_model("path/to/melody.musicxml").unwrap();
//! println!("Tempo: {} bpm", model.tempo_bpm);
//! println!("Length: {:.1}s", model.total_duration_seconds);
//! println!("Note at 12.5s: {}", locate(&model, 12.5));
//! ```

pub mod config;
pub mod cursor;
pub mod locator;
pub mod model;
pub mod mxl;
pub mod parser;
pub mod session;
pub mod timemap;
pub mod track;

#[cfg(target_os = "android")]
pub mod android;

use std::path::Path;

pub use config::SyncConfig;
pub use cursor::{CursorDriver, CursorError, DriverState, ScoreCursor, Transition};
pub use locator::{format_clock, locate, playhead_percent, SyncOffset};
pub use model::*;
pub use mxl::parse_mxl;
pub use parser::parse_musicxml;
pub use session::{FrameHandle, FrameScheduler, FrameUpdate, SyncSession};
pub use timemap::{ScoreElement, ScoreTimeModel};
pub use track::TrackInfo;

/// Parse a MusicXML file from a file path.
/// Automatically detects format based on file extension:
/// - `.musicxml` or `.xml` → uncompressed MusicXML
/// - `.mxl` → compressed MXL (ZIP archive)
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ScoreDocument, String> {
    let path = path.as_ref();
    let data = std::fs::read(path)
        .map_err(|e| format!("Failed to read file '{}': {e}", path.display()))?;

    parse_bytes(&data, path.extension().and_then(|e| e.to_str()))
}

/// Parse MusicXML from raw bytes with an optional format hint.
/// If `extension` is None, tries to auto-detect the format.
pub fn parse_bytes(data: &[u8], extension: Option<&str>) -> Result<ScoreDocument, String> {
    match extension {
        Some("mxl") => parse_mxl(data),
        Some("musicxml") | Some("xml") => {
            let xml = std::str::from_utf8(data)
                .map_err(|e| format!("Invalid UTF-8 in MusicXML file: {e}"))?;
            parse_musicxml(xml)
        }
        _ => {
            // Auto-detect: try as XML first, then as MXL
            if let Ok(xml) = std::str::from_utf8(data) {
                if xml.trim_start().starts_with('<') {
                    return parse_musicxml(xml);
                }
            }
            parse_mxl(data)
        }
    }
}

/// Parse a score file and build its time model with the default tempo
/// and divisions.
pub fn load_time_model<P: AsRef<Path>>(path: P) -> Result<ScoreTimeModel, String> {
    let score = parse_file(path)?;
    Ok(timemap::build(&score))
}

/// Parse score bytes and build its time model with the default tempo and
/// divisions.
pub fn time_model_from_bytes(
    data: &[u8],
    extension: Option<&str>,
) -> Result<ScoreTimeModel, String> {
    let score = parse_bytes(data, extension)?;
    Ok(timemap::build(&score))
}

/// Convert a time model to a JSON string.
/// Useful for passing data across FFI boundaries.
pub fn time_model_to_json(model: &ScoreTimeModel) -> Result<String, String> {
    serde_json::to_string_pretty(model).map_err(|e| format!("JSON serialization error: {e}"))
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI for iOS (static library) and Android (JNI)
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Parse score bytes and return an owned time model handle.
/// The caller must release it with `scoresync_model_free`.
/// Returns null if the bytes cannot be parsed.
///
/// # Safety
/// `data` must point to `len` valid bytes. `extension` may be null.
#[no_mangle]
pub unsafe extern "C" fn scoresync_model_from_bytes(
    data: *const u8,
    len: usize,
    extension: *const c_char,
) -> *mut ScoreTimeModel {
    if data.is_null() || len == 0 {
        return std::ptr::null_mut();
    }
    let bytes = unsafe { std::slice::from_raw_parts(data, len) };
    let ext = if extension.is_null() {
        None
    } else {
        unsafe { CStr::from_ptr(extension) }.to_str().ok()
    };

    match time_model_from_bytes(bytes, ext) {
        Ok(model) => Box::into_raw(Box::new(model)),
        Err(e) => {
            log::error!("scoresync_model_from_bytes: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Cursor index current at `elapsed_seconds` (offset already applied).
/// A null model yields 0.
///
/// # Safety
/// `model` must be null or a handle from `scoresync_model_from_bytes`.
#[no_mangle]
pub unsafe extern "C" fn scoresync_locate(model: *const ScoreTimeModel, elapsed_seconds: f64) -> usize {
    match unsafe { model.as_ref() } {
        Some(model) => locate(model, elapsed_seconds),
        None => 0,
    }
}

/// Total score length in seconds. A null model yields 0.
///
/// # Safety
/// `model` must be null or a handle from `scoresync_model_from_bytes`.
#[no_mangle]
pub unsafe extern "C" fn scoresync_model_total_seconds(model: *const ScoreTimeModel) -> f64 {
    unsafe { model.as_ref() }.map_or(0.0, |m| m.total_duration_seconds)
}

/// Serialize a time model to JSON as a C string.
/// The caller must free the returned string with `scoresync_free_string`.
///
/// # Safety
/// `model` must be null or a handle from `scoresync_model_from_bytes`.
#[no_mangle]
pub unsafe extern "C" fn scoresync_model_json(model: *const ScoreTimeModel) -> *mut c_char {
    let Some(model) = (unsafe { model.as_ref() }) else {
        return std::ptr::null_mut();
    };
    match time_model_to_json(model) {
        Ok(json) => CString::new(json).unwrap_or_default().into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Free a time model handle.
///
/// # Safety
/// `model` must be a handle from `scoresync_model_from_bytes`, or null.
#[no_mangle]
pub unsafe extern "C" fn scoresync_model_free(model: *mut ScoreTimeModel) {
    if !model.is_null() {
        unsafe {
            drop(Box::from_raw(model));
        }
    }
}

/// Free a string previously returned by scoresync functions.
///
/// # Safety
/// `ptr` must be a string previously returned by a scoresync function, or null.
#[no_mangle]
pub unsafe extern "C" fn scoresync_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
