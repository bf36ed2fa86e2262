//! Temporal locator: which pitched element is sounding at a given time.
//!
//! The lookup holds the cursor on the most recent note while a rest is
//! sounding, floors at the first note before the score starts, and holds
//! at the last note once the score has ended. It keeps no state between
//! calls, so a backward jump simply yields a smaller index.

use std::fmt;

use crate::timemap::ScoreTimeModel;

/// Largest offset magnitude a user can dial in, in seconds.
pub const MAX_OFFSET_SECONDS: f64 = 2.0;
/// Offset granularity in seconds.
pub const OFFSET_STEP_SECONDS: f64 = 0.1;

/// Cursor index of the pitched element current at `elapsed_seconds`.
///
/// Walks the elements in order. A pitched element whose half-open span
/// `[onset, onset + duration)` contains the time wins immediately. Once an
/// element ends after the requested time without a match (the time sits in
/// a rest, or before the first note), the last pitched element seen is
/// returned. Past the end of the score the final pitched index is returned.
pub fn locate(model: &ScoreTimeModel, elapsed_seconds: f64) -> usize {
    let mut pitched_index = 0;
    let mut last_pitched_index = 0;

    for element in &model.elements {
        let end = element.end_seconds();

        if element.is_pitched {
            if elapsed_seconds >= element.onset_seconds && elapsed_seconds < end {
                return pitched_index;
            }
            last_pitched_index = pitched_index;
            pitched_index += 1;
        }

        if end > elapsed_seconds {
            return last_pitched_index;
        }
    }

    last_pitched_index
}

/// User-adjustable audio/score drift correction.
///
/// Always within `±MAX_OFFSET_SECONDS` and a multiple of
/// `OFFSET_STEP_SECONDS`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SyncOffset(f64);

impl SyncOffset {
    pub const ZERO: SyncOffset = SyncOffset(0.0);

    /// Clamp to the default range and snap to the default step.
    pub fn new(seconds: f64) -> Self {
        Self::with_bounds(seconds, MAX_OFFSET_SECONDS, OFFSET_STEP_SECONDS)
    }

    /// Clamp to `±limit` and snap to the nearest multiple of `step`.
    /// Non-finite input becomes zero.
    pub fn with_bounds(seconds: f64, limit: f64, step: f64) -> Self {
        if !seconds.is_finite() {
            return Self::ZERO;
        }
        let clamped = seconds.clamp(-limit.abs(), limit.abs());
        let snapped = if step > 0.0 {
            (clamped / step).round() * step
        } else {
            clamped
        };
        // Snap off float noise like 0.30000000000000004, and -0.0.
        let tidy = (snapped * 1000.0).round() / 1000.0;
        SyncOffset(if tidy == 0.0 { 0.0 } else { tidy })
    }

    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Shift a playback time by the offset.
    pub fn apply(self, elapsed_seconds: f64) -> f64 {
        elapsed_seconds + self.0
    }
}

impl fmt::Display for SyncOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 > 0.0 { "+" } else { "" };
        write!(f, "{sign}{:.1}s", self.0)
    }
}

/// Progress-bar position: elapsed as a percentage of total, clamped to
/// [0, 100]. Zero while the total is unknown.
pub fn playhead_percent(elapsed_seconds: f64, total_seconds: f64) -> f64 {
    if !(total_seconds > 0.0) || !elapsed_seconds.is_finite() {
        return 0.0;
    }
    (elapsed_seconds / total_seconds * 100.0).clamp(0.0, 100.0)
}

/// Transport clock label, `m:ss`. Negative times read as 0:00.
pub fn format_clock(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", whole / 60, whole % 60)
}
