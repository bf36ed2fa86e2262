//! Sync session: ties the time model, the locator and the cursor driver
//! to a playback clock.
//!
//! Two triggers move the cursor. While audio plays, the host delivers one
//! animation frame at a time through [`SyncSession::on_frame`], and the
//! session asks its [`FrameScheduler`] for the next one. Scrub events go
//! through [`SyncSession::scrub_to`] synchronously and bypass the frame
//! loop. Everything runs on the host's single UI thread.

use crate::config::SyncConfig;
use crate::cursor::{CursorDriver, DriverState, ScoreCursor, Transition};
use crate::locator::{locate, playhead_percent, SyncOffset};
use crate::model::ScoreDocument;
use crate::timemap::{build_with_defaults, ScoreTimeModel};

/// Identifies one requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// The host's animation-frame API (`requestAnimationFrame` or a display
/// link). Each request results in at most one `on_frame` call carrying
/// the returned handle, unless it is cancelled first.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// What the session produced for one clock reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUpdate {
    /// Raw audio position in seconds
    pub audio_seconds: f64,
    /// Audio position with the user offset applied; used for lookup
    pub elapsed_seconds: f64,
    /// Pitched-element index the cursor should show
    pub index: usize,
    /// Progress-bar position, 0..=100
    pub playhead_percent: f64,
    /// How the cursor was moved
    pub transition: Transition,
}

pub struct SyncSession<C: ScoreCursor, S: FrameScheduler> {
    config: SyncConfig,
    model: Option<ScoreTimeModel>,
    driver: CursorDriver<C>,
    scheduler: S,
    pending_frame: Option<FrameHandle>,
    playing: bool,
    offset: SyncOffset,
    audio_duration: Option<f64>,
    last_update: Option<FrameUpdate>,
}

impl<C: ScoreCursor, S: FrameScheduler> SyncSession<C, S> {
    pub fn new(cursor: C, scheduler: S) -> Self {
        Self::with_config(SyncConfig::default(), cursor, scheduler)
    }

    pub fn with_config(config: SyncConfig, cursor: C, scheduler: S) -> Self {
        let driver = CursorDriver::with_threshold(cursor, config.step_threshold);
        Self {
            config,
            model: None,
            driver,
            scheduler,
            pending_frame: None,
            playing: false,
            offset: SyncOffset::ZERO,
            audio_duration: None,
            last_update: None,
        }
    }

    // ─── Score lifecycle ────────────────────────────────────────────

    /// Build a time model for a freshly loaded document and install it.
    pub fn load_document(&mut self, score: &ScoreDocument) {
        let model = build_with_defaults(
            score,
            self.config.default_tempo_bpm,
            self.config.default_divisions,
        );
        self.install_model(model);
    }

    /// Replace the time model. The cursor is rewound to the first note and
    /// a running frame loop restarts against the new model.
    pub fn install_model(&mut self, model: ScoreTimeModel) {
        log::info!(
            "installing score: {} elements, {} pitched, {:.2}s",
            model.elements.len(),
            model.pitched_count(),
            model.total_duration_seconds
        );
        self.cancel_pending_frame();
        self.model = Some(model);
        self.last_update = None;
        self.driver.install();
        if self.playing {
            self.schedule_frame();
        }
    }

    /// Drop the current model; the cursor is hidden and moves are ignored.
    pub fn unload(&mut self) {
        self.cancel_pending_frame();
        self.model = None;
        self.last_update = None;
        self.driver.uninstall();
    }

    pub fn model(&self) -> Option<&ScoreTimeModel> {
        self.model.as_ref()
    }

    pub fn driver(&self) -> &CursorDriver<C> {
        &self.driver
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn state(&self) -> DriverState {
        self.driver.state()
    }

    // ─── Transport ──────────────────────────────────────────────────

    /// Duration reported by the audio element once its metadata loads.
    pub fn set_audio_duration(&mut self, seconds: f64) {
        self.audio_duration = (seconds.is_finite() && seconds > 0.0).then_some(seconds);
    }

    /// Length used for the playhead and fractional scrubs: the audio
    /// duration when known, else the score's own length.
    pub fn total_seconds(&self) -> f64 {
        self.audio_duration
            .or_else(|| self.model.as_ref().map(|m| m.total_duration_seconds))
            .unwrap_or(0.0)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Start the frame loop.
    pub fn play(&mut self) {
        if self.playing {
            return;
        }
        self.playing = true;
        self.schedule_frame();
    }

    /// Stop the frame loop; the pending frame is cancelled right away.
    pub fn pause(&mut self) {
        self.playing = false;
        self.cancel_pending_frame();
    }

    /// Set the user offset, clamped and snapped to the configured bounds.
    pub fn set_offset(&mut self, seconds: f64) -> SyncOffset {
        self.offset = SyncOffset::with_bounds(
            seconds,
            self.config.offset_limit_seconds,
            self.config.offset_step_seconds,
        );
        self.offset
    }

    pub fn offset(&self) -> SyncOffset {
        self.offset
    }

    pub fn last_update(&self) -> Option<FrameUpdate> {
        self.last_update
    }

    // ─── Triggers ───────────────────────────────────────────────────

    /// Handle an animation frame. `audio_seconds` is the audio element's
    /// current position. Frames that were cancelled or superseded are
    /// ignored and return `None`.
    pub fn on_frame(&mut self, handle: FrameHandle, audio_seconds: f64) -> Option<FrameUpdate> {
        if self.pending_frame != Some(handle) {
            log::trace!("ignoring stale frame {handle:?}");
            return None;
        }
        self.pending_frame = None;
        if !self.playing {
            return None;
        }

        let update = self.track(audio_seconds, false);
        self.schedule_frame();
        update
    }

    /// Jump to an absolute audio position (the host seeks the audio
    /// element itself). The cursor is rewound and fast-forwarded.
    pub fn scrub_to(&mut self, audio_seconds: f64) -> Option<FrameUpdate> {
        self.track(audio_seconds, true)
    }

    /// Jump to a fraction (0..=1) of the total length, as from a click
    /// on the progress bar. Returns the update; its `audio_seconds` is
    /// where the audio should seek to.
    pub fn scrub_to_fraction(&mut self, fraction: f64) -> Option<FrameUpdate> {
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        self.scrub_to(fraction * self.total_seconds())
    }

    fn track(&mut self, audio_seconds: f64, jump: bool) -> Option<FrameUpdate> {
        let model = self.model.as_ref()?;
        let elapsed_seconds = self.offset.apply(audio_seconds);
        let index = locate(model, elapsed_seconds);
        let playhead = playhead_percent(elapsed_seconds, self.total_seconds());

        let transition = if jump {
            self.driver.jump_to(index)
        } else {
            self.driver.advance_to(index)
        };
        if transition != Transition::Hold {
            log::debug!(
                "t={elapsed_seconds:.2}s index={index} {transition:?}{}",
                if jump { " (scrub)" } else { "" }
            );
        }

        let update = FrameUpdate {
            audio_seconds,
            elapsed_seconds,
            index,
            playhead_percent: playhead,
            transition,
        };
        self.last_update = Some(update);
        Some(update)
    }

    fn schedule_frame(&mut self) {
        if self.model.is_none() || self.pending_frame.is_some() {
            return;
        }
        self.pending_frame = Some(self.scheduler.request_frame());
    }

    fn cancel_pending_frame(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel_frame(handle);
        }
    }
}

impl<C: ScoreCursor, S: FrameScheduler> Drop for SyncSession<C, S> {
    fn drop(&mut self) {
        self.cancel_pending_frame();
    }
}
