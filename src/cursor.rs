//! Cursor driver: moves a renderer-owned notation cursor to a target
//! pitched-element index with as few calls as possible.
//!
//! The renderer's cursor is stateful and only knows how to rewind to the
//! start and step to the next note, and any of its calls may fail while
//! the score is still being drawn. The driver remembers where it last put
//! the cursor and picks between stepping forward and rewinding.

use thiserror::Error;

/// Forward moves up to this many notes are done by stepping instead of
/// rewinding.
pub const DEFAULT_STEP_THRESHOLD: usize = 5;

/// Failure reported by a renderer cursor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CursorError {
    /// The score has not finished rendering yet.
    #[error("score is not rendered yet")]
    NotReady,
    /// Stepped past the last note the renderer knows about.
    #[error("cursor advanced past the last element")]
    OutOfRange,
    /// Any other renderer failure.
    #[error("renderer cursor error: {0}")]
    Renderer(String),
}

/// Capability interface over the renderer's cursor.
///
/// Every operation is fallible; the driver treats failures as recoverable.
pub trait ScoreCursor {
    /// Move the cursor back to the first pitched element.
    fn reset(&mut self) -> Result<(), CursorError>;
    /// Move the cursor to the next pitched element.
    fn advance_one(&mut self) -> Result<(), CursorError>;
    /// Show or hide the cursor.
    fn set_visible(&mut self, visible: bool) -> Result<(), CursorError>;
}

impl<C: ScoreCursor + ?Sized> ScoreCursor for Box<C> {
    fn reset(&mut self) -> Result<(), CursorError> {
        (**self).reset()
    }

    fn advance_one(&mut self) -> Result<(), CursorError> {
        (**self).advance_one()
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), CursorError> {
        (**self).set_visible(visible)
    }
}

/// Lifecycle of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No score installed; moves are ignored.
    Idle,
    /// Score installed, cursor at the first note.
    Ready,
    /// At least one move has been made since the score was installed.
    Tracking,
}

/// What a move request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No score installed.
    Ignored,
    /// Already at the target; no cursor calls were made.
    Hold,
    /// Stepped forward this many notes.
    Step(usize),
    /// Rewound to the start and stepped forward this many notes.
    Rewind(usize),
    /// A cursor call failed; the index was left unchanged.
    Failed,
}

/// Drives a [`ScoreCursor`] to target indices.
#[derive(Debug)]
pub struct CursorDriver<C> {
    cursor: C,
    current_index: usize,
    step_threshold: usize,
    state: DriverState,
}

impl<C: ScoreCursor> CursorDriver<C> {
    pub fn new(cursor: C) -> Self {
        Self::with_threshold(cursor, DEFAULT_STEP_THRESHOLD)
    }

    pub fn with_threshold(cursor: C, step_threshold: usize) -> Self {
        Self {
            cursor,
            current_index: 0,
            step_threshold,
            state: DriverState::Idle,
        }
    }

    /// Index the cursor was last successfully moved to.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn cursor(&self) -> &C {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut C {
        &mut self.cursor
    }

    /// Called when a score has been (re)loaded: rewind and show the
    /// cursor, and start counting from the first note again.
    pub fn install(&mut self) {
        self.current_index = 0;
        self.state = DriverState::Ready;
        let result = self
            .cursor
            .reset()
            .and_then(|_| self.cursor.set_visible(true));
        if let Err(e) = result {
            log::warn!("could not prepare cursor for new score: {e}");
        }
    }

    /// Forget the score; later moves are ignored until the next install.
    pub fn uninstall(&mut self) {
        self.state = DriverState::Idle;
        self.current_index = 0;
        if let Err(e) = self.cursor.set_visible(false) {
            log::debug!("could not hide cursor: {e}");
        }
    }

    /// Move to `target_index`, stepping forward for small advances and
    /// rewinding otherwise. Failures are logged, never returned.
    pub fn advance_to(&mut self, target_index: usize) -> Transition {
        if self.state == DriverState::Idle {
            return Transition::Ignored;
        }
        if target_index == self.current_index {
            return Transition::Hold;
        }

        let delta = target_index.wrapping_sub(self.current_index);
        if target_index > self.current_index && delta <= self.step_threshold {
            self.run(target_index, Transition::Step(delta), |cursor| {
                step(cursor, delta)
            })
        } else {
            self.rewind_to(target_index)
        }
    }

    /// Rewind and fast-forward to `target_index`, whatever the current
    /// index is. Used for scrub events.
    pub fn jump_to(&mut self, target_index: usize) -> Transition {
        if self.state == DriverState::Idle {
            return Transition::Ignored;
        }
        self.rewind_to(target_index)
    }

    fn rewind_to(&mut self, target_index: usize) -> Transition {
        self.run(target_index, Transition::Rewind(target_index), |cursor| {
            cursor.reset()?;
            step(cursor, target_index)
        })
    }

    fn run<F>(&mut self, target_index: usize, transition: Transition, moves: F) -> Transition
    where
        F: FnOnce(&mut C) -> Result<(), CursorError>,
    {
        match moves(&mut self.cursor) {
            Ok(()) => {
                log::trace!("cursor {} -> {target_index} ({transition:?})", self.current_index);
                self.current_index = target_index;
                self.state = DriverState::Tracking;
                transition
            }
            Err(e) => {
                log::error!(
                    "failed to move cursor to index {target_index} (current {}): {e}",
                    self.current_index
                );
                Transition::Failed
            }
        }
    }
}

fn step<C: ScoreCursor>(cursor: &mut C, count: usize) -> Result<(), CursorError> {
    for _ in 0..count {
        cursor.advance_one()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Records every call; fails `advance_one` past `limit` if set.
    #[derive(Debug, Default)]
    struct MockCursor {
        resets: usize,
        steps: usize,
        visible: Option<bool>,
        position: usize,
        limit: Option<usize>,
        not_ready: bool,
    }

    impl MockCursor {
        fn clear_counts(&mut self) {
            self.resets = 0;
            self.steps = 0;
        }
    }

    impl ScoreCursor for MockCursor {
        fn reset(&mut self) -> Result<(), CursorError> {
            if self.not_ready {
                return Err(CursorError::NotReady);
            }
            self.resets += 1;
            self.position = 0;
            Ok(())
        }

        fn advance_one(&mut self) -> Result<(), CursorError> {
            if self.not_ready {
                return Err(CursorError::NotReady);
            }
            if self.limit.is_some_and(|l| self.position >= l) {
                return Err(CursorError::OutOfRange);
            }
            self.steps += 1;
            self.position += 1;
            Ok(())
        }

        fn set_visible(&mut self, visible: bool) -> Result<(), CursorError> {
            self.visible = Some(visible);
            Ok(())
        }
    }

    fn ready_driver() -> CursorDriver<MockCursor> {
        let mut driver = CursorDriver::new(MockCursor::default());
        driver.install();
        driver.cursor_mut().clear_counts();
        driver
    }

    #[test]
    fn install_rewinds_and_shows() {
        let mut driver = CursorDriver::new(MockCursor::default());
        assert_eq!(driver.state(), DriverState::Idle);
        driver.install();
        assert_eq!(driver.state(), DriverState::Ready);
        assert_eq!(driver.cursor().resets, 1);
        assert_eq!(driver.cursor().visible, Some(true));
    }

    #[test]
    fn idle_driver_ignores_moves() {
        let mut driver = CursorDriver::new(MockCursor::default());
        assert_eq!(driver.advance_to(3), Transition::Ignored);
        assert_eq!(driver.jump_to(3), Transition::Ignored);
        assert_eq!(driver.cursor().steps, 0);
        assert_eq!(driver.current_index(), 0);
    }

    #[test]
    fn same_target_makes_no_calls() {
        let mut driver = ready_driver();
        assert_eq!(driver.advance_to(0), Transition::Hold);
        assert_eq!(driver.cursor().resets, 0);
        assert_eq!(driver.cursor().steps, 0);
        assert_eq!(driver.state(), DriverState::Ready);
    }

    #[test]
    fn small_forward_moves_step() {
        for delta in 1..=5 {
            let mut driver = ready_driver();
            assert_eq!(driver.advance_to(delta), Transition::Step(delta));
            assert_eq!(driver.cursor().resets, 0);
            assert_eq!(driver.cursor().steps, delta);
            assert_eq!(driver.current_index(), delta);
            assert_eq!(driver.state(), DriverState::Tracking);
        }
    }

    #[test]
    fn large_forward_jump_rewinds() {
        let mut driver = ready_driver();
        driver.advance_to(2);
        driver.cursor_mut().clear_counts();
        assert_eq!(driver.advance_to(8), Transition::Rewind(8));
        assert_eq!(driver.cursor().resets, 1);
        assert_eq!(driver.cursor().steps, 8);
        assert_eq!(driver.cursor().position, 8);
    }

    #[test]
    fn backward_move_rewinds() {
        let mut driver = ready_driver();
        driver.jump_to(10);
        driver.cursor_mut().clear_counts();
        assert_eq!(driver.advance_to(2), Transition::Rewind(2));
        assert_eq!(driver.cursor().resets, 1);
        assert_eq!(driver.cursor().steps, 2);
        assert_eq!(driver.current_index(), 2);
    }

    #[test]
    fn jump_always_rewinds() {
        let mut driver = ready_driver();
        driver.advance_to(1);
        driver.cursor_mut().clear_counts();
        assert_eq!(driver.jump_to(3), Transition::Rewind(3));
        assert_eq!(driver.cursor().resets, 1);
        assert_eq!(driver.cursor().steps, 3);
    }

    #[test]
    fn custom_threshold() {
        let mut driver = CursorDriver::with_threshold(MockCursor::default(), 1);
        driver.install();
        driver.cursor_mut().clear_counts();
        assert_eq!(driver.advance_to(2), Transition::Rewind(2));
    }

    #[test]
    fn failure_keeps_last_good_index() {
        let mut driver = ready_driver();
        driver.advance_to(3);
        driver.cursor_mut().limit = Some(4);
        assert_eq!(driver.advance_to(6), Transition::Failed);
        assert_eq!(driver.current_index(), 3);

        // A later reachable target still works.
        assert_eq!(driver.advance_to(2), Transition::Rewind(2));
        assert_eq!(driver.current_index(), 2);
    }

    #[test]
    fn not_ready_cursor_is_swallowed() {
        let mut driver = CursorDriver::new(MockCursor {
            not_ready: true,
            ..Default::default()
        });
        driver.install();
        assert_eq!(driver.state(), DriverState::Ready);
        assert_eq!(driver.advance_to(1), Transition::Failed);
        assert_eq!(driver.current_index(), 0);
    }

    #[test]
    fn reinstall_resets_index() {
        let mut driver = ready_driver();
        driver.advance_to(4);
        driver.install();
        assert_eq!(driver.current_index(), 0);
        assert_eq!(driver.state(), DriverState::Ready);
    }

    #[test]
    fn uninstall_hides_and_idles() {
        let mut driver = ready_driver();
        driver.advance_to(2);
        driver.uninstall();
        assert_eq!(driver.state(), DriverState::Idle);
        assert_eq!(driver.cursor().visible, Some(false));
        assert_eq!(driver.advance_to(1), Transition::Ignored);
    }
}
