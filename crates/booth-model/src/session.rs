//! Capture session state.
//!
//! A session moves `Setup → Capturing → Editing`; the only way back is a
//! reset to `Setup`. Every run of the capture loop gets a fresh run id, and
//! mutations carry the id they were issued under so that a loop abandoned by
//! a reset can never write into the session that replaced it.

use serde::Serialize;
use snapbooth_common::error::{BoothError, BoothResult};

use crate::edit::EditState;
use crate::layout::LayoutDescriptor;
use crate::Frame;

/// Shot counts a session can be configured for.
pub const SLOT_COUNT_OPTIONS: [u32; 4] = [1, 3, 4, 6];

/// Countdown lengths, in seconds, a session can be configured for.
pub const COUNTDOWN_OPTIONS: [u32; 3] = [3, 5, 10];

/// The three mutually exclusive phases of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Choosing layout and timer; no capture running.
    #[default]
    Setup,
    /// The capture loop is running.
    Capturing,
    /// All shots taken; styling and export.
    Editing,
}

/// Parameters fixed when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureConfig {
    /// Layout selected during setup; determines the shot count.
    pub layout: LayoutDescriptor,

    /// Countdown length per shot.
    pub countdown_secs: u32,
}

impl CaptureConfig {
    /// Build a validated capture configuration.
    pub fn new(layout: LayoutDescriptor, countdown_secs: u32) -> BoothResult<Self> {
        let config = Self {
            layout,
            countdown_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Number of shots to take.
    pub fn target_slots(&self) -> u32 {
        self.layout.slot_count
    }

    pub fn validate(&self) -> BoothResult<()> {
        if !SLOT_COUNT_OPTIONS.contains(&self.layout.slot_count) {
            return Err(BoothError::validation(format!(
                "layout {} has {} slots, expected one of {:?}",
                self.layout.id, self.layout.slot_count, SLOT_COUNT_OPTIONS
            )));
        }
        if !COUNTDOWN_OPTIONS.contains(&self.countdown_secs) {
            return Err(BoothError::validation(format!(
                "countdown of {}s, expected one of {:?}",
                self.countdown_secs, COUNTDOWN_OPTIONS
            )));
        }
        Ok(())
    }
}

/// Identifier of one run of the capture loop.
pub type RunId = u64;

/// Mutable aggregate for one booth session.
#[derive(Debug, Default)]
pub struct CaptureSession {
    config: Option<CaptureConfig>,
    frames: Vec<Frame>,
    phase: Phase,
    run_id: RunId,
    edit: Option<EditState>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> Option<&CaptureConfig> {
        self.config.as_ref()
    }

    /// Target shot count of the current run, zero in setup.
    pub fn target_slots(&self) -> u32 {
        self.config.map(|c| c.target_slots()).unwrap_or(0)
    }

    /// Captured frames in capture order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Id of the current run.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Whether `run` is the run this session currently belongs to.
    pub fn is_current(&self, run: RunId) -> bool {
        self.run_id == run
    }

    pub fn edit(&self) -> Option<&EditState> {
        self.edit.as_ref()
    }

    pub fn edit_mut(&mut self) -> Option<&mut EditState> {
        self.edit.as_mut()
    }

    /// `Setup → Capturing`: clear previous frames and start a new run.
    pub fn begin(&mut self, config: CaptureConfig) -> BoothResult<RunId> {
        if self.phase != Phase::Setup {
            return Err(BoothError::sequence(format!(
                "cannot start a session while {:?}",
                self.phase
            )));
        }
        config.validate()?;
        self.run_id = self.run_id.wrapping_add(1);
        self.config = Some(config);
        self.frames.clear();
        self.edit = None;
        self.phase = Phase::Capturing;
        Ok(self.run_id)
    }

    /// Append a frame captured by `run`, in slot order.
    pub fn push_frame(&mut self, run: RunId, frame: Frame) -> BoothResult<usize> {
        self.check_run(run)?;
        if self.frames.len() as u32 >= self.target_slots() {
            return Err(BoothError::sequence("all slots are already filled"));
        }
        self.frames.push(frame);
        Ok(self.frames.len())
    }

    /// `Capturing → Editing`, seeding the edit state.
    pub fn finish(&mut self, run: RunId, edit: EditState) -> BoothResult<()> {
        self.check_run(run)?;
        self.edit = Some(edit);
        self.phase = Phase::Editing;
        Ok(())
    }

    /// Return to `Setup` from any phase, discarding frames and edits.
    /// Invalidates the current run.
    pub fn reset(&mut self) {
        self.run_id = self.run_id.wrapping_add(1);
        self.config = None;
        self.frames.clear();
        self.edit = None;
        self.phase = Phase::Setup;
    }

    fn check_run(&self, run: RunId) -> BoothResult<()> {
        if !self.is_current(run) {
            return Err(BoothError::sequence(format!(
                "run {run} was abandoned (current run is {})",
                self.run_id
            )));
        }
        if self.phase != Phase::Capturing {
            return Err(BoothError::sequence(format!(
                "session is {:?}, not capturing",
                self.phase
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ColorFilter;
    use crate::frame::frame_by_id;
    use crate::layout::{layout_by_id, LAYOUTS};

    fn config(layout: &str, countdown: u32) -> CaptureConfig {
        CaptureConfig::new(layout_by_id(layout).unwrap(), countdown).unwrap()
    }

    fn edit_for(session: &CaptureSession) -> EditState {
        EditState::new(
            session.config().unwrap().layout,
            frame_by_id("white").unwrap(),
            ColorFilter::normal(),
            session.frames().len(),
        )
    }

    #[test]
    fn test_config_validation() {
        for layout in LAYOUTS {
            for countdown in COUNTDOWN_OPTIONS {
                assert!(CaptureConfig::new(layout, countdown).is_ok());
            }
        }
        let grid = layout_by_id("grid-4").unwrap();
        assert!(CaptureConfig::new(grid, 4).is_err());

        let mut odd = grid;
        odd.slot_count = 2;
        assert!(CaptureConfig::new(odd, 3).is_err());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut session = CaptureSession::new();
        assert_eq!(session.phase(), Phase::Setup);

        let run = session.begin(config("grid-4", 3)).unwrap();
        assert_eq!(session.phase(), Phase::Capturing);
        assert_eq!(session.target_slots(), 4);

        for i in 0..4 {
            let count = session.push_frame(run, Frame::new(2, 2)).unwrap();
            assert_eq!(count, i + 1);
        }
        assert!(session.push_frame(run, Frame::new(2, 2)).is_err());

        let edit = edit_for(&session);
        session.finish(run, edit).unwrap();
        assert_eq!(session.phase(), Phase::Editing);
        assert_eq!(session.edit().unwrap().photo_order(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_begin_requires_setup() {
        let mut session = CaptureSession::new();
        session.begin(config("solo", 3)).unwrap();
        assert!(session.begin(config("solo", 3)).is_err());
    }

    #[test]
    fn test_reset_invalidates_run() {
        let mut session = CaptureSession::new();
        let run = session.begin(config("strip-4", 5)).unwrap();
        session.push_frame(run, Frame::new(1, 1)).unwrap();

        session.reset();
        assert_eq!(session.phase(), Phase::Setup);
        assert!(session.frames().is_empty());
        assert!(session.push_frame(run, Frame::new(1, 1)).is_err());

        let next = session.begin(config("strip-4", 5)).unwrap();
        assert_ne!(run, next);
        assert!(session.push_frame(run, Frame::new(1, 1)).is_err());
        assert!(session.frames().is_empty());
    }

    #[test]
    fn test_finish_with_partial_frames() {
        let mut session = CaptureSession::new();
        let run = session.begin(config("grid-6", 10)).unwrap();
        session.push_frame(run, Frame::new(1, 1)).unwrap();
        let edit = edit_for(&session);
        session.finish(run, edit).unwrap();
        assert_eq!(session.frames().len(), 1);
        assert_eq!(session.edit().unwrap().photo_order(), &[0]);
    }
}
