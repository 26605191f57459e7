//! The timed capture sequence.
//!
//! One run of the loop: settle, then for every slot a countdown of one tick
//! per second, a shutter flash, a capture from the video source and, unless
//! it was the last slot, an inter-shot pause. When every slot has been
//! attempted the session moves to editing.
//!
//! Each run carries the run id it was started under. Every event it emits
//! and every frame it appends is checked against the session's current run
//! id under the session lock, so a run abandoned by [`SequenceController::restart`]
//! cannot leak ticks, flashes or frames into the session that replaced it.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use snapbooth_common::clock::SessionClock;
use snapbooth_common::config::{AppConfig, MissedShotPolicy};
use snapbooth_common::error::{BoothError, BoothResult};
use snapbooth_model::{
    filter_by_name, frame_by_id, CaptureConfig, CaptureSession, ColorFilter, EditState, Frame,
    FrameStyle, Phase, RunId, DEFAULT_FRAME_ID, FRAMES, MAX_BRIGHTNESS, MIN_BRIGHTNESS,
};
use tokio::sync::broadcast;
use tokio::task::{AbortHandle, JoinHandle};

use crate::source::VideoSource;

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Delays of the capture loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceTiming {
    /// Before the first countdown, so the live preview can stabilize.
    pub settle: Duration,
    /// Between countdown values.
    pub tick: Duration,
    /// How long the shutter flash stays on.
    pub flash: Duration,
    /// Between a capture and the next slot's countdown.
    pub inter_shot: Duration,
    /// Before the second attempt under [`MissedShotPolicy::RetryOnce`].
    pub retry_delay: Duration,
}

impl Default for SequenceTiming {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(800),
            tick: Duration::from_secs(1),
            flash: Duration::from_millis(150),
            inter_shot: Duration::from_millis(1500),
            retry_delay: Duration::from_millis(300),
        }
    }
}

impl SequenceTiming {
    /// No delays at all. Events are still emitted in order.
    pub fn instant() -> Self {
        Self {
            settle: Duration::ZERO,
            tick: Duration::ZERO,
            flash: Duration::ZERO,
            inter_shot: Duration::ZERO,
            retry_delay: Duration::ZERO,
        }
    }

    /// Wall time of a run in which every shot succeeds first time.
    pub fn expected_duration(&self, target_slots: u32, countdown_secs: u32) -> Duration {
        if target_slots == 0 {
            return Duration::ZERO;
        }
        self.settle
            + self.tick * (target_slots * countdown_secs)
            + self.inter_shot * (target_slots - 1)
    }
}

/// Observable side effects of the capture loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoothEvent {
    PhaseChanged { run: RunId, phase: Phase },
    /// Countdown value for the shot at `slot`; counts down to 1.
    CountdownTick { run: RunId, slot: u32, remaining: u32 },
    Flash { run: RunId, slot: u32, on: bool },
    /// `captured` frames of `target` are now in the session.
    ShotCaptured {
        run: RunId,
        slot: u32,
        captured: usize,
        target: u32,
    },
    /// The source had no frame; the slot stays empty.
    ShotMissed { run: RunId, slot: u32 },
}

impl BoothEvent {
    pub fn run(&self) -> RunId {
        match self {
            Self::PhaseChanged { run, .. }
            | Self::CountdownTick { run, .. }
            | Self::Flash { run, .. }
            | Self::ShotCaptured { run, .. }
            | Self::ShotMissed { run, .. } => *run,
        }
    }
}

/// Style selections an edit state starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSeed {
    pub frame: FrameStyle,
    pub filter: ColorFilter,
    pub brightness: u32,
}

impl Default for StyleSeed {
    fn default() -> Self {
        Self {
            frame: frame_by_id(DEFAULT_FRAME_ID).unwrap_or(FRAMES[0]),
            filter: ColorFilter::normal(),
            brightness: 100,
        }
    }
}

/// Controller settings.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub timing: SequenceTiming,
    pub missed_shot: MissedShotPolicy,
    /// Flip captured frames horizontally.
    pub mirror: bool,
    pub style: StyleSeed,
    pub event_capacity: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            timing: SequenceTiming::default(),
            missed_shot: MissedShotPolicy::default(),
            mirror: true,
            style: StyleSeed::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ControllerOptions {
    /// Options from the application config. Unknown style ids are an error.
    pub fn from_config(config: &AppConfig) -> BoothResult<Self> {
        let brightness = config.style.brightness;
        if !(MIN_BRIGHTNESS..=MAX_BRIGHTNESS).contains(&brightness) {
            return Err(BoothError::config(format!(
                "default brightness {brightness}% outside [{MIN_BRIGHTNESS}, {MAX_BRIGHTNESS}]"
            )));
        }
        Ok(Self {
            timing: SequenceTiming::default(),
            missed_shot: config.capture.missed_shot,
            mirror: config.capture.mirror,
            style: StyleSeed {
                frame: frame_by_id(&config.style.frame)?,
                filter: filter_by_name(&config.style.filter)?,
                brightness,
            },
            event_capacity: DEFAULT_EVENT_CAPACITY,
        })
    }
}

/// State shared between the controller and its capture task.
struct Shared {
    session: Mutex<CaptureSession>,
    events: broadcast::Sender<BoothEvent>,
    timers: Mutex<Vec<AbortHandle>>,
}

impl Shared {
    fn session(&self) -> MutexGuard<'_, CaptureSession> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_current(&self, run: RunId) -> bool {
        self.session().is_current(run)
    }

    /// Send `event` if `run` is still the session's run.
    fn emit(&self, run: RunId, event: BoothEvent) -> bool {
        let session = self.session();
        if !session.is_current(run) {
            return false;
        }
        // No subscribers is fine.
        let _ = self.events.send(event);
        true
    }

    fn track_timer(&self, handle: AbortHandle) {
        let mut timers = self
            .timers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        timers.retain(|h| !h.is_finished());
        timers.push(handle);
    }

    fn abort_timers(&self) {
        let mut timers = self
            .timers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for handle in timers.drain(..) {
            handle.abort();
        }
    }
}

/// Owns the capture session and drives it through the timed sequence.
pub struct SequenceController {
    source: Arc<dyn VideoSource>,
    options: ControllerOptions,
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl SequenceController {
    pub fn new(source: Arc<dyn VideoSource>, options: ControllerOptions) -> Self {
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            source,
            options,
            shared: Arc::new(Shared {
                session: Mutex::new(CaptureSession::new()),
                events,
                timers: Mutex::new(Vec::new()),
            }),
            task: None,
        }
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// Receive events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<BoothEvent> {
        self.shared.events.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.shared.session().phase()
    }

    /// Lock the session for reading or editing.
    pub fn session(&self) -> MutexGuard<'_, CaptureSession> {
        self.shared.session()
    }

    /// Frames captured so far and the target count.
    pub fn progress(&self) -> (usize, u32) {
        let session = self.shared.session();
        (session.frames().len(), session.target_slots())
    }

    /// Whether a capture task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// `Setup → Capturing`. Opens the source first; if it cannot deliver
    /// frames the session stays in setup.
    pub async fn start_session(&mut self, config: CaptureConfig) -> BoothResult<RunId> {
        config.validate()?;
        let phase = self.phase();
        if phase != Phase::Setup {
            return Err(BoothError::sequence(format!(
                "cannot start a session while {phase:?}"
            )));
        }

        if let Err(e) = self.source.open().await {
            tracing::warn!(source = self.source.name(), error = %e, "Video source unavailable");
            return Err(match e {
                BoothError::CameraUnavailable { .. } => e,
                other => BoothError::camera_unavailable(other.to_string()),
            });
        }

        if let Some(stale) = self.task.take() {
            stale.abort();
        }
        self.shared.abort_timers();

        let run = self.shared.session().begin(config)?;
        self.shared.emit(
            run,
            BoothEvent::PhaseChanged {
                run,
                phase: Phase::Capturing,
            },
        );
        tracing::info!(
            run,
            layout = config.layout.id,
            slots = config.target_slots(),
            countdown = config.countdown_secs,
            source = self.source.name(),
            "Capture sequence started"
        );

        let task = CaptureTask {
            run,
            config,
            source: Arc::clone(&self.source),
            options: self.options.clone(),
            shared: Arc::clone(&self.shared),
            clock: SessionClock::start(),
        };
        self.task = Some(tokio::spawn(task.run()));
        Ok(run)
    }

    /// Abandon whatever is in flight and return to setup, discarding frames
    /// and edits.
    pub fn restart(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.shared.abort_timers();

        let run = {
            let mut session = self.shared.session();
            let previous = session.phase();
            session.reset();
            tracing::info!(previous = ?previous, run = session.run_id(), "Session reset");
            session.run_id()
        };
        self.shared.emit(
            run,
            BoothEvent::PhaseChanged {
                run,
                phase: Phase::Setup,
            },
        );
    }

    /// Wait for the running sequence to finish, returning the phase it left
    /// the session in. Returns at once when nothing is running.
    ///
    /// Dropping the returned future leaves the task owned by the controller,
    /// so a later [`restart`](Self::restart) still aborts it.
    pub async fn wait(&mut self) -> BoothResult<Phase> {
        if let Some(task) = self.task.as_mut() {
            let joined = task.await;
            self.task = None;
            match joined {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(BoothError::sequence(format!("capture task failed: {e}"))),
            }
        }
        Ok(self.phase())
    }
}

impl Drop for SequenceController {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.shared.abort_timers();
    }
}

/// One run of the capture loop.
struct CaptureTask {
    run: RunId,
    config: CaptureConfig,
    source: Arc<dyn VideoSource>,
    options: ControllerOptions,
    shared: Arc<Shared>,
    clock: SessionClock,
}

impl CaptureTask {
    async fn run(self) {
        let timing = self.options.timing;
        let target = self.config.target_slots();

        tokio::time::sleep(timing.settle).await;

        for slot in 0..target {
            for remaining in (1..=self.config.countdown_secs).rev() {
                if !self.shared.emit(
                    self.run,
                    BoothEvent::CountdownTick {
                        run: self.run,
                        slot,
                        remaining,
                    },
                ) {
                    return;
                }
                tracing::debug!(slot, remaining, "Countdown");
                tokio::time::sleep(timing.tick).await;
            }

            self.flash(slot);

            let frame = match self.capture().await {
                Some(frame) => frame,
                None => {
                    if !self
                        .shared
                        .emit(self.run, BoothEvent::ShotMissed { run: self.run, slot })
                    {
                        return;
                    }
                    tracing::warn!(
                        slot,
                        source = self.source.name(),
                        "No frame at shutter, slot left empty"
                    );
                    if slot + 1 < target {
                        tokio::time::sleep(timing.inter_shot).await;
                    }
                    continue;
                }
            };

            {
                let mut session = self.shared.session();
                let captured = match session.push_frame(self.run, frame) {
                    Ok(count) => count,
                    Err(e) => {
                        tracing::debug!(slot, error = %e, "Dropping frame from abandoned run");
                        return;
                    }
                };
                let _ = self.shared.events.send(BoothEvent::ShotCaptured {
                    run: self.run,
                    slot,
                    captured,
                    target,
                });
                tracing::info!(
                    slot,
                    captured,
                    target,
                    elapsed_ms = self.clock.elapsed_ms(),
                    "Shot captured"
                );
            }

            if slot + 1 < target {
                tokio::time::sleep(timing.inter_shot).await;
            }
        }

        self.finish();
    }

    /// Turn the flash on and schedule it off without blocking the loop.
    fn flash(&self, slot: u32) {
        let run = self.run;
        if !self
            .shared
            .emit(run, BoothEvent::Flash { run, slot, on: true })
        {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let duration = self.options.timing.flash;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            shared.emit(run, BoothEvent::Flash { run, slot, on: false });
        });
        self.shared.track_timer(timer.abort_handle());
    }

    /// Grab the source's current frame, retrying once if configured.
    async fn capture(&self) -> Option<Frame> {
        let mut frame = self.source.current_frame();
        if frame.is_none() && self.options.missed_shot == MissedShotPolicy::RetryOnce {
            tracing::debug!(source = self.source.name(), "Source not ready, retrying once");
            tokio::time::sleep(self.options.timing.retry_delay).await;
            if !self.shared.is_current(self.run) {
                return None;
            }
            frame = self.source.current_frame();
        }
        frame.map(|f| {
            if self.options.mirror {
                image::imageops::flip_horizontal(&f)
            } else {
                f
            }
        })
    }

    fn finish(&self) {
        let style = &self.options.style;
        let mut session = self.shared.session();
        if !session.is_current(self.run) {
            return;
        }

        let mut edit = EditState::new(
            self.config.layout,
            style.frame,
            style.filter.clone(),
            session.frames().len(),
        );
        if let Err(e) = edit.set_brightness(style.brightness) {
            tracing::warn!(error = %e, "Ignoring default brightness");
        }

        let captured = session.frames().len();
        match session.finish(self.run, edit) {
            Ok(()) => {
                let _ = self.shared.events.send(BoothEvent::PhaseChanged {
                    run: self.run,
                    phase: Phase::Editing,
                });
                tracing::info!(
                    captured,
                    target = self.config.target_slots(),
                    elapsed_secs = self.clock.elapsed_secs(),
                    started = %self.clock.epoch_wall().format("%H:%M:%S"),
                    "Capture sequence complete"
                );
            }
            Err(e) => tracing::debug!(error = %e, "Sequence finished after reset"),
        }
    }
}
