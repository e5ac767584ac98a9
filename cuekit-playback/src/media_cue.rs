//! Fade-augmented cue control over a media transport
//!
//! **Responsibilities:**
//! - Transport transitions (start, stop, pause, interrupt) with fade policy
//! - Fire-and-forget fade-in task, lock-released fade-out drain
//! - Serializing transitions against asynchronous media notifications
//! - Cue action dispatch and runtime-updatable settings
//!
//! # Lock discipline
//!
//! A single `tokio::sync::Mutex` around the cue state serializes every
//! transition against the media listener's eos/error handlers. Exactly one
//! path releases and reacquires it mid-operation: the fade-out drain,
//! which may block for seconds and must not hold the lock while the
//! envelope runs (an end-of-stream arriving mid-drain is handled by
//! whichever side reacquires the lock first). Every other path holds the
//! lock for its entire duration.
//!
//! Fade-phase ownership is tracked by an epoch counter: when an explicit
//! stop/pause supersedes an in-flight fade, the superseded phase's cleanup
//! observes a newer epoch and leaves the phase flags to their new owner.
//! This keeps `in_fadein`/`in_fadeout` from ever being raised together.

use crate::fader::Fader;
use crate::media::{Media, MediaElement, MediaEvent, VOLUME_ELEMENT};
use cuekit_common::config::MediaCueSettings;
use cuekit_common::events::{CueAction, CueEvent, CueState, EventBus};
use cuekit_common::fade_curves::FadeShape;
use cuekit_common::time;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-cue event channel capacity.
const EVENT_CAPACITY: usize = 64;

/// Outcome of the shared stop/pause wind-down sequence.
enum HaltOutcome<'a> {
    /// Fades dealt with; proceed to the terminal transport call with the
    /// lock held.
    Proceed(MutexGuard<'a, CueState>),
    /// The cue was not running; nothing to do.
    Idle,
    /// The fade-out was superseded by another operation; the requested
    /// transition must be abandoned.
    Preempted,
}

/// Concrete operation a [`CueAction`] resolves to.
enum ResolvedAction {
    Start { fade: bool },
    Stop { fade: bool },
    Pause { fade: bool },
}

/// A fade-capable cue bound to one media transport.
///
/// Created with its [`Media`] instance at show-load time and dropped when
/// the cue is removed; the internal media listener task holds only a weak
/// reference and exits once the cue is gone.
pub struct MediaCue {
    id: Uuid,
    media: Arc<dyn Media>,

    /// Fade engine bound to the media's Volume element.
    fader: Fader<dyn MediaElement>,

    /// Current Volume handle; re-resolved on element-graph changes.
    volume: StdMutex<Option<Arc<dyn MediaElement>>>,

    /// The state lock (see module docs for the release discipline).
    state: Mutex<CueState>,

    in_fadein: AtomicBool,
    in_fadeout: AtomicBool,

    /// Bumped whenever fade-phase ownership changes.
    fade_epoch: AtomicU64,

    /// Cached media duration in ms (0 = unknown). Updated without locking.
    duration_ms: AtomicU64,

    settings: RwLock<MediaCueSettings>,
    events: EventBus,
}

impl MediaCue {
    /// Create a cue around a media transport with a fresh id.
    ///
    /// Must be called from within a tokio runtime: the media listener task
    /// is spawned here.
    pub fn new(media: Arc<dyn Media>, settings: MediaCueSettings) -> Arc<Self> {
        Self::with_id(Uuid::new_v4(), media, settings)
    }

    /// Create a cue with an explicit id (e.g. one restored by the host).
    pub fn with_id(id: Uuid, media: Arc<dyn Media>, settings: MediaCueSettings) -> Arc<Self> {
        let volume = media.element(VOLUME_ELEMENT);
        if volume.is_none() {
            debug!("Cue {}: no volume element exposed, fades disabled", id);
        }

        let cue = Arc::new(Self {
            id,
            fader: Fader::new(volume.clone()),
            volume: StdMutex::new(volume),
            state: Mutex::new(CueState::Stopped),
            in_fadein: AtomicBool::new(false),
            in_fadeout: AtomicBool::new(false),
            fade_epoch: AtomicU64::new(0),
            duration_ms: AtomicU64::new(
                media.duration().map(|d| d.as_millis() as u64).unwrap_or(0),
            ),
            settings: RwLock::new(settings),
            events: EventBus::new(EVENT_CAPACITY),
            media,
        });
        cue.spawn_media_listener();
        cue
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The cue's notification bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub async fn state(&self) -> CueState {
        *self.state.lock().await
    }

    pub fn is_fading_in(&self) -> bool {
        self.in_fadein.load(Ordering::Acquire)
    }

    pub fn is_fading_out(&self) -> bool {
        self.in_fadeout.load(Ordering::Acquire)
    }

    /// Current playback position (transport passthrough).
    pub fn current_time(&self) -> Duration {
        self.media.current_time()
    }

    /// Cached media duration, when known.
    pub fn duration(&self) -> Option<Duration> {
        match self.duration_ms.load(Ordering::Acquire) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Snapshot of the cue's settings.
    pub fn settings(&self) -> MediaCueSettings {
        self.settings.read().unwrap().clone()
    }

    /// Replace the cue's settings.
    ///
    /// Takes effect from the next fade; an in-flight envelope keeps the
    /// parameters it started with.
    pub fn apply_settings(&self, settings: MediaCueSettings) {
        debug!("Cue {}: settings updated: {:?}", self.id, settings);
        *self.settings.write().unwrap() = settings;
    }

    // ========================================
    // Transport operations
    // ========================================

    /// Start or resume playback.
    ///
    /// With `fade` requested and a fade-in eligible, the live volume is
    /// forced to zero *before* the transport starts so the first audible
    /// frame is already inside the ramp, then the envelope runs on a
    /// background task without blocking the caller. Always returns `true`;
    /// transport failures surface through the error notification path.
    pub async fn start(self: &Arc<Self>, fade: bool) -> bool {
        let mut st = self.state.lock().await;
        if *st == CueState::Playing {
            return true;
        }
        debug!("Cue {}: start requested (fade: {})", self.id, fade);

        if fade && self.can_fadein() {
            if let Some(volume) = self.volume() {
                volume.set_value(0.0);
            }
        }

        self.media.play();
        self.transition(&mut st, CueState::Playing);

        if fade {
            self.spawn_fadein();
        }
        true
    }

    /// Stop playback, optionally draining a fade-out first.
    ///
    /// Returns `true` when the transition completed, `false` when the
    /// requested fade-out was superseded by another operation (which then
    /// owns transport control).
    pub async fn stop(&self, fade: bool) -> bool {
        match self.wind_down(fade, true).await {
            HaltOutcome::Proceed(mut st) => {
                debug!("Cue {}: stopping transport", self.id);
                self.media.stop();
                self.transition(&mut st, CueState::Stopped);
                true
            }
            HaltOutcome::Idle => true,
            HaltOutcome::Preempted => false,
        }
    }

    /// Pause playback, optionally draining a fade-out first.
    ///
    /// Same contract as [`MediaCue::stop`].
    pub async fn pause(&self, fade: bool) -> bool {
        match self.wind_down(fade, false).await {
            HaltOutcome::Proceed(mut st) => {
                debug!("Cue {}: pausing transport", self.id);
                self.media.pause();
                self.transition(&mut st, CueState::Paused);
                true
            }
            HaltOutcome::Idle => true,
            HaltOutcome::Preempted => false,
        }
    }

    /// Emergency halt: cancel any fade and stop the transport immediately.
    pub async fn interrupt(&self) {
        let mut st = self.state.lock().await;
        info!("Cue {}: interrupt", self.id);

        self.fader.stop();
        self.in_fadein.store(false, Ordering::Release);
        self.in_fadeout.store(false, Ordering::Release);
        self.fade_epoch.fetch_add(1, Ordering::AcqRel);

        self.media.interrupt();
        self.transition(&mut st, CueState::Stopped);
    }

    /// Execute a cue action, resolving `Default` against the configured
    /// default start/stop actions.
    pub async fn execute(self: &Arc<Self>, action: CueAction) -> bool {
        match self.resolve(action).await {
            ResolvedAction::Start { fade } => self.start(fade).await,
            ResolvedAction::Stop { fade } => self.stop(fade).await,
            ResolvedAction::Pause { fade } => self.pause(fade).await,
        }
    }

    async fn resolve(&self, action: CueAction) -> ResolvedAction {
        let action = if action == CueAction::Default {
            let playing = *self.state.lock().await == CueState::Playing;
            let settings = self.settings.read().unwrap();
            if playing {
                settings.default_stop_action
            } else {
                // Paused cues resume through the start action.
                settings.default_start_action
            }
        } else {
            action
        };

        match action {
            CueAction::Start => ResolvedAction::Start { fade: false },
            CueAction::FadeInStart => ResolvedAction::Start { fade: true },
            CueAction::Stop => ResolvedAction::Stop { fade: false },
            CueAction::FadeOutStop => ResolvedAction::Stop { fade: true },
            CueAction::Pause => ResolvedAction::Pause { fade: false },
            CueAction::FadeOutPause => ResolvedAction::Pause { fade: true },
            // A misconfigured default must still terminate somewhere.
            CueAction::Default => ResolvedAction::Start { fade: false },
        }
    }

    // ========================================
    // Fade phases
    // ========================================

    fn can_fadein(&self) -> bool {
        self.volume().is_some() && self.settings.read().unwrap().fadein_duration_ms > 0
    }

    fn can_fadeout(&self) -> bool {
        self.volume().is_some() && self.settings.read().unwrap().fadeout_duration_ms > 0
    }

    fn volume(&self) -> Option<Arc<dyn MediaElement>> {
        self.volume.lock().unwrap().clone()
    }

    fn spawn_fadein(self: &Arc<Self>) {
        let cue = Arc::clone(self);
        tokio::spawn(async move {
            cue.run_fadein().await;
        });
    }

    /// Fade-in phase body, run off the caller's control path.
    async fn run_fadein(&self) {
        let (epoch, ticket) = {
            let st = self.state.lock().await;
            // The cue may already have been stopped, paused, or entered a
            // fade-out drain between the spawn and this point.
            if *st != CueState::Playing
                || self.in_fadeout.load(Ordering::Acquire)
                || self.in_fadein.load(Ordering::Acquire)
                || !self.can_fadein()
            {
                return;
            }
            self.in_fadein.store(true, Ordering::Release);
            let epoch = self.fade_epoch.fetch_add(1, Ordering::AcqRel) + 1;
            self.events.emit_lossy(CueEvent::FadeInStarted {
                cue_id: self.id,
                timestamp: time::now(),
            });
            (epoch, self.fader.prepare())
        };

        let (duration, curve) = {
            let settings = self.settings.read().unwrap();
            (settings.fadein_duration(), settings.fadein_curve)
        };
        let full_volume = self.volume().map(|v| v.nominal_value()).unwrap_or(1.0);
        self.fader
            .fade(ticket, duration, full_volume, FadeShape::fade_in(curve))
            .await;

        // Runs on every exit path: a cooperative stop makes `fade` return
        // instead of unwinding, so there is no path that skips this.
        if self.fade_epoch.load(Ordering::Acquire) == epoch {
            self.in_fadein.store(false, Ordering::Release);
        }
        self.events.emit_lossy(CueEvent::FadeInEnded {
            cue_id: self.id,
            timestamp: time::now(),
        });
    }

    /// Shared stop/pause wind-down: supersede in-flight fades, then drain
    /// a fade-out when requested.
    async fn wind_down(&self, fade: bool, allow_paused: bool) -> HaltOutcome<'_> {
        let st = self.state.lock().await;
        let running =
            *st == CueState::Playing || (allow_paused && *st == CueState::Paused);
        if !running {
            return HaltOutcome::Idle;
        }

        // An explicit stop/pause supersedes whichever fade is in flight;
        // the epoch bump tells that fade's cleanup the flags changed hands.
        if self.in_fadeout.load(Ordering::Acquire) {
            self.fader.stop();
            self.in_fadeout.store(false, Ordering::Release);
            self.fade_epoch.fetch_add(1, Ordering::AcqRel);
        } else if self.in_fadein.load(Ordering::Acquire) {
            self.fader.stop();
            self.in_fadein.store(false, Ordering::Release);
            self.fade_epoch.fetch_add(1, Ordering::AcqRel);
        }

        if fade {
            let (completed, st) = self.run_fadeout(st).await;
            if !completed {
                return HaltOutcome::Preempted;
            }
            return HaltOutcome::Proceed(st);
        }
        HaltOutcome::Proceed(st)
    }

    /// Fade-out drain. Takes the held state guard, releases it for the
    /// blocking ramp so eos/error notifications stay serviceable, then
    /// reacquires it. Returns whether the ramp ran to completion.
    async fn run_fadeout<'a>(
        &'a self,
        guard: MutexGuard<'a, CueState>,
    ) -> (bool, MutexGuard<'a, CueState>) {
        if !self.can_fadeout() {
            return (true, guard);
        }

        self.in_fadeout.store(true, Ordering::Release);
        let epoch = self.fade_epoch.fetch_add(1, Ordering::AcqRel) + 1;
        self.events.emit_lossy(CueEvent::FadeOutStarted {
            cue_id: self.id,
            timestamp: time::now(),
        });
        let ticket = self.fader.prepare();

        let (duration, curve) = {
            let settings = self.settings.read().unwrap();
            (settings.fadeout_duration(), settings.fadeout_curve)
        };

        drop(guard);
        let completed = self
            .fader
            .fade(ticket, duration, 0.0, FadeShape::fade_out(curve))
            .await;
        let guard = self.state.lock().await;

        if self.fade_epoch.load(Ordering::Acquire) == epoch {
            self.in_fadeout.store(false, Ordering::Release);
        }
        self.events.emit_lossy(CueEvent::FadeOutEnded {
            cue_id: self.id,
            timestamp: time::now(),
        });
        (completed, guard)
    }

    // ========================================
    // Media notifications
    // ========================================

    fn spawn_media_listener(self: &Arc<Self>) {
        let cue = Arc::downgrade(self);
        let mut rx = self.media.events();
        tokio::spawn(async move {
            loop {
                let event = match rx.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Media event listener lagged, missed {} events", missed);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                // Weak handle: the listener must not keep a removed cue
                // alive.
                let Some(cue) = cue.upgrade() else { break };
                match event {
                    MediaEvent::DurationChanged(duration) => cue.on_duration_changed(duration),
                    MediaEvent::ElementsChanged => cue.on_elements_changed(),
                    MediaEvent::Eos => cue.on_eos().await,
                    MediaEvent::Error { message, details } => {
                        cue.on_error(message, details).await
                    }
                }
            }
        });
    }

    /// Duration updates are cheap and idempotent; no locking.
    fn on_duration_changed(&self, duration: Option<Duration>) {
        let ms = duration.map(|d| d.as_millis() as u64).unwrap_or(0);
        self.duration_ms.store(ms, Ordering::Release);
    }

    /// Re-resolve the Volume handle and repoint the fader.
    ///
    /// An in-flight fade keeps its clock and progress; only the write
    /// destination changes, which is abrupt if the new element's level
    /// differs from the ramp's current value.
    fn on_elements_changed(&self) {
        let volume = self.media.element(VOLUME_ELEMENT);
        debug!(
            "Cue {}: volume element re-resolved (found: {})",
            self.id,
            volume.is_some()
        );
        *self.volume.lock().unwrap() = volume.clone();
        self.fader.set_target(volume);
    }

    async fn on_eos(&self) {
        let mut st = self.state.lock().await;
        self.fader.stop();
        // Only a playing cue ends naturally; if a stop/pause completed
        // first, that transition already won.
        if *st == CueState::Playing {
            self.transition(&mut st, CueState::Ended);
        }
    }

    async fn on_error(&self, message: String, details: String) {
        let mut st = self.state.lock().await;
        self.fader.stop();
        warn!("Cue {}: media error: {}", self.id, message);
        self.transition(&mut st, CueState::Error);
        self.events.emit_lossy(CueEvent::CueError {
            cue_id: self.id,
            message,
            details,
            timestamp: time::now(),
        });
    }

    fn transition(&self, st: &mut CueState, new_state: CueState) {
        let old_state = *st;
        if old_state == new_state {
            return;
        }
        *st = new_state;
        info!(
            "Cue {} state changed: {} -> {}",
            self.id, old_state, new_state
        );
        self.events.emit_lossy(CueEvent::StateChanged {
            cue_id: self.id,
            old_state,
            new_state,
            timestamp: time::now(),
        });
    }
}
