//! Time-based, cancelable parameter ramps
//!
//! A [`Fader`] drives one numeric parameter of a target from the value
//! captured by [`Fader::prepare`] toward an end value over a duration,
//! shaped by a [`FadeShape`]. The ramp runs as a tick loop on the calling
//! task; cancellation is cooperative via [`Fader::stop`] and observed at
//! the next tick, so cancellation latency is bounded by the tick period.
//!
//! A fader is constructed once per fadeable parameter and reused across
//! many ramps. Its target is a swappable slot: when the owning element
//! graph is rebuilt mid-fade, the new handle picks the ramp up at the
//! current progress, the elapsed clock is not reset.

use cuekit_common::fade_curves::FadeShape;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::trace;

/// Ramp tick period. Bounds cooperative-cancellation latency.
pub const FADE_TICK: Duration = Duration::from_millis(20);

/// A numeric parameter a [`Fader`] can drive.
///
/// Implementations are shared handles: the fader writes from whichever
/// task runs the ramp while other threads may read concurrently.
pub trait FadeTarget: Send + Sync {
    /// Current live value of the parameter.
    fn value(&self) -> f32;

    /// Overwrite the live value.
    fn set_value(&self, value: f32);
}

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Proof of a [`Fader::prepare`] call, consumed by [`Fader::fade`].
///
/// A ticket is invalidated by any later `prepare` or `stop` on the same
/// fader; a `fade` presented with an invalidated ticket refuses to write.
#[derive(Debug, Clone, Copy)]
pub struct FadeTicket(u64);

/// Ramp engine for a single numeric parameter.
///
/// At most one ramp mutates the target at a time: callers stop an active
/// fade before starting the next, and an internal run gate additionally
/// serializes back-to-back `fade` calls across the cooperative-stop
/// latency window.
pub struct Fader<T: FadeTarget + ?Sized> {
    /// Swappable target slot; `None` turns fades into no-ops.
    target: Mutex<Option<Arc<T>>>,

    /// Ramp baseline captured by [`Fader::prepare`].
    start_value: Mutex<f32>,

    /// Run state: idle / running / stopped.
    state: AtomicU8,

    /// Prepare ticket. Each `prepare` (and `stop`) advances it; a `fade`
    /// belongs to the ticket current at its call and refuses to start if a
    /// newer prepare or stop has superseded it in the meantime.
    epoch: AtomicU64,

    /// Held for the whole of a `fade` call. A new fade may not start
    /// ticking until the previous loop has observed its stop and exited.
    run_gate: tokio::sync::Mutex<()>,
}

impl<T: FadeTarget + ?Sized> Fader<T> {
    pub fn new(target: Option<Arc<T>>) -> Self {
        Self {
            target: Mutex::new(target),
            start_value: Mutex::new(0.0),
            state: AtomicU8::new(IDLE),
            epoch: AtomicU64::new(0),
            run_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Repoint the fader at a different handle (or none).
    ///
    /// An in-flight ramp picks the new handle up at its next tick without
    /// resetting elapsed time or progress.
    pub fn set_target(&self, target: Option<Arc<T>>) {
        *self.target.lock().unwrap() = target;
    }

    /// Current target handle, if any.
    pub fn target(&self) -> Option<Arc<T>> {
        self.target.lock().unwrap().clone()
    }

    /// Whether a ramp is currently mutating the target.
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }

    /// Capture the target's current value as the next ramp's baseline.
    ///
    /// Stops any active ramp first. Call immediately before each
    /// [`Fader::fade`]; the baseline is not reused across fades. The
    /// returned ticket pairs the upcoming `fade` with this baseline.
    pub fn prepare(&self) -> FadeTicket {
        self.stop();
        let baseline = self.target().map(|t| t.value()).unwrap_or(0.0);
        *self.start_value.lock().unwrap() = baseline;
        FadeTicket(self.epoch.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Request early termination of an in-progress ramp.
    ///
    /// Level-triggered and idempotent; safe to call from any task. A
    /// running ramp observes the request at its next tick and exits
    /// without completing the remaining ramp or writing again; a ramp that
    /// was prepared but has not started ticking yet is invalidated and
    /// will refuse to start.
    pub fn stop(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        // Only demotes a running ramp; a stale stop must not suppress a
        // subsequently prepared fade.
        let _ = self.state.compare_exchange(
            RUNNING,
            STOPPED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Ramp the target from the prepared baseline to `to` over `duration`.
    ///
    /// Blocks the calling task for the fade duration, writing once per
    /// tick: `lerp(baseline, to, shape.progress(elapsed / duration))`.
    /// Returns `true` when the ramp ran to completion (the terminal write
    /// is exactly `to`), `false` when stopped early (the terminal value is
    /// whatever the last tick wrote). Either way there are no writes after
    /// return.
    ///
    /// A zero duration applies `to` immediately and completes. A missing
    /// target is a no-op that reports completion.
    pub async fn fade(
        &self,
        ticket: FadeTicket,
        duration: Duration,
        to: f32,
        shape: FadeShape,
    ) -> bool {
        let _running = self.run_gate.lock().await;

        // A stop or a newer prepare since our ticket was issued means
        // another fade owns the parameter now; do not write at all.
        if self.epoch.load(Ordering::Acquire) != ticket.0 {
            return false;
        }

        match self.target() {
            None => return true,
            Some(target) if duration.is_zero() => {
                target.set_value(to);
                return true;
            }
            Some(_) => {}
        }

        let from = *self.start_value.lock().unwrap();
        self.state.store(RUNNING, Ordering::Release);
        trace!(
            "Fade started: {:.3} -> {:.3} over {}ms",
            from,
            to,
            duration.as_millis()
        );

        let started = Instant::now();
        let mut ticker = interval(FADE_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let completed = loop {
            ticker.tick().await;

            if self.state.load(Ordering::Acquire) != RUNNING {
                break false;
            }

            // Re-read the slot each tick; the element graph may have been
            // rebuilt under us.
            let Some(target) = self.target() else {
                break true;
            };

            let t = (started.elapsed().as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0);
            if t >= 1.0 {
                target.set_value(to);
                break true;
            }
            target.set_value(from + (to - from) * shape.progress(t));
        };

        if completed {
            self.state.store(IDLE, Ordering::Release);
        }
        trace!("Fade finished (completed: {})", completed);
        completed
    }
}

// ========================================
// Tests
// ========================================
