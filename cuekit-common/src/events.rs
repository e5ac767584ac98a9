//! Event types and the per-cue event bus
//!
//! # Architecture
//!
//! Each cue owns an [`EventBus`] (tokio::broadcast) for one-to-many
//! notification delivery. Fade and state notifications are emitted lossy:
//! a cue with no observers is a normal situation, not an error.
//!
//! The shared state and action vocabularies live beside the event types so
//! every consumer matches on the same enums.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Cue transport state
///
/// The fading-in/fading-out phases are not states: they are flags layered
/// on `Playing` (and, for a fade-out drain, on `Paused`), observable via
/// the cue itself and the fade events below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueState {
    /// Idle; nothing playing, nothing pending.
    Stopped,
    Playing,
    Paused,
    /// Reached natural end of stream.
    Ended,
    /// The media transport reported a failure.
    Error,
}

impl std::fmt::Display for CueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CueState::Stopped => write!(f, "stopped"),
            CueState::Playing => write!(f, "playing"),
            CueState::Paused => write!(f, "paused"),
            CueState::Ended => write!(f, "ended"),
            CueState::Error => write!(f, "error"),
        }
    }
}

/// Executable cue actions
///
/// `Default` resolves against the cue's configured default start/stop
/// actions depending on its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueAction {
    Default,
    Start,
    FadeInStart,
    Stop,
    FadeOutStop,
    Pause,
    FadeOutPause,
}

/// Cue event types
///
/// Events carry the emitting cue's id and a UTC timestamp; fade events
/// have no further payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CueEvent {
    /// A fade-in envelope started ramping.
    FadeInStarted {
        cue_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A fade-in envelope finished, whether it completed or was stopped.
    FadeInEnded {
        cue_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A fade-out envelope started draining.
    FadeOutStarted {
        cue_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A fade-out envelope finished, whether it completed or was stopped.
    FadeOutEnded {
        cue_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Cue transport state changed.
    StateChanged {
        cue_id: Uuid,
        old_state: CueState,
        new_state: CueState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The media transport reported a failure.
    CueError {
        cue_id: Uuid,
        message: String,
        details: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl CueEvent {
    /// Id of the cue that emitted this event.
    pub fn cue_id(&self) -> Uuid {
        match self {
            CueEvent::FadeInStarted { cue_id, .. }
            | CueEvent::FadeInEnded { cue_id, .. }
            | CueEvent::FadeOutStarted { cue_id, .. }
            | CueEvent::FadeOutEnded { cue_id, .. }
            | CueEvent::StateChanged { cue_id, .. }
            | CueEvent::CueError { cue_id, .. } => *cue_id,
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Per-cue event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the cue)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CueEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity.
    ///
    /// Capacity bounds how many events a slow subscriber may lag behind
    /// before it starts missing events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events.
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CueEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` otherwise. Use [`EventBus::emit_lossy`] for notifications
    /// that are fine to drop when nobody is listening.
    pub fn emit(
        &self,
        event: CueEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<CueEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the absence of subscribers.
    pub fn emit_lossy(&self, event: CueEvent) {
        let _ = self.tx.send(event);
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time;

    fn fade_event(cue_id: Uuid) -> CueEvent {
        CueEvent::FadeInStarted {
            cue_id,
            timestamp: time::now(),
        }
    }

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_subscribe() {
        let bus = EventBus::new(100);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_eventbus_emit_no_subscribers() {
        let bus = EventBus::new(100);
        assert!(bus.emit(fade_event(Uuid::new_v4())).is_err());
    }

    #[test]
    fn test_eventbus_emit_lossy_no_subscribers() {
        let bus = EventBus::new(100);
        // Should not panic without subscribers
        bus.emit_lossy(fade_event(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn test_eventbus_emit_with_subscriber() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();
        let cue_id = Uuid::new_v4();

        assert!(bus.emit(fade_event(cue_id)).is_ok());

        let received = rx.recv().await.unwrap();
        match received {
            CueEvent::FadeInStarted { cue_id: id, .. } => assert_eq!(id, cue_id),
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[test]
    fn test_event_cue_id_accessor() {
        let cue_id = Uuid::new_v4();
        let event = CueEvent::StateChanged {
            cue_id,
            old_state: CueState::Stopped,
            new_state: CueState::Playing,
            timestamp: time::now(),
        };
        assert_eq!(event.cue_id(), cue_id);
    }

    #[test]
    fn test_cue_state_display() {
        assert_eq!(format!("{}", CueState::Playing), "playing");
        assert_eq!(format!("{}", CueState::Ended), "ended");
    }

    #[test]
    fn test_cue_action_config_names() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Doc {
            action: CueAction,
        }

        let doc: Doc = toml::from_str(r#"action = "fade_out_stop""#).unwrap();
        assert_eq!(doc.action, CueAction::FadeOutStop);

        let rendered = toml::to_string(&Doc {
            action: CueAction::FadeInStart,
        })
        .unwrap();
        assert!(rendered.contains("fade_in_start"));
    }
}
