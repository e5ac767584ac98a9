//! The media transport seam
//!
//! Everything below this trait boundary (pipeline graph, decoding, audio
//! routing) belongs to the backend. The cue core only issues transport
//! commands, reads the clock, resolves parameter elements by name, and
//! listens to the notification stream.

use crate::fader::FadeTarget;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Well-known element name the cue binds its fade engine to.
pub const VOLUME_ELEMENT: &str = "Volume";

/// Asynchronous notifications from the media backend.
#[derive(Debug, Clone)]
pub enum MediaEvent {
    /// Total media duration became known or changed (`None` = unknown).
    DurationChanged(Option<Duration>),

    /// The element graph was rebuilt; parameter handles are stale and
    /// must be re-resolved.
    ElementsChanged,

    /// Natural end of stream.
    Eos,

    /// Transport failure. Converted to cue state, never raised.
    Error { message: String, details: String },
}

/// A live numeric parameter exposed by the media element graph.
///
/// The fade engine drives the live value; `nominal_value` is the
/// configured full level a fade-in ramps toward.
pub trait MediaElement: FadeTarget {
    fn nominal_value(&self) -> f32 {
        1.0
    }
}

/// Abstract playback transport controlled by a [`MediaCue`](crate::MediaCue).
///
/// Transport commands are fire-and-forget at this seam; a real backend
/// reports failures through [`MediaEvent::Error`] rather than return
/// values, and the cue converts them to its error state.
pub trait Media: Send + Sync {
    /// Begin or resume playback.
    fn play(&self);

    /// Stop playback and release the stream position.
    fn stop(&self);

    /// Halt playback keeping the stream position.
    fn pause(&self);

    /// Immediate halt with no grace period of any kind.
    fn interrupt(&self);

    /// Current playback position.
    fn current_time(&self) -> Duration;

    /// Total media duration, when known.
    fn duration(&self) -> Option<Duration>;

    /// Look up a parameter element by name (e.g. [`VOLUME_ELEMENT`]).
    ///
    /// Returned handles become stale when [`MediaEvent::ElementsChanged`]
    /// fires and must be re-resolved.
    fn element(&self, name: &str) -> Option<Arc<dyn MediaElement>>;

    /// Subscribe to transport notifications.
    ///
    /// Each call returns an independent receiver; events emitted before
    /// subscription are not delivered.
    fn events(&self) -> broadcast::Receiver<MediaEvent>;
}
