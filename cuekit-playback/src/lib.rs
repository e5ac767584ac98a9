//! # CueKit Playback Core
//!
//! Playback-control core for a live show/cue tool: fade-capable cue
//! execution over an abstract media transport.
//!
//! **Purpose:** Coordinate start/stop/pause/interrupt of a media cue while
//! volume envelopes run concurrently, and provide the time-based,
//! cancelable parameter ramp engine those envelopes run on.
//!
//! **Architecture:** A [`MediaCue`] wraps an external [`Media`] transport
//! and drives its Volume element through a [`Fader`]. Asynchronous
//! transport notifications (end-of-stream, errors, element-graph changes)
//! reenter the cue under its state lock, so a natural end and an in-flight
//! stop-fade cannot race. The [`Action`] contract is what an external
//! undo/redo controller consumes.

pub mod action;
pub mod fader;
pub mod media;
pub mod media_cue;

pub use action::{Action, UpdateCueSettingsAction};
pub use fader::{FadeTarget, FadeTicket, Fader};
pub use media::{Media, MediaElement, MediaEvent, VOLUME_ELEMENT};
pub use media_cue::MediaCue;
