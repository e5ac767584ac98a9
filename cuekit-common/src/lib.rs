//! # CueKit Common Library
//!
//! Shared code for the CueKit playback-control core:
//! - Event types (`CueEvent` enum) and the per-cue `EventBus`
//! - Cue state and cue action vocabulary
//! - Fade curve definitions and shape evaluation
//! - Configuration loading (the nested `media` property bag)
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod events;
pub mod fade_curves;
pub mod time;

pub use error::{Error, Result};
pub use fade_curves::{FadeCurve, FadeShape};
