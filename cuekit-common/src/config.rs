//! Cue configuration loading
//!
//! Media-cue settings live in a nested property bag under the `media`
//! key, default empty, so a bare document (or no document at all) yields
//! a cue that plays with no fades and the standard default actions.

use crate::error::{Error, Result};
use crate::events::CueAction;
use crate::fade_curves::FadeCurve;
use crate::time;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level cue configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CueConfig {
    /// Media-cue settings, nested under the `media` key. Default empty.
    #[serde(default)]
    pub media: MediaCueSettings,
}

impl CueConfig {
    /// Parse a configuration document from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a configuration document from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Fade and default-action settings for a media cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaCueSettings {
    /// Fade-in length in milliseconds; 0 disables fading in.
    #[serde(default)]
    pub fadein_duration_ms: u64,

    /// Curve shaping the fade-in ramp.
    #[serde(default)]
    pub fadein_curve: FadeCurve,

    /// Fade-out length in milliseconds; 0 disables fading out.
    #[serde(default)]
    pub fadeout_duration_ms: u64,

    /// Curve shaping the fade-out ramp.
    #[serde(default = "default_fadeout_curve")]
    pub fadeout_curve: FadeCurve,

    /// Action a bare "go" resolves to while the cue is not playing.
    #[serde(default = "default_start_action")]
    pub default_start_action: CueAction,

    /// Action a bare "go" resolves to while the cue is playing.
    #[serde(default = "default_stop_action")]
    pub default_stop_action: CueAction,
}

fn default_fadeout_curve() -> FadeCurve {
    FadeCurve::Logarithmic
}

fn default_start_action() -> CueAction {
    CueAction::FadeInStart
}

fn default_stop_action() -> CueAction {
    CueAction::FadeOutStop
}

impl Default for MediaCueSettings {
    fn default() -> Self {
        Self {
            fadein_duration_ms: 0,
            fadein_curve: FadeCurve::default(),
            fadeout_duration_ms: 0,
            fadeout_curve: default_fadeout_curve(),
            default_start_action: default_start_action(),
            default_stop_action: default_stop_action(),
        }
    }
}

impl MediaCueSettings {
    /// Fade-in length as a [`Duration`].
    pub fn fadein_duration(&self) -> Duration {
        time::millis_to_duration(self.fadein_duration_ms)
    }

    /// Fade-out length as a [`Duration`].
    pub fn fadeout_duration(&self) -> Duration {
        time::millis_to_duration(self.fadeout_duration_ms)
    }
}
