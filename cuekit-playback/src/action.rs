//! Reversible-operation contract for the undo stack
//!
//! The undo/redo controller itself lives in the host application; this
//! module only defines what it consumes. Implementors own whatever
//! before/after snapshots `undo` needs — the trait stores nothing.

use crate::media_cue::MediaCue;
use cuekit_common::config::MediaCueSettings;
use std::sync::Arc;

/// A reversible operation.
///
/// Created per reversible user operation and retained by the host's undo
/// stack after execution. Note that actions may keep references to live
/// objects (cues, media) alive for as long as they sit in that stack.
pub trait Action: Send {
    /// Perform the operation.
    fn execute(&mut self);

    /// Revert what `execute` has done.
    fn undo(&mut self);

    /// Apply the operation again after an `undo`.
    ///
    /// The default implementation calls `execute`.
    fn redo(&mut self) {
        self.execute();
    }

    /// Short human-readable description for the action log.
    fn log(&self) -> String {
        String::new()
    }
}

/// Reversibly replace a cue's settings.
///
/// The previous settings are snapshotted at `execute` time, so undo
/// restores exactly what the cue had when the action ran.
pub struct UpdateCueSettingsAction {
    cue: Arc<MediaCue>,
    settings: MediaCueSettings,
    previous: Option<MediaCueSettings>,
}

impl UpdateCueSettingsAction {
    pub fn new(cue: Arc<MediaCue>, settings: MediaCueSettings) -> Self {
        Self {
            cue,
            settings,
            previous: None,
        }
    }
}

impl Action for UpdateCueSettingsAction {
    fn execute(&mut self) {
        self.previous = Some(self.cue.settings());
        self.cue.apply_settings(self.settings.clone());
    }

    fn undo(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.cue.apply_settings(previous);
        }
    }

    fn log(&self) -> String {
        format!("Update settings of cue {}", self.cue.id())
    }
}
