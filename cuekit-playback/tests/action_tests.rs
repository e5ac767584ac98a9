//! Integration tests for reversible cue actions

mod helpers;

use cuekit_playback::{Action, MediaCue, UpdateCueSettingsAction};
use helpers::{fade_settings, init_tracing, FakeMedia};

#[tokio::test]
async fn test_update_settings_action_round_trip() {
    init_tracing();
    let media = FakeMedia::new();
    let cue = MediaCue::new(media, fade_settings(0, 0));
    let original = cue.settings();
    let updated = fade_settings(1500, 3000);

    let mut action = UpdateCueSettingsAction::new(cue.clone(), updated.clone());

    action.execute();
    assert_eq!(cue.settings(), updated);

    action.undo();
    assert_eq!(cue.settings(), original, "undo must restore the snapshot");

    action.redo();
    assert_eq!(cue.settings(), updated, "redo must reapply the change");
}

#[tokio::test]
async fn test_update_settings_action_log_names_the_cue() {
    init_tracing();
    let media = FakeMedia::new();
    let cue = MediaCue::new(media, fade_settings(0, 0));

    let action = UpdateCueSettingsAction::new(cue.clone(), fade_settings(100, 100));
    assert!(action.log().contains(&cue.id().to_string()));
}

#[tokio::test]
async fn test_undo_without_execute_is_harmless() {
    init_tracing();
    let media = FakeMedia::new();
    let cue = MediaCue::new(media, fade_settings(250, 0));
    let original = cue.settings();

    let mut action = UpdateCueSettingsAction::new(cue.clone(), fade_settings(0, 0));
    action.undo();

    assert_eq!(cue.settings(), original);
}
