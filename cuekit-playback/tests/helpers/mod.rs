//! Shared test doubles for the cue integration tests.
#![allow(dead_code)]

use cuekit_common::config::MediaCueSettings;
use cuekit_common::events::CueEvent;
use cuekit_common::fade_curves::FadeCurve;
use cuekit_playback::fader::FadeTarget;
use cuekit_playback::media::{Media, MediaElement, MediaEvent, VOLUME_ELEMENT};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// Volume element recording every write it receives.
pub struct FakeVolume {
    value: Mutex<f32>,
    nominal: f32,
    writes: Mutex<Vec<f32>>,
}

impl FakeVolume {
    pub fn new(nominal: f32) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(nominal),
            nominal,
            writes: Mutex::new(Vec::new()),
        })
    }

    pub fn writes(&self) -> Vec<f32> {
        self.writes.lock().unwrap().clone()
    }
}

impl FadeTarget for FakeVolume {
    fn value(&self) -> f32 {
        *self.value.lock().unwrap()
    }

    fn set_value(&self, value: f32) {
        *self.value.lock().unwrap() = value;
        self.writes.lock().unwrap().push(value);
    }
}

impl MediaElement for FakeVolume {
    fn nominal_value(&self) -> f32 {
        self.nominal
    }
}

/// Scripted transport: counts commands, exposes a swappable volume
/// element, and broadcasts notifications on demand.
pub struct FakeMedia {
    volume: Mutex<Option<Arc<FakeVolume>>>,
    pub play_count: AtomicUsize,
    pub stop_count: AtomicUsize,
    pub pause_count: AtomicUsize,
    pub interrupt_count: AtomicUsize,
    events: broadcast::Sender<MediaEvent>,
    position: Mutex<Duration>,
}

impl FakeMedia {
    pub fn new() -> Arc<Self> {
        Self::with_volume(Some(FakeVolume::new(1.0)))
    }

    pub fn with_volume(volume: Option<Arc<FakeVolume>>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            volume: Mutex::new(volume),
            play_count: AtomicUsize::new(0),
            stop_count: AtomicUsize::new(0),
            pause_count: AtomicUsize::new(0),
            interrupt_count: AtomicUsize::new(0),
            events,
            position: Mutex::new(Duration::ZERO),
        })
    }

    /// The currently exposed volume element.
    pub fn volume(&self) -> Arc<FakeVolume> {
        self.volume
            .lock()
            .unwrap()
            .clone()
            .expect("fake media exposes no volume element")
    }

    /// Replace the volume element and notify listeners, as a backend does
    /// when its element graph is rebuilt.
    pub fn swap_volume(&self, volume: Arc<FakeVolume>) {
        *self.volume.lock().unwrap() = Some(volume);
        self.emit(MediaEvent::ElementsChanged);
    }

    pub fn set_position(&self, position: Duration) {
        *self.position.lock().unwrap() = position;
    }

    /// Broadcast a transport notification to subscribed cues.
    pub fn emit(&self, event: MediaEvent) {
        let _ = self.events.send(event);
    }
}

impl Media for FakeMedia {
    fn play(&self) {
        self.play_count.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stop_count.fetch_add(1, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.pause_count.fetch_add(1, Ordering::SeqCst);
    }

    fn interrupt(&self) {
        self.interrupt_count.fetch_add(1, Ordering::SeqCst);
    }

    fn current_time(&self) -> Duration {
        *self.position.lock().unwrap()
    }

    fn duration(&self) -> Option<Duration> {
        None
    }

    fn element(&self, name: &str) -> Option<Arc<dyn MediaElement>> {
        if name == VOLUME_ELEMENT {
            self.volume
                .lock()
                .unwrap()
                .clone()
                .map(|v| v as Arc<dyn MediaElement>)
        } else {
            None
        }
    }

    fn events(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }
}

/// Linear-curve settings with the given fade lengths, for predictable
/// ramp values in assertions.
pub fn fade_settings(fadein_ms: u64, fadeout_ms: u64) -> MediaCueSettings {
    MediaCueSettings {
        fadein_duration_ms: fadein_ms,
        fadein_curve: FadeCurve::Linear,
        fadeout_duration_ms: fadeout_ms,
        fadeout_curve: FadeCurve::Linear,
        ..Default::default()
    }
}

/// Install the test tracing subscriber once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Collect every event currently queued on a receiver.
pub fn drain_events(rx: &mut broadcast::Receiver<CueEvent>) -> Vec<CueEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
