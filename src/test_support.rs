//! In-memory fakes for the capability traits, shared by unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use crate::audio::devices::{AudioConstraints, DeviceError, DisplayConstraints, MediaDevices};
use crate::audio::encoder::{EncodeError, EncoderFactory, EncoderSession};
use crate::audio::mixing_graph::MixedStream;
use crate::audio::track::{
    MediaStream, MediaTrack, SampleBuffer, TrackKind, TrackLifecycle, TrackState,
};
use crate::host::{HostBridge, HostError};
use crate::meeting::MeetingState;
use crate::overlay::geometry::{LogicalPosition, LogicalSize, PhysicalPosition, PhysicalSize};
use crate::overlay::window::{OverlayWindow, WindowError};
use crate::persistence::storage::{ObjectStorage, StorageError};

/// Let spawned tasks run to their next await point.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct FakeTrack {
    id: String,
    kind: TrackKind,
    sample_rate: u32,
    buffer: SampleBuffer,
    lifecycle: TrackLifecycle,
}

impl FakeTrack {
    pub fn audio(id: &str, sample_rate: u32, samples: Vec<f32>) -> Arc<dyn MediaTrack> {
        let buffer = SampleBuffer::default();
        buffer.push(&samples);
        Arc::new(Self {
            id: id.to_string(),
            kind: TrackKind::Audio,
            sample_rate,
            buffer,
            lifecycle: TrackLifecycle::default(),
        })
    }

    pub fn video(id: &str) -> Arc<dyn MediaTrack> {
        Arc::new(Self {
            id: id.to_string(),
            kind: TrackKind::Video,
            sample_rate: 0,
            buffer: SampleBuffer::default(),
            lifecycle: TrackLifecycle::default(),
        })
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn drain_samples(&self) -> Vec<f32> {
        self.buffer.drain()
    }

    fn stop(&self) {
        if self.lifecycle.end() {
            self.buffer.clear();
        }
    }

    fn state(&self) -> TrackState {
        self.lifecycle.state()
    }
}

#[derive(Default)]
struct FakeWindowState {
    shown: bool,
    size: Option<(f64, f64)>,
    position: PhysicalPosition,
    show_calls: usize,
    hide_calls: usize,
    set_size_calls: usize,
    set_position_calls: usize,
}

/// Window at scale factor 1.0 that records every command.
pub struct FakeWindow {
    monitor: Option<PhysicalSize>,
    state: Mutex<FakeWindowState>,
}

impl FakeWindow {
    pub fn new(monitor: Option<(u32, u32)>, position: PhysicalPosition) -> Arc<Self> {
        Arc::new(Self {
            monitor: monitor.map(|(width, height)| PhysicalSize { width, height }),
            state: Mutex::new(FakeWindowState {
                position,
                ..FakeWindowState::default()
            }),
        })
    }

    pub fn last_size(&self) -> Option<(f64, f64)> {
        lock(&self.state).size
    }

    pub fn logical_position(&self) -> LogicalPosition {
        LogicalPosition::from_physical(lock(&self.state).position, 1.0)
    }

    pub fn is_shown(&self) -> bool {
        lock(&self.state).shown
    }

    pub fn show_calls(&self) -> usize {
        lock(&self.state).show_calls
    }

    pub fn hide_calls(&self) -> usize {
        lock(&self.state).hide_calls
    }

    pub fn set_size_calls(&self) -> usize {
        lock(&self.state).set_size_calls
    }

    pub fn set_position_calls(&self) -> usize {
        lock(&self.state).set_position_calls
    }
}

#[async_trait]
impl OverlayWindow for FakeWindow {
    async fn show(&self) -> Result<(), WindowError> {
        let mut state = lock(&self.state);
        state.shown = true;
        state.show_calls += 1;
        Ok(())
    }

    async fn hide(&self) -> Result<(), WindowError> {
        let mut state = lock(&self.state);
        state.shown = false;
        state.hide_calls += 1;
        Ok(())
    }

    async fn set_size(&self, size: LogicalSize) -> Result<(), WindowError> {
        let mut state = lock(&self.state);
        state.size = Some((size.width, size.height));
        state.set_size_calls += 1;
        Ok(())
    }

    async fn outer_position(&self) -> Result<PhysicalPosition, WindowError> {
        Ok(lock(&self.state).position)
    }

    async fn set_position(&self, position: LogicalPosition) -> Result<(), WindowError> {
        let mut state = lock(&self.state);
        state.position = PhysicalPosition {
            x: position.x as f64,
            y: position.y as f64,
        };
        state.set_position_calls += 1;
        Ok(())
    }

    async fn scale_factor(&self) -> Result<f64, WindowError> {
        Ok(1.0)
    }

    async fn current_monitor(&self) -> Result<Option<PhysicalSize>, WindowError> {
        Ok(self.monitor)
    }
}

/// Host that answers from a fixed meeting state, or fails every command.
pub struct FakeHost {
    state: MeetingState,
    failing: bool,
    state_queries: AtomicUsize,
    expand_calls: AtomicUsize,
    restore_calls: AtomicUsize,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Self::build(MeetingState::not_in_meeting(), false)
    }

    pub fn with_state(state: MeetingState) -> Arc<Self> {
        Self::build(state, false)
    }

    pub fn failing() -> Arc<Self> {
        Self::build(MeetingState::not_in_meeting(), true)
    }

    fn build(state: MeetingState, failing: bool) -> Arc<Self> {
        Arc::new(Self {
            state,
            failing,
            state_queries: AtomicUsize::new(0),
            expand_calls: AtomicUsize::new(0),
            restore_calls: AtomicUsize::new(0),
        })
    }

    pub fn state_queries(&self) -> usize {
        self.state_queries.load(Ordering::SeqCst)
    }

    pub fn expand_calls(&self) -> usize {
        self.expand_calls.load(Ordering::SeqCst)
    }

    pub fn restore_calls(&self) -> usize {
        self.restore_calls.load(Ordering::SeqCst)
    }

    fn outcome(&self, command: &'static str) -> Result<(), HostError> {
        if self.failing {
            Err(HostError::Command {
                command,
                message: "fake failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl HostBridge for FakeHost {
    async fn get_meeting_state(&self) -> Result<MeetingState, HostError> {
        self.state_queries.fetch_add(1, Ordering::SeqCst);
        self.outcome("get_meeting_state")?;
        Ok(self.state.clone())
    }

    async fn expand_overlay(&self) -> Result<(), HostError> {
        self.expand_calls.fetch_add(1, Ordering::SeqCst);
        self.outcome("expand_overlay")
    }

    async fn restore_overlay(&self) -> Result<(), HostError> {
        self.restore_calls.fetch_add(1, Ordering::SeqCst);
        self.outcome("restore_overlay")
    }

    async fn open_home(&self) -> Result<(), HostError> {
        self.outcome("open_home")
    }
}

type Outcome = Result<MediaStream, DeviceError>;

/// Devices with scripted first outcomes. Later requests are granted with
/// fresh streams. Every track handed out is remembered.
pub struct FakeDevices {
    mic: Mutex<Option<Outcome>>,
    display: Mutex<Option<Outcome>>,
    gate: Option<Arc<Notify>>,
    mic_requests: AtomicUsize,
    display_requests: AtomicUsize,
    mic_constraints: Mutex<Option<AudioConstraints>>,
    issued: Mutex<Vec<Arc<dyn MediaTrack>>>,
}

impl FakeDevices {
    pub fn new(mic: Outcome, display: Outcome) -> Arc<Self> {
        Arc::new(Self::build(mic, display, None))
    }

    pub fn granting() -> Arc<Self> {
        Self::new(Ok(Self::mic_stream()), Ok(Self::system_stream()))
    }

    /// Microphone requests block until the returned gate is notified.
    pub fn gated() -> (Arc<Self>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let devices = Self::build(
            Ok(Self::mic_stream()),
            Ok(Self::system_stream()),
            Some(Arc::clone(&gate)),
        );
        (Arc::new(devices), gate)
    }

    fn build(mic: Outcome, display: Outcome, gate: Option<Arc<Notify>>) -> Self {
        Self {
            mic: Mutex::new(Some(mic)),
            display: Mutex::new(Some(display)),
            gate,
            mic_requests: AtomicUsize::new(0),
            display_requests: AtomicUsize::new(0),
            mic_constraints: Mutex::new(None),
            issued: Mutex::new(Vec::new()),
        }
    }

    pub fn mic_stream() -> MediaStream {
        MediaStream::new("microphone", vec![FakeTrack::audio("mic", 48_000, vec![0.1; 480])])
    }

    pub fn system_stream() -> MediaStream {
        MediaStream::new(
            "display",
            vec![
                FakeTrack::video("screen"),
                FakeTrack::audio("speakers", 48_000, vec![0.2; 480]),
            ],
        )
    }

    pub fn microphone_requests(&self) -> usize {
        self.mic_requests.load(Ordering::SeqCst)
    }

    pub fn display_requests(&self) -> usize {
        self.display_requests.load(Ordering::SeqCst)
    }

    pub fn last_mic_constraints(&self) -> Option<AudioConstraints> {
        *lock(&self.mic_constraints)
    }

    /// True once at least one track was issued and every issued track ended.
    pub fn all_tracks_stopped(&self) -> bool {
        let issued = lock(&self.issued);
        !issued.is_empty() && issued.iter().all(|track| track.state() == TrackState::Ended)
    }

    fn hand_out(&self, outcome: Outcome) -> Outcome {
        if let Ok(stream) = &outcome {
            let mut issued = lock(&self.issued);
            issued.extend(stream.audio_tracks());
            issued.extend(stream.video_tracks());
        }
        outcome
    }
}

#[async_trait]
impl MediaDevices for FakeDevices {
    async fn microphone(&self, constraints: AudioConstraints) -> Result<MediaStream, DeviceError> {
        self.mic_requests.fetch_add(1, Ordering::SeqCst);
        *lock(&self.mic_constraints) = Some(constraints);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let outcome = lock(&self.mic).take().unwrap_or_else(|| Ok(Self::mic_stream()));
        self.hand_out(outcome)
    }

    async fn display(&self, _constraints: DisplayConstraints) -> Result<MediaStream, DeviceError> {
        self.display_requests.fetch_add(1, Ordering::SeqCst);
        let outcome = lock(&self.display)
            .take()
            .unwrap_or_else(|| Ok(Self::system_stream()));
        self.hand_out(outcome)
    }
}

/// Encoder supporting only `audio/wav`; its output is the raw mix as
/// little-endian f32 after a fixed header chunk.
pub struct FakeEncoderFactory {
    started: AtomicUsize,
    fail_on_finish: Arc<AtomicBool>,
}

impl FakeEncoderFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: AtomicUsize::new(0),
            fail_on_finish: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn fail_on_finish(&self) {
        self.fail_on_finish.store(true, Ordering::SeqCst);
    }

    pub fn sessions_started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

impl EncoderFactory for FakeEncoderFactory {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        mime_type == "audio/wav"
    }

    fn default_mime_type(&self) -> &'static str {
        "audio/wav"
    }

    fn start(
        &self,
        stream: MixedStream,
        mime_type: Option<&str>,
    ) -> Result<Box<dyn EncoderSession>, EncodeError> {
        let mime_type = mime_type.unwrap_or(self.default_mime_type());
        if !self.is_type_supported(mime_type) {
            return Err(EncodeError::Unsupported(mime_type.to_string()));
        }
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeEncoderSession {
            mime_type: mime_type.to_string(),
            stream,
            fail: Arc::clone(&self.fail_on_finish),
        }))
    }
}

struct FakeEncoderSession {
    mime_type: String,
    stream: MixedStream,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl EncoderSession for FakeEncoderSession {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn finish(self: Box<Self>) -> Result<Vec<Vec<u8>>, EncodeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EncodeError::Task("fake encoder failure".to_string()));
        }
        let samples: Vec<u8> = self
            .stream
            .pull()
            .iter()
            .flat_map(|sample| sample.to_le_bytes())
            .collect();
        Ok(vec![b"FAKE".to_vec(), samples])
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

pub struct FakeStorage {
    failing: bool,
    attempts: AtomicUsize,
    uploads: Mutex<Vec<StoredObject>>,
}

impl FakeStorage {
    pub fn new() -> Arc<Self> {
        Self::build(false)
    }

    /// Rejects every upload as over quota.
    pub fn failing() -> Arc<Self> {
        Self::build(true)
    }

    fn build(failing: bool) -> Arc<Self> {
        Arc::new(Self {
            failing,
            attempts: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
        })
    }

    pub fn uploads(&self) -> Vec<StoredObject> {
        lock(&self.uploads).clone()
    }

    pub fn upload_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(StorageError::Rejected {
                status: 413,
                message: "quota exceeded".to_string(),
            });
        }
        lock(&self.uploads).push(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            bytes,
            content_type: content_type.to_string(),
        });
        Ok(format!("{bucket}/{path}"))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("fake://{bucket}/{path}")
    }
}
