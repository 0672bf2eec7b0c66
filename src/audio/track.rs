//! Media tracks and streams handed out by capture devices.
//!
//! A track is one capture channel (an audio source or a video source) with an
//! explicit stop. A stream groups the tracks returned by one device request
//! and owns them until released.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Live,
    Ended,
}

/// One capture channel owned by exactly one [`MediaStream`].
pub trait MediaTrack: Send + Sync {
    fn id(&self) -> &str;

    fn kind(&self) -> TrackKind;

    /// Native sample rate of the captured audio. Video tracks report 0.
    fn sample_rate(&self) -> u32;

    /// Take every sample captured since the previous call.
    fn drain_samples(&self) -> Vec<f32>;

    /// Stop capturing and release the underlying device. Idempotent.
    fn stop(&self);

    fn state(&self) -> TrackState;
}

/// Samples written by a device callback and drained by the mixer.
#[derive(Clone, Default)]
pub struct SampleBuffer {
    inner: Arc<Mutex<Vec<f32>>>,
}

impl SampleBuffer {
    pub fn push(&self, data: &[f32]) {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend_from_slice(data);
    }

    pub fn drain(&self) -> Vec<f32> {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *guard)
    }

    pub fn clear(&self) {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clear();
        guard.shrink_to_fit();
    }
}

/// Live/ended flag shared between a track handle and its capture worker.
#[derive(Clone, Default)]
pub struct TrackLifecycle {
    ended: Arc<AtomicBool>,
}

impl TrackLifecycle {
    /// Marks the track ended. Returns true only for the first call.
    pub fn end(&self) -> bool {
        !self.ended.swap(true, Ordering::SeqCst)
    }

    pub fn state(&self) -> TrackState {
        if self.ended.load(Ordering::SeqCst) {
            TrackState::Ended
        } else {
            TrackState::Live
        }
    }
}

/// The set of tracks returned by a single device request.
pub struct MediaStream {
    label: String,
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(label: impl Into<String>, tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self {
            label: label.into(),
            tracks,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn audio_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks_of(TrackKind::Audio)
    }

    pub fn video_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks_of(TrackKind::Video)
    }

    /// Stop every track in the stream, audio and video alike.
    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.tracks
            .iter()
            .all(|track| track.state() == TrackState::Ended)
    }

    fn tracks_of(&self, kind: TrackKind) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks
            .iter()
            .filter(|track| track.kind() == kind)
            .cloned()
            .collect()
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("label", &self.label)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}
