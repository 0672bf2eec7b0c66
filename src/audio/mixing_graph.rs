//! Audio graph combining capture tracks into one mixed stream.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::audio_mixer::AudioMixer;
use super::track::{MediaStream, MediaTrack, TrackKind, TrackState};

/// Builder for a single mix destination.
pub struct MixingGraph {
    sample_rate: u32,
    sources: Vec<Arc<dyn MediaTrack>>,
}

impl MixingGraph {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            sources: Vec::new(),
        }
    }

    /// Connect every audio track of `stream`. Video tracks are never mixed.
    /// Returns how many tracks were connected.
    pub fn connect(&mut self, stream: &MediaStream) -> usize {
        let audio = stream.audio_tracks();
        let connected = audio.len();
        for track in audio {
            debug!("Connecting {} track {} to mix", stream.label(), track.id());
            self.sources.push(track);
        }
        connected
    }

    /// Finish wiring and expose the destination stream.
    pub fn into_destination(self) -> MixedStream {
        info!(
            "Mix destination ready: {} source(s) at {}Hz",
            self.sources.len(),
            self.sample_rate
        );
        MixedStream {
            inner: Arc::new(MixedInner {
                sample_rate: self.sample_rate,
                sources: self.sources,
                closed: AtomicBool::new(false),
            }),
        }
    }
}

struct MixedInner {
    sample_rate: u32,
    sources: Vec<Arc<dyn MediaTrack>>,
    closed: AtomicBool,
}

/// The mix destination's output. Cloned handles share the same graph.
#[derive(Clone)]
pub struct MixedStream {
    inner: Arc<MixedInner>,
}

impl MixedStream {
    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn connected_sources(&self) -> usize {
        self.inner.sources.len()
    }

    /// Drain every connected source, bring it to the destination rate, and
    /// mix into one block. A closed graph yields nothing.
    pub fn pull(&self) -> Vec<f32> {
        if self.is_closed() {
            return Vec::new();
        }

        let blocks: Vec<Vec<f32>> = self
            .inner
            .sources
            .iter()
            .filter(|track| track.kind() == TrackKind::Audio && track.state() == TrackState::Live)
            .map(|track| {
                AudioMixer::resample(&track.drain_samples(), track.sample_rate(), self.inner.sample_rate)
            })
            .collect();

        AudioMixer::mix(&blocks)
    }

    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

/// Everything one recording session acquired. Released exactly once, either
/// explicitly or on drop.
pub struct MediaGraph {
    mic: MediaStream,
    system: Option<MediaStream>,
    mixed: MixedStream,
    released: bool,
}

impl MediaGraph {
    pub fn new(mic: MediaStream, system: Option<MediaStream>, mixed: MixedStream) -> Self {
        Self {
            mic,
            system,
            mixed,
            released: false,
        }
    }

    pub fn mixed(&self) -> &MixedStream {
        &self.mixed
    }

    pub fn system(&self) -> Option<&MediaStream> {
        self.system.as_ref()
    }

    pub fn connected_sources(&self) -> usize {
        self.mixed.connected_sources()
    }

    /// Stop the destination and every track of every stream.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        self.mixed.close();
        self.mic.stop();
        if let Some(system) = &self.system {
            system.stop();
        }
        info!("Media graph released");
    }

    pub fn is_released(&self) -> bool {
        self.released
            && self.mixed.is_closed()
            && self.mic.is_stopped()
            && self.system.as_ref().map_or(true, MediaStream::is_stopped)
    }
}

impl fmt::Debug for MediaGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaGraph")
            .field("mic", &self.mic)
            .field("system", &self.system)
            .field("sources", &self.mixed.connected_sources())
            .field("released", &self.released)
            .finish()
    }
}

impl Drop for MediaGraph {
    fn drop(&mut self) {
        if !self.released {
            debug!("Dropping unreleased media graph, releasing");
            self.release();
        }
    }
}
