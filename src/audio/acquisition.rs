//! Acquire microphone and system audio and wire them into one mix.
//!
//! The overlay is expanded for the whole acquisition so OS permission
//! prompts are not clipped, and always restored afterwards.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::devices::{AudioConstraints, DeviceError, DisplayConstraints, MediaDevices};
use super::mixing_graph::{MediaGraph, MixingGraph};
use crate::host::HostBridge;
use crate::overlay::{ExpandGuard, OverlayHandle};

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("microphone access denied: {0}")]
    MicrophoneDenied(String),
    #[error("microphone unavailable: {0}")]
    MicrophoneUnavailable(String),
}

impl From<DeviceError> for AcquisitionError {
    fn from(err: DeviceError) -> Self {
        let message = err.to_string();
        match err {
            DeviceError::PermissionDenied(_) => Self::MicrophoneDenied(message),
            _ => Self::MicrophoneUnavailable(message),
        }
    }
}

pub struct AcquisitionEngine {
    devices: Arc<dyn MediaDevices>,
    host: Arc<dyn HostBridge>,
    overlay: OverlayHandle,
    sample_rate: u32,
}

impl AcquisitionEngine {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        host: Arc<dyn HostBridge>,
        overlay: OverlayHandle,
        sample_rate: u32,
    ) -> Self {
        Self {
            devices,
            host,
            overlay,
            sample_rate,
        }
    }

    /// Expand, acquire, restore. Restore runs on every path, after the
    /// device requests have completed.
    pub async fn acquire(&self) -> Result<MediaGraph, AcquisitionError> {
        let guard = ExpandGuard::enter(Arc::clone(&self.host), self.overlay.clone()).await;
        let result = self.acquire_devices().await;
        guard.restore().await;
        result
    }

    async fn acquire_devices(&self) -> Result<MediaGraph, AcquisitionError> {
        let mic = self
            .devices
            .microphone(AudioConstraints::raw())
            .await
            .map_err(|e| {
                warn!("Microphone request failed: {}", e);
                AcquisitionError::from(e)
            })?;

        let system = match self
            .devices
            .display(DisplayConstraints::audio_and_video())
            .await
        {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!("System audio unavailable, recording microphone only: {}", e);
                None
            }
        };

        let mut graph = MixingGraph::new(self.sample_rate);
        graph.connect(&mic);

        if let Some(stream) = &system {
            if stream.audio_tracks().is_empty() {
                warn!("System capture has no audio track, recording microphone only");
            } else {
                graph.connect(stream);
            }
        }

        let mixed = graph.into_destination();
        info!(
            "Acquired media graph with {} source(s)",
            mixed.connected_sources()
        );
        Ok(MediaGraph::new(mic, system, mixed))
    }
}
