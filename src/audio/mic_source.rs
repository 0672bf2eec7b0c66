//! Microphone capture via cpal.

use cpal::traits::{DeviceTrait, HostTrait};
use std::sync::Arc;
use tracing::{info, warn};

use super::capture::{self, DeviceSelector};
use super::devices::{AudioConstraints, DeviceError};
use super::track::{MediaStream, MediaTrack};

const LABEL: &str = "microphone";

/// Open the default input device as a single-track mono stream.
///
/// cpal hands out the driver's unprocessed signal, which is what the mixer
/// expects; requests for driver-side processing are logged and ignored.
pub async fn open(sample_rate: u32, constraints: AudioConstraints) -> Result<MediaStream, DeviceError> {
    if constraints != AudioConstraints::raw() {
        warn!(
            "Driver-level processing requested ({:?}) but not available; capturing raw input",
            constraints
        );
    }

    let select: DeviceSelector = Box::new(move || {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| DeviceError::NotFound(LABEL.to_string()))?;

        info!(
            "Microphone using device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((device, config))
    });

    let track: Arc<dyn MediaTrack> = capture::start_capture(LABEL, select).await?;
    Ok(MediaStream::new(LABEL, vec![track]))
}
