//! System audio capture (what the other meeting participants say).
//!
//! Captures from a PipeWire/PulseAudio monitor source, which exposes the
//! system's audio output as an input device. There is no screen capture on
//! this backend, so a request for video yields an audio-only stream.

use cpal::traits::{DeviceTrait, HostTrait};
use std::sync::Arc;
use tracing::{debug, info};

use super::capture::{self, DeviceSelector};
use super::devices::{DeviceError, DisplayConstraints};
use super::track::{MediaStream, MediaTrack};

const LABEL: &str = "system audio";

pub async fn open(constraints: DisplayConstraints) -> Result<MediaStream, DeviceError> {
    if !constraints.audio {
        return Err(DeviceError::NotSupported("display video".to_string()));
    }
    if constraints.video {
        debug!("Video requested alongside system audio; this backend shares audio only");
    }

    let select: DeviceSelector = Box::new(|| {
        let (device, sample_rate) =
            find_monitor_device().ok_or_else(|| DeviceError::NotFound(LABEL.to_string()))?;

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

/// Find a monitor source among the input devices.
fn find_monitor_device() -> Option<(cpal::Device, u32)> {
    let host = cpal::default_host();

    for device in host.input_devices().ok()? {
        let Ok(name) = device.name() else {
            continue;
        };
        if !name.to_lowercase().contains("monitor") {
            continue;
        }
        if let Ok(default_config) = device.default_input_config() {
            let sample_rate = default_config.sample_rate().0;
            info!("Found system audio monitor: {} ({}Hz)", name, sample_rate);
            return Some((device, sample_rate));
        }
    }

    None
}
