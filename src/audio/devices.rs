//! Capability interface over local capture devices.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use super::mic_source;
use super::system_source;
use super::track::MediaStream;

/// Driver-level processing requested for a microphone stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl AudioConstraints {
    /// Unprocessed signal: the mixer wants the raw input.
    pub fn raw() -> Self {
        Self {
            echo_cancellation: false,
            noise_suppression: false,
            auto_gain_control: false,
        }
    }
}

/// What to request from a display/system capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConstraints {
    pub audio: bool,
    /// Some platforms only share system audio together with a video source.
    pub video: bool,
}

impl DisplayConstraints {
    pub fn audio_and_video() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("permission to use {0} was denied")]
    PermissionDenied(String),
    #[error("no {0} device available")]
    NotFound(String),
    #[error("{0} does not support the requested configuration")]
    NotSupported(String),
    #[error("{device} backend error: {message}")]
    Backend { device: String, message: String },
}

impl DeviceError {
    /// Map a backend failure message onto the error taxonomy. Backends rarely
    /// expose a typed permission error, so denial is recognised by text.
    pub fn from_backend(device: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("permission") || lower.contains("denied") || lower.contains("not allowed")
        {
            Self::PermissionDenied(device.to_string())
        } else {
            Self::Backend {
                device: device.to_string(),
                message,
            }
        }
    }
}

#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn microphone(&self, constraints: AudioConstraints) -> Result<MediaStream, DeviceError>;

    async fn display(&self, constraints: DisplayConstraints) -> Result<MediaStream, DeviceError>;
}

/// Capture devices backed by cpal.
pub struct CpalDevices {
    sample_rate: u32,
}

impl CpalDevices {
    pub fn new(sample_rate: u32) -> Self {
        info!("Capture devices configured at {}Hz", sample_rate);
        Self { sample_rate }
    }
}

#[async_trait]
impl MediaDevices for CpalDevices {
    async fn microphone(&self, constraints: AudioConstraints) -> Result<MediaStream, DeviceError> {
        mic_source::open(self.sample_rate, constraints).await
    }

    async fn display(&self, constraints: DisplayConstraints) -> Result<MediaStream, DeviceError> {
        system_source::open(constraints).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_constraints_disable_processing() {
        let constraints = AudioConstraints::raw();
        assert!(!constraints.echo_cancellation);
        assert!(!constraints.noise_suppression);
        assert!(!constraints.auto_gain_control);
    }

    #[test]
    fn test_backend_permission_text_maps_to_denied() {
        let err = DeviceError::from_backend("microphone", "Access Denied by user");
        assert!(matches!(err, DeviceError::PermissionDenied(_)));

        let err = DeviceError::from_backend("microphone", "stream underrun");
        assert!(matches!(err, DeviceError::Backend { .. }));
    }
}
