//! cpal-backed capture tracks.
//!
//! cpal streams are not `Send` on every platform, so each track owns a
//! dedicated thread that opens the device, builds the stream, and keeps it
//! alive until the track is stopped.

use cpal::traits::{DeviceTrait, StreamTrait};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use super::devices::DeviceError;
use super::track::{MediaTrack, SampleBuffer, TrackKind, TrackLifecycle, TrackState};

/// Device selection run on the capture thread: returns the device and the
/// stream configuration to open it with.
pub type DeviceSelector =
    Box<dyn FnOnce() -> Result<(cpal::Device, cpal::StreamConfig), DeviceError> + Send>;

pub struct CpalTrack {
    id: String,
    sample_rate: u32,
    buffer: SampleBuffer,
    lifecycle: TrackLifecycle,
    stop_tx: Mutex<Option<std_mpsc::Sender<()>>>,
}

impl MediaTrack for CpalTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        TrackKind::Audio
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn drain_samples(&self) -> Vec<f32> {
        self.buffer.drain()
    }

    fn stop(&self) {
        if !self.lifecycle.end() {
            return;
        }
        // Dropping the sender wakes the capture thread, which drops the stream.
        self.stop_tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        self.buffer.clear();
        debug!("Capture track {} stopped", self.id);
    }

    fn state(&self) -> TrackState {
        self.lifecycle.state()
    }
}

impl Drop for CpalTrack {
    fn drop(&mut self) {
        if self.lifecycle.state() == TrackState::Live {
            debug!("Dropping live capture track {}, stopping", self.id);
            self.stop();
        }
    }
}

/// Open a device on its own thread and start capturing mono f32 samples.
pub async fn start_capture(label: &str, select: DeviceSelector) -> Result<Arc<CpalTrack>, DeviceError> {
    let buffer = SampleBuffer::default();
    let (ready_tx, ready_rx) = oneshot::channel::<Result<u32, DeviceError>>();
    let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

    let thread_label = label.to_string();
    let callback_buffer = buffer.clone();

    std::thread::Builder::new()
        .name(format!("capture-{label}"))
        .spawn(move || {
            let (device, config) = match select() {
                Ok(selected) => selected,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let error_label = thread_label.clone();
            let stream = match device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| callback_buffer.push(data),
                move |err| error!("{} stream error: {}", error_label, err),
                None,
            ) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(map_build_error(&thread_label, e)));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(map_play_error(&thread_label, e)));
                return;
            }

            if ready_tx.send(Ok(config.sample_rate.0)).is_err() {
                return;
            }

            // Blocks until the track drops its sender.
            let _ = stop_rx.recv();
            drop(stream);
            debug!("{} capture thread exiting", thread_label);
        })
        .map_err(|e| DeviceError::Backend {
            device: label.to_string(),
            message: format!("failed to spawn capture thread: {e}"),
        })?;

    let sample_rate = match ready_rx.await {
        Ok(Ok(rate)) => rate,
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            return Err(DeviceError::Backend {
                device: label.to_string(),
                message: "capture thread exited before the stream started".to_string(),
            })
        }
    };

    info!("{} capture started at {}Hz", label, sample_rate);

    Ok(Arc::new(CpalTrack {
        id: format!("{label}-{}", uuid::Uuid::new_v4()),
        sample_rate,
        buffer,
        lifecycle: TrackLifecycle::default(),
        stop_tx: Mutex::new(Some(stop_tx)),
    }))
}

fn map_build_error(label: &str, err: cpal::BuildStreamError) -> DeviceError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => DeviceError::NotFound(label.to_string()),
        cpal::BuildStreamError::StreamConfigNotSupported
        | cpal::BuildStreamError::InvalidArgument => DeviceError::NotSupported(label.to_string()),
        other => DeviceError::from_backend(label, other.to_string()),
    }
}

fn map_play_error(label: &str, err: cpal::PlayStreamError) -> DeviceError {
    match err {
        cpal::PlayStreamError::DeviceNotAvailable => DeviceError::NotFound(label.to_string()),
        other => DeviceError::from_backend(label, other.to_string()),
    }
}
