//! Capture devices, the mixing graph and encoders.

pub mod acquisition;
pub mod audio_mixer;
pub mod capture;
pub mod devices;
pub mod encoder;
pub mod mic_source;
pub mod mixing_graph;
pub mod system_source;
pub mod track;

pub use acquisition::{AcquisitionEngine, AcquisitionError};
pub use audio_mixer::AudioMixer;
pub use devices::{AudioConstraints, CpalDevices, DeviceError, DisplayConstraints, MediaDevices};
pub use encoder::{
    select_mime_type, EncodeError, EncoderFactory, EncoderSession, WavEncoderFactory,
    PREFERRED_MIME_TYPES,
};
pub use mixing_graph::{MediaGraph, MixedStream, MixingGraph};
pub use track::{MediaStream, MediaTrack, TrackKind, TrackState};
