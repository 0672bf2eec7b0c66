//! Encoder sessions over the mixed stream.
//!
//! An encoder pulls from the mix destination once per timeslice and hands
//! back its output as chunks when finished. A WAV header carries the final
//! data length, so the WAV encoder buffers everything and returns one chunk.

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::audio_mixer::AudioMixer;
use super::mixing_graph::MixedStream;

/// Container/codec preferences, most preferred first.
pub const PREFERRED_MIME_TYPES: [&str; 4] = [
    "audio/webm;codecs=opus",
    "audio/webm",
    "audio/ogg;codecs=opus",
    "audio/ogg",
];

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("unsupported MIME type: {0}")]
    Unsupported(String),
    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),
    #[error("encoder task failed: {0}")]
    Task(String),
}

pub trait EncoderFactory: Send + Sync {
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// What the encoder produces when no preference is supported.
    fn default_mime_type(&self) -> &'static str;

    /// Start encoding `stream`. `None` selects the platform default.
    fn start(
        &self,
        stream: MixedStream,
        mime_type: Option<&str>,
    ) -> Result<Box<dyn EncoderSession>, EncodeError>;
}

#[async_trait]
pub trait EncoderSession: Send + Sync {
    fn mime_type(&self) -> &str;

    /// Stop encoding and wait until every buffered chunk is available.
    async fn finish(self: Box<Self>) -> Result<Vec<Vec<u8>>, EncodeError>;
}

/// First preference the factory supports, if any.
pub fn select_mime_type(factory: &dyn EncoderFactory, preferences: &[String]) -> Option<String> {
    preferences
        .iter()
        .find(|mime| factory.is_type_supported(mime))
        .cloned()
}

/// File extension for a MIME type, ignoring codec parameters.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "audio/webm" | "video/webm" => "webm",
        "audio/ogg" => "ogg",
        "audio/wav" | "audio/wave" | "audio/x-wav" => "wav",
        "audio/mpeg" => "mp3",
        "audio/mp4" => "m4a",
        _ => "bin",
    }
}

const WAV_MIME_TYPES: [&str; 3] = ["audio/wav", "audio/wave", "audio/x-wav"];

/// Mono 16-bit WAV, the default encoder on every platform.
pub struct WavEncoderFactory {
    timeslice: Duration,
}

impl WavEncoderFactory {
    pub fn new(timeslice: Duration) -> Self {
        Self { timeslice }
    }
}

impl EncoderFactory for WavEncoderFactory {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        WAV_MIME_TYPES
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(mime_type.trim()))
    }

    fn default_mime_type(&self) -> &'static str {
        WAV_MIME_TYPES[0]
    }

    fn start(
        &self,
        stream: MixedStream,
        mime_type: Option<&str>,
    ) -> Result<Box<dyn EncoderSession>, EncodeError> {
        let mime_type = match mime_type {
            Some(mime) if self.is_type_supported(mime) => mime.to_string(),
            Some(mime) => return Err(EncodeError::Unsupported(mime.to_string())),
            None => self.default_mime_type().to_string(),
        };

        let spec = WavSpec {
            channels: 1,
            sample_rate: stream.sample_rate(),
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(encode_wav(stream, spec, self.timeslice, stop_rx));

        info!("WAV encoder started ({})", mime_type);

        Ok(Box::new(WavEncoderSession {
            mime_type,
            stop_tx: Some(stop_tx),
            task,
        }))
    }
}

struct WavEncoderSession {
    mime_type: String,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<Vec<Vec<u8>>, EncodeError>>,
}

#[async_trait]
impl EncoderSession for WavEncoderSession {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn finish(mut self: Box<Self>) -> Result<Vec<Vec<u8>>, EncodeError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) => Err(EncodeError::Task(e.to_string())),
        }
    }
}

impl Drop for WavEncoderSession {
    fn drop(&mut self) {
        if self.stop_tx.is_some() {
            self.task.abort();
        }
    }
}

async fn encode_wav(
    stream: MixedStream,
    spec: WavSpec,
    timeslice: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) -> Result<Vec<Vec<u8>>, EncodeError> {
    let mut output = Vec::new();
    let mut total_samples = 0usize;
    {
        let mut writer = WavWriter::new(Cursor::new(&mut output), spec)?;
        let mut ticker = tokio::time::interval(timeslice);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    total_samples += write_block(&mut writer, &stream.pull())?;
                }
                _ = &mut stop_rx => break,
            }
        }

        // Whatever arrived after the last tick.
        total_samples += write_block(&mut writer, &stream.pull())?;
        writer.finalize()?;
    }

    debug!(
        "WAV encoder finished: {} samples, {} bytes",
        total_samples,
        output.len()
    );
    Ok(vec![output])
}

fn write_block<W>(writer: &mut WavWriter<W>, block: &[f32]) -> Result<usize, hound::Error>
where
    W: std::io::Write + std::io::Seek,
{
    for sample in AudioMixer::to_i16(block) {
        writer.write_sample(sample)?;
    }
    Ok(block.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{MediaStream, MixingGraph};
    use crate::test_support::FakeTrack;

    fn prefs() -> Vec<String> {
        PREFERRED_MIME_TYPES.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_select_falls_back_when_nothing_supported() {
        let factory = WavEncoderFactory::new(Duration::from_millis(100));
        assert_eq!(select_mime_type(&factory, &prefs()), None);
        assert_eq!(factory.default_mime_type(), "audio/wav");
    }

    #[test]
    fn test_select_takes_first_supported() {
        let factory = WavEncoderFactory::new(Duration::from_millis(100));
        let preferences = vec![
            "audio/webm".to_string(),
            "audio/x-wav".to_string(),
            "audio/wav".to_string(),
        ];
        assert_eq!(
            select_mime_type(&factory, &preferences),
            Some("audio/x-wav".to_string())
        );
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("audio/webm;codecs=opus"), "webm");
        assert_eq!(extension_for_mime("audio/ogg"), "ogg");
        assert_eq!(extension_for_mime("audio/wav"), "wav");
        assert_eq!(extension_for_mime("application/x-unknown"), "bin");
    }

    #[tokio::test]
    async fn test_start_rejects_unsupported_type() {
        let factory = WavEncoderFactory::new(Duration::from_millis(100));
        let stream = MixingGraph::new(16_000).into_destination();
        let result = factory.start(stream, Some("audio/ogg"));
        assert!(matches!(result, Err(EncodeError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_wav_session_produces_valid_file() {
        let mic = MediaStream::new("mic", vec![FakeTrack::audio("mic", 16_000, vec![0.25; 1600])]);
        let mut graph = MixingGraph::new(16_000);
        graph.connect(&mic);

        let factory = WavEncoderFactory::new(Duration::from_millis(10));
        let session = factory.start(graph.into_destination(), None).unwrap();
        assert_eq!(session.mime_type(), "audio/wav");

        let chunks = session.finish().await.unwrap();
        assert_eq!(chunks.len(), 1);
        let bytes: Vec<u8> = chunks.concat();

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 1600);
    }
}
