//! The recording session state machine.
//!
//! `Idle -> Acquiring -> Recording -> Finalizing -> Idle`. One session owns
//! the acquired media graph and encoder; commands arrive over an mpsc
//! channel and are applied one at a time.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::status::{RecordingStatusHandle, SessionPhase};
use super::ticker::ElapsedTicker;
use crate::audio::acquisition::{AcquisitionEngine, AcquisitionError};
use crate::audio::encoder::{select_mime_type, EncoderFactory, EncoderSession};
use crate::audio::mixing_graph::MediaGraph;
use crate::host::HostBridge;
use crate::overlay::{restore_compact, OverlayHandle};
use crate::persistence::{Artifact, PersistPipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingCommand {
    Start,
    Stop,
    Toggle,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub mime_preferences: Vec<String>,
    pub elapsed_tick: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mime_preferences: crate::audio::PREFERRED_MIME_TYPES
                .iter()
                .map(|mime| mime.to_string())
                .collect(),
            elapsed_tick: Duration::from_millis(500),
        }
    }
}

/// Everything held while `Recording`.
struct ActiveSession {
    graph: MediaGraph,
    encoder: Box<dyn EncoderSession>,
    ticker: ElapsedTicker,
    captured_at: DateTime<Utc>,
}

pub struct RecordingSession {
    engine: AcquisitionEngine,
    encoders: Arc<dyn EncoderFactory>,
    pipeline: Arc<PersistPipeline>,
    host: Arc<dyn HostBridge>,
    overlay: OverlayHandle,
    status: RecordingStatusHandle,
    options: SessionOptions,
    active: Option<ActiveSession>,
    uploads: Vec<JoinHandle<()>>,
}

impl RecordingSession {
    pub fn new(
        engine: AcquisitionEngine,
        encoders: Arc<dyn EncoderFactory>,
        pipeline: Arc<PersistPipeline>,
        host: Arc<dyn HostBridge>,
        overlay: OverlayHandle,
        status: RecordingStatusHandle,
        options: SessionOptions,
    ) -> Self {
        Self {
            engine,
            encoders,
            pipeline,
            host,
            overlay,
            status,
            options,
            active: None,
            uploads: Vec::new(),
        }
    }

    pub fn status(&self) -> RecordingStatusHandle {
        self.status.clone()
    }

    /// Apply commands until the sender side closes. Commands arriving while
    /// acquisition or finalization is in flight are ignored.
    pub async fn run(mut self, mut rx: mpsc::Receiver<RecordingCommand>) {
        while let Some(command) = rx.recv().await {
            let phase = self.status.phase().await;
            let command = match (command, phase) {
                (RecordingCommand::Toggle, SessionPhase::Idle) => RecordingCommand::Start,
                (RecordingCommand::Toggle, _) => RecordingCommand::Stop,
                (command, _) => command,
            };

            match command {
                RecordingCommand::Start => {
                    if !self.begin_start().await {
                        continue;
                    }
                    let acquired =
                        ignore_commands(&mut rx, SessionPhase::Acquiring, self.engine.acquire())
                            .await;
                    self.complete_start(acquired).await;
                }
                RecordingCommand::Stop => {
                    let Some(active) = self.begin_stop().await else {
                        continue;
                    };
                    let upload =
                        ignore_commands(&mut rx, SessionPhase::Finalizing, self.finalize(active))
                            .await;
                    self.uploads.extend(upload);
                }
                RecordingCommand::Toggle => {}
            }
            self.uploads.retain(|task| !task.is_finished());
        }

        debug!("Recording command channel closed");
        self.shutdown().await;
    }

    pub async fn start(&mut self) -> SessionPhase {
        if self.begin_start().await {
            let acquired = self.engine.acquire().await;
            self.complete_start(acquired).await;
        }
        self.status.phase().await
    }

    pub async fn stop(&mut self) -> SessionPhase {
        if let Some(active) = self.begin_stop().await {
            let upload = self.finalize(active).await;
            self.uploads.extend(upload);
        }
        self.status.phase().await
    }

    pub async fn toggle(&mut self) -> SessionPhase {
        match self.status.phase().await {
            SessionPhase::Idle => self.start().await,
            _ => self.stop().await,
        }
    }

    /// Stop any recording in progress and wait for pending uploads.
    pub async fn shutdown(&mut self) {
        self.stop().await;
        self.wait_for_uploads().await;
    }

    pub async fn wait_for_uploads(&mut self) {
        for task in self.uploads.drain(..) {
            if let Err(e) = task.await {
                warn!("Upload task ended abnormally: {}", e);
            }
        }
    }

    async fn begin_start(&mut self) -> bool {
        let phase = self.status.phase().await;
        if phase != SessionPhase::Idle || self.active.is_some() {
            info!("Start ignored while {}", phase.as_str());
            return false;
        }
        info!("Recording session: acquiring devices");
        self.status.set(SessionPhase::Acquiring, None).await;
        true
    }

    async fn complete_start(&mut self, acquired: Result<MediaGraph, AcquisitionError>) {
        let mut graph = match acquired {
            Ok(graph) => graph,
            Err(e) => {
                error!("Failed to start recording: {}", e);
                self.status.set(SessionPhase::Idle, Some(e.to_string())).await;
                return;
            }
        };

        let mime_type = select_mime_type(self.encoders.as_ref(), &self.options.mime_preferences);
        if mime_type.is_none() {
            info!(
                "No preferred encoding supported, using {}",
                self.encoders.default_mime_type()
            );
        }

        let encoder = match self
            .encoders
            .start(graph.mixed().clone(), mime_type.as_deref())
        {
            Ok(encoder) => encoder,
            Err(e) => {
                error!("Failed to start encoder: {}", e);
                graph.release();
                self.status.set(SessionPhase::Idle, Some(e.to_string())).await;
                return;
            }
        };

        self.status.begin_recording().await;
        let ticker = ElapsedTicker::start(self.status.clone(), self.options.elapsed_tick);
        info!(
            "Recording started ({} source(s), {})",
            graph.connected_sources(),
            encoder.mime_type()
        );

        self.active = Some(ActiveSession {
            graph,
            encoder,
            ticker,
            captured_at: Utc::now(),
        });
    }

    async fn begin_stop(&mut self) -> Option<ActiveSession> {
        let phase = self.status.phase().await;
        if phase != SessionPhase::Recording {
            info!("Stop ignored while {}", phase.as_str());
            return None;
        }
        let active = self.active.take()?;
        info!("Recording session: finalizing");
        self.status.set(SessionPhase::Finalizing, None).await;
        Some(active)
    }

    /// Flush the encoder, release every device, and hand the artifact to the
    /// pipeline. Returns the spawned upload task, if any.
    async fn finalize(&self, active: ActiveSession) -> Option<JoinHandle<()>> {
        let ActiveSession {
            mut graph,
            encoder,
            ticker,
            captured_at,
        } = active;

        let recorded_ms = ticker.elapsed_ms();
        drop(ticker);

        let mime_type = encoder.mime_type().to_string();
        let chunks = encoder.finish().await;

        graph.release();
        restore_compact(self.host.as_ref(), &self.overlay).await;

        let upload = match chunks {
            Ok(chunks) => {
                let artifact = Artifact::from_chunks(chunks, &mime_type, captured_at);
                info!(
                    "Recording finalized: {} ({} bytes, ~{} ms)",
                    artifact.name(),
                    artifact.len(),
                    recorded_ms
                );
                self.status.record_artifact(artifact.summary()).await;
                Some(self.spawn_persist(artifact))
            }
            Err(e) => {
                error!("Encoder failed, recording discarded: {}", e);
                None
            }
        };

        self.status.set(SessionPhase::Idle, None).await;
        upload
    }

    fn spawn_persist(&self, artifact: Artifact) -> JoinHandle<()> {
        let pipeline = Arc::clone(&self.pipeline);
        let status = self.status.clone();
        tokio::spawn(async move {
            let name = artifact.name().to_string();
            match pipeline.persist(artifact).await {
                Ok(result) => {
                    info!("Recording {} saved at {}", name, result.locator);
                    status.record_saved(result.locator).await;
                }
                Err(e) => error!("Failed to persist recording {}: {}", name, e),
            }
        })
    }
}

/// Drive `work` to completion, dropping any command received meanwhile.
async fn ignore_commands<F: Future>(
    rx: &mut mpsc::Receiver<RecordingCommand>,
    phase: SessionPhase,
    work: F,
) -> F::Output {
    tokio::pin!(work);
    loop {
        tokio::select! {
            output = &mut work => return output,
            Some(command) = rx.recv() => {
                warn!("Ignoring {:?} while {}", command, phase.as_str());
            }
        }
    }
}
