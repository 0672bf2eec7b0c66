use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::api::{ApiServer, MeetingRoutes, OverlayRoutes, RecordingState};
use crate::audio::{AcquisitionEngine, CpalDevices, WavEncoderFactory};
use crate::config::Config;
use crate::host::LocalHost;
use crate::meeting::MeetingWatcher;
use crate::overlay::{GeometryController, ManagedWindow, OverlayHandle, OverlayWindow};
use crate::persistence::PersistPipeline;
use crate::recording::{RecordingCommand, RecordingSession, RecordingStatusHandle, SessionOptions};

pub async fn run_service() -> Result<()> {
    info!("Starting Actura overlay service");

    let config = Config::load()?;

    let window = ManagedWindow::from_config(&config.overlay);
    let overlay_window: Arc<dyn OverlayWindow> = Arc::new(window.clone());
    let overlay = OverlayHandle::new(Arc::clone(&overlay_window));
    let geometry = GeometryController::spawn(overlay.clone());

    let host = Arc::new(LocalHost::new(overlay_window, &config.overlay));
    let events = host.subscribe();
    let watcher = MeetingWatcher::start(host.clone(), events, overlay.clone()).await;

    let engine = AcquisitionEngine::new(
        Arc::new(CpalDevices::new(config.recording.sample_rate)),
        host.clone(),
        overlay.clone(),
        config.recording.sample_rate,
    );
    let encoders = Arc::new(WavEncoderFactory::new(Duration::from_millis(
        config.recording.timeslice_ms,
    )));
    let pipeline = Arc::new(PersistPipeline::from_config(&config.storage));

    let status = RecordingStatusHandle::default();
    let session = RecordingSession::new(
        engine,
        encoders,
        pipeline,
        host.clone(),
        overlay.clone(),
        status.clone(),
        SessionOptions {
            mime_preferences: config.recording.mime_preferences.clone(),
            elapsed_tick: Duration::from_millis(config.recording.elapsed_tick_ms),
        },
    );

    let (tx, rx) = mpsc::channel::<RecordingCommand>(10);
    let recorder = tokio::spawn(session.run(rx));

    let api_server = ApiServer::new(
        config.api.port,
        RecordingState { tx, status },
        MeetingRoutes {
            host: host.clone(),
            overlay: overlay.clone(),
        },
        OverlayRoutes {
            overlay,
            window,
            host,
        },
    );
    let mut server = tokio::spawn(async move {
        if let Err(e) = api_server.start().await {
            error!("API server failed: {}", e);
        }
    });

    info!("Actura is ready!");
    info!(
        "Toggle recording: curl -X POST http://127.0.0.1:{}/toggle",
        config.api.port
    );

    let server_exited = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            false
        }
        _ = &mut server => true,
    };
    info!("Shutting down");

    // Dropping the server drops the last command sender, which lets the
    // session finish an active recording and flush uploads.
    if !server_exited {
        server.abort();
        if let Err(e) = server.await {
            if !e.is_cancelled() {
                warn!("API server task failed: {}", e);
            }
        }
    }
    if let Err(e) = recorder.await {
        error!("Recording session task failed: {}", e);
    }

    drop(watcher);
    geometry.abort();
    Ok(())
}
