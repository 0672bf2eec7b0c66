//! Recording control endpoints.
//!
//! Provides HTTP endpoints for:
//! - Toggling, starting and stopping a recording (POST /toggle, /start, /stop)
//! - Getting recording status (GET /status)

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::api::error::{ApiError, ApiResult};
use crate::recording::{RecordingCommand, RecordingStatus, RecordingStatusHandle, SessionPhase};

#[derive(Clone)]
pub struct RecordingState {
    pub tx: mpsc::Sender<RecordingCommand>,
    pub status: RecordingStatusHandle,
}

/// Creates the recording router with all recording-related endpoints.
pub fn router(state: RecordingState) -> Router {
    Router::new()
        .route("/toggle", post(toggle_recording))
        .route("/start", post(start_recording))
        .route("/stop", post(stop_recording))
        .route("/status", get(recording_status))
        .with_state(state)
}

async fn toggle_recording(State(state): State<RecordingState>) -> ApiResult<Json<Value>> {
    send_command(&state, RecordingCommand::Toggle).await
}

async fn start_recording(State(state): State<RecordingState>) -> ApiResult<Json<Value>> {
    send_command(&state, RecordingCommand::Start).await
}

async fn stop_recording(State(state): State<RecordingState>) -> ApiResult<Json<Value>> {
    send_command(&state, RecordingCommand::Stop).await
}

async fn send_command(state: &RecordingState, command: RecordingCommand) -> ApiResult<Json<Value>> {
    info!("{:?} command received via API", command);

    state.tx.send(command).await.map_err(|e| {
        error!("Failed to send {:?} command: {}", command, e);
        ApiError::internal("Recording session is not running")
    })?;

    // Give the session a moment to pick the command up.
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    let status = state.status.get().await;
    Ok(Json(json!({
        "success": true,
        "phase": status.phase.as_str(),
        "message": format!("Recording {}", status.phase.as_str()),
        "last_error": status.last_error,
    })))
}

/// Current phase, timer and the most recent artifact.
async fn recording_status(State(state): State<RecordingState>) -> Json<Value> {
    let status = state.status.get().await;
    Json(status_json(&status))
}

fn status_json(status: &RecordingStatus) -> Value {
    json!({
        "recording": status.phase == SessionPhase::Recording,
        "phase": status.phase.as_str(),
        "elapsed_ms": status.elapsed_ms,
        "timer": status.timer_text(),
        "last_error": status.last_error,
        "last_artifact": status.last_artifact,
        "last_saved": status.last_saved,
    })
}
