//! Meeting-state endpoints.
//!
//! Provides HTTP endpoints for:
//! - Publishing a `meeting-state` event (POST /meeting-state)
//! - Reading the current meeting state (GET /meeting)
//! - Toggling the meeting flag by hand (POST /meeting/toggle)

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::host::LocalHost;
use crate::meeting::MeetingState;
use crate::overlay::OverlayHandle;

#[derive(Clone)]
pub struct MeetingRoutes {
    pub host: Arc<LocalHost>,
    pub overlay: OverlayHandle,
}

pub fn router(state: MeetingRoutes) -> Router {
    Router::new()
        .route("/meeting-state", post(publish_meeting_state))
        .route("/meeting", get(get_meeting))
        .route("/meeting/toggle", post(toggle_meeting))
        .with_state(state)
}

async fn publish_meeting_state(
    State(state): State<MeetingRoutes>,
    Json(meeting): Json<MeetingState>,
) -> Json<Value> {
    info!("meeting-state event received via API");
    state.host.publish(meeting.clone());
    Json(meeting_json(&meeting, &state.overlay))
}

async fn get_meeting(State(state): State<MeetingRoutes>) -> Json<Value> {
    Json(meeting_json(&state.host.meeting_state(), &state.overlay))
}

async fn toggle_meeting(State(state): State<MeetingRoutes>) -> Json<Value> {
    let meeting = state.host.toggle_meeting();
    Json(meeting_json(&meeting, &state.overlay))
}

/// Overlay visibility trails the event by the watcher's turn.
fn meeting_json(meeting: &MeetingState, overlay: &OverlayHandle) -> Value {
    json!({
        "in_meeting": meeting.in_meeting,
        "meeting_title": meeting.meeting_title,
        "overlay_visible": overlay.is_visible(),
    })
}
