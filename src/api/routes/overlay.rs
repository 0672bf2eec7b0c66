//! Overlay window endpoints used by the shell that renders the overlay.
//!
//! Provides HTTP endpoints for:
//! - Reporting a content-size change (POST /overlay/content)
//! - Reporting a user drag (POST /overlay/position)
//! - Reading the window model (GET /overlay)
//! - Opening the companion app home page (POST /home)

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::host::{HostBridge, LocalHost};
use crate::overlay::{ContentBox, LogicalPosition, ManagedWindow, OverlayHandle};

#[derive(Clone)]
pub struct OverlayRoutes {
    pub overlay: OverlayHandle,
    pub window: ManagedWindow,
    pub host: Arc<LocalHost>,
}

#[derive(Debug, Deserialize)]
pub struct ContentSize {
    pub width: f64,
    pub height: f64,
}

pub fn router(state: OverlayRoutes) -> Router {
    Router::new()
        .route("/overlay", get(get_overlay))
        .route("/overlay/content", post(content_resized))
        .route("/overlay/position", post(moved))
        .route("/home", post(open_home))
        .with_state(state)
}

async fn get_overlay(State(state): State<OverlayRoutes>) -> Json<Value> {
    Json(overlay_json(&state))
}

async fn content_resized(
    State(state): State<OverlayRoutes>,
    Json(size): Json<ContentSize>,
) -> ApiResult<Json<Value>> {
    let valid = |v: f64| v.is_finite() && v >= 0.0;
    if !(valid(size.width) && valid(size.height)) {
        return Err(ApiError::bad_request(format!(
            "Invalid content size {}x{}",
            size.width, size.height
        )));
    }

    debug!("Overlay content measured at {}x{}", size.width, size.height);
    state
        .overlay
        .content_resized(ContentBox::new(size.width, size.height));
    Ok(Json(json!({ "success": true })))
}

async fn moved(
    State(state): State<OverlayRoutes>,
    Json(position): Json<LogicalPosition>,
) -> Json<Value> {
    state.window.moved_to(position);
    Json(overlay_json(&state))
}

async fn open_home(State(state): State<OverlayRoutes>) -> ApiResult<Json<Value>> {
    state.host.open_home().await?;
    Ok(Json(json!({ "success": true })))
}

fn overlay_json(state: &OverlayRoutes) -> Value {
    json!({
        "window": state.window.snapshot(),
        "auto_resize": state.overlay.auto_resize(),
        "content": state.overlay.content(),
        "geometry": state.overlay.applied_geometry(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayConfig;

    fn routes() -> OverlayRoutes {
        let config = OverlayConfig::default();
        let window = ManagedWindow::from_config(&config);
        OverlayRoutes {
            overlay: OverlayHandle::new(Arc::new(window.clone())),
            host: Arc::new(LocalHost::new(Arc::new(window.clone()), &config)),
            window,
        }
    }

    #[tokio::test]
    async fn test_content_size_is_forwarded() {
        let state = routes();
        content_resized(
            State(state.clone()),
            Json(ContentSize {
                width: 259.5,
                height: 64.0,
            }),
        )
        .await
        .unwrap();

        assert_eq!(state.overlay.content(), Some(ContentBox::new(259.5, 64.0)));
    }

    #[tokio::test]
    async fn test_invalid_content_size_is_rejected() {
        let err = content_resized(
            State(routes()),
            Json(ContentSize {
                width: f64::NAN,
                height: 64.0,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_drag_updates_window_model() {
        let state = routes();
        let Json(body) = moved(State(state), Json(LogicalPosition::new(300, 200))).await;
        assert_eq!(body["window"]["position"]["x"], 300);
        assert_eq!(body["auto_resize"], true);
    }
}
