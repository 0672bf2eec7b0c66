//! Local control API for the overlay service.
//!
//! Provides HTTP endpoints for:
//! - Recording control (toggle, start, stop, status)
//! - Meeting state (inbound `meeting-state` events, manual toggle)
//! - Overlay window model and content-size reports from the shell

pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::info;

pub use routes::meeting::MeetingRoutes;
pub use routes::overlay::OverlayRoutes;
pub use routes::recording::RecordingState;

pub struct ApiServer {
    port: u16,
    recording: RecordingState,
    meeting: MeetingRoutes,
    overlay: OverlayRoutes,
}

impl ApiServer {
    pub fn new(
        port: u16,
        recording: RecordingState,
        meeting: MeetingRoutes,
        overlay: OverlayRoutes,
    ) -> Self {
        Self {
            port,
            recording,
            meeting,
            overlay,
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            .route("/", get(status))
            .route("/version", get(version))
            .merge(routes::recording::router(self.recording))
            .merge(routes::meeting::router(self.meeting))
            .merge(routes::overlay::router(self.overlay))
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("API server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET  /                 - Service info");
        info!("  POST /toggle           - Toggle recording");
        info!("  POST /start            - Start recording");
        info!("  POST /stop             - Stop recording");
        info!("  GET  /status           - Recording status");
        info!("  POST /meeting-state    - Publish meeting state");
        info!("  GET  /meeting          - Current meeting state");
        info!("  POST /meeting/toggle   - Toggle meeting by hand");
        info!("  GET  /overlay          - Overlay window model");
        info!("  POST /overlay/content  - Report content size");
        info!("  POST /overlay/position - Report window drag");
        info!("  POST /home             - Open the companion app");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "actura",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "actura"
    }))
}
