use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::persistence::ArtifactSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Acquiring,
    Recording,
    Finalizing,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Acquiring => "acquiring",
            SessionPhase::Recording => "recording",
            SessionPhase::Finalizing => "finalizing",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordingStatus {
    pub phase: SessionPhase,
    /// Display-only; the stored recording carries its own duration.
    pub elapsed_ms: u64,
    /// Set when the last start attempt failed.
    pub last_error: Option<String>,
    pub last_artifact: Option<ArtifactSummary>,
    pub last_saved: Option<String>,
}

impl RecordingStatus {
    pub fn timer_text(&self) -> String {
        let shown = if self.phase == SessionPhase::Recording {
            self.elapsed_ms
        } else {
            0
        };
        format_elapsed(shown)
    }
}

impl Default for RecordingStatus {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            elapsed_ms: 0,
            last_error: None,
            last_artifact: None,
            last_saved: None,
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingStatusHandle {
    inner: Arc<Mutex<RecordingStatus>>,
}

impl RecordingStatusHandle {
    pub async fn get(&self) -> RecordingStatus {
        self.inner.lock().await.clone()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.lock().await.phase
    }

    pub async fn set(&self, phase: SessionPhase, last_error: Option<String>) {
        let mut status = self.inner.lock().await;
        status.phase = phase;
        status.last_error = last_error;
    }

    pub async fn begin_recording(&self) {
        let mut status = self.inner.lock().await;
        status.phase = SessionPhase::Recording;
        status.elapsed_ms = 0;
        status.last_error = None;
    }

    pub async fn set_elapsed(&self, elapsed_ms: u64) {
        self.inner.lock().await.elapsed_ms = elapsed_ms;
    }

    pub async fn record_artifact(&self, artifact: ArtifactSummary) {
        self.inner.lock().await.last_artifact = Some(artifact);
    }

    pub async fn record_saved(&self, locator: String) {
        self.inner.lock().await.last_saved = Some(locator);
    }
}

/// `mm:ss`, minutes not wrapped at the hour.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let total_seconds = elapsed_ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(999), "00:00");
        assert_eq!(format_elapsed(61_500), "01:01");
        assert_eq!(format_elapsed(3_600_000), "60:00");
    }

    #[test]
    fn test_timer_text_is_zero_outside_recording() {
        let mut status = RecordingStatus {
            elapsed_ms: 75_000,
            ..RecordingStatus::default()
        };
        assert_eq!(status.timer_text(), "00:00");

        status.phase = SessionPhase::Recording;
        assert_eq!(status.timer_text(), "01:15");
    }

    #[tokio::test]
    async fn test_begin_recording_resets_elapsed_and_error() {
        let handle = RecordingStatusHandle::default();
        handle.set_elapsed(5_000).await;
        handle
            .set(SessionPhase::Idle, Some("microphone denied".to_string()))
            .await;

        handle.begin_recording().await;

        let status = handle.get().await;
        assert_eq!(status.phase, SessionPhase::Recording);
        assert_eq!(status.elapsed_ms, 0);
        assert!(status.last_error.is_none());
    }
}
