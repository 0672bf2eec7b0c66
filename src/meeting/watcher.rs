//! Follows the host's meeting state and shows or hides the overlay.

use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::state::MeetingState;
use crate::host::HostBridge;
use crate::overlay::OverlayHandle;

/// Current meeting state plus the task applying every update to the overlay.
/// Dropping the watcher stops following events.
pub struct MeetingWatcher {
    current: watch::Receiver<MeetingState>,
    task: JoinHandle<()>,
}

impl MeetingWatcher {
    /// Bootstrap from one `get_meeting_state` query, then follow `events`.
    ///
    /// Subscribe to `events` before calling so nothing published during the
    /// bootstrap query is missed.
    pub async fn start(
        host: Arc<dyn HostBridge>,
        events: broadcast::Receiver<MeetingState>,
        overlay: OverlayHandle,
    ) -> Self {
        let initial = match host.get_meeting_state().await {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to get initial meeting state: {}", e);
                MeetingState::not_in_meeting()
            }
        };

        overlay.set_visible(initial.in_meeting).await;
        let (tx, current) = watch::channel(initial);
        let task = tokio::spawn(follow(events, tx, overlay));

        Self { current, task }
    }

    pub fn current_state(&self) -> MeetingState {
        self.current.borrow().clone()
    }

    /// Receives every state change after the current one.
    pub fn subscribe(&self) -> watch::Receiver<MeetingState> {
        self.current.clone()
    }
}

impl Drop for MeetingWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn follow(
    mut events: broadcast::Receiver<MeetingState>,
    current: watch::Sender<MeetingState>,
    overlay: OverlayHandle,
) {
    loop {
        match events.recv().await {
            Ok(state) => {
                let visible = state.in_meeting;
                current.send_replace(state);
                overlay.set_visible(visible).await;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Missed {} meeting-state events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Meeting-state event stream closed");
                break;
            }
        }
    }
}
