//! Commands the overlay core issues to its host, and the in-process host.
//!
//! The host owns the meeting state, publishes `meeting-state` events, and
//! answers `get_meeting_state`, `expand_overlay`, `restore_overlay` and
//! `open_home`.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::OverlayConfig;
use crate::meeting::MeetingState;
use crate::overlay::{LogicalSize, OverlayWindow};

pub mod opener;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("host command {command} failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },
}

#[async_trait]
pub trait HostBridge: Send + Sync {
    async fn get_meeting_state(&self) -> Result<MeetingState, HostError>;

    async fn expand_overlay(&self) -> Result<(), HostError>;

    async fn restore_overlay(&self) -> Result<(), HostError>;

    async fn open_home(&self) -> Result<(), HostError>;
}

const EVENT_CAPACITY: usize = 32;
const MANUAL_MEETING_TITLE: &str = "Manual Meeting";

/// Host running in the same process as the overlay core.
pub struct LocalHost {
    state: Mutex<MeetingState>,
    events: broadcast::Sender<MeetingState>,
    window: Arc<dyn OverlayWindow>,
    compact: LogicalSize,
    expanded: LogicalSize,
    home_url: String,
}

impl LocalHost {
    pub fn new(window: Arc<dyn OverlayWindow>, config: &OverlayConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(MeetingState::default()),
            events,
            window,
            compact: LogicalSize {
                width: config.compact_width,
                height: config.compact_height,
            },
            expanded: LogicalSize {
                width: config.expanded_width,
                height: config.expanded_height,
            },
            home_url: config.home_url.clone(),
        }
    }

    /// Receiver for `meeting-state` events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<MeetingState> {
        self.events.subscribe()
    }

    pub fn meeting_state(&self) -> MeetingState {
        self.lock().clone()
    }

    /// Replace the meeting state and emit a `meeting-state` event.
    pub fn publish(&self, state: MeetingState) {
        *self.lock() = state.clone();
        info!(
            "Meeting state: in_meeting={} title={:?}",
            state.in_meeting, state.meeting_title
        );
        if self.events.send(state).is_err() {
            debug!("No meeting-state subscribers");
        }
    }

    /// Flip the meeting flag by hand.
    pub fn toggle_meeting(&self) -> MeetingState {
        let next = {
            let current = self.lock();
            if current.in_meeting {
                MeetingState::not_in_meeting()
            } else {
                MeetingState::in_meeting(Some(MANUAL_MEETING_TITLE.to_string()))
            }
        };
        self.publish(next.clone());
        next
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MeetingState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl HostBridge for LocalHost {
    async fn get_meeting_state(&self) -> Result<MeetingState, HostError> {
        Ok(self.meeting_state())
    }

    async fn expand_overlay(&self) -> Result<(), HostError> {
        self.window
            .set_size(self.expanded)
            .await
            .map_err(|e| HostError::Command {
                command: "expand_overlay",
                message: e.to_string(),
            })
    }

    async fn restore_overlay(&self) -> Result<(), HostError> {
        self.window
            .set_size(self.compact)
            .await
            .map_err(|e| HostError::Command {
                command: "restore_overlay",
                message: e.to_string(),
            })
    }

    async fn open_home(&self) -> Result<(), HostError> {
        opener::open_url(&self.home_url)
            .await
            .map_err(|e| HostError::Command {
                command: "open_home",
                message: e.to_string(),
            })
    }
}
