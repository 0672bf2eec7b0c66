//! Meeting state snapshot published by the host.

use serde::{Deserialize, Serialize};

/// Whether the user is in a meeting. Replaced wholesale on every update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingState {
    pub in_meeting: bool,
    #[serde(default)]
    pub meeting_title: Option<String>,
}

impl MeetingState {
    pub fn in_meeting(title: Option<String>) -> Self {
        Self {
            in_meeting: true,
            meeting_title: title,
        }
    }

    pub fn not_in_meeting() -> Self {
        Self::default()
    }
}
