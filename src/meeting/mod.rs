//! Meeting detection signal and the watcher that drives overlay visibility.

pub mod state;
pub mod watcher;

pub use state::MeetingState;
pub use watcher::MeetingWatcher;
