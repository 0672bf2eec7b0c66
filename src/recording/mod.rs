pub mod session;
pub mod status;
pub mod ticker;

pub use session::{RecordingCommand, RecordingSession, SessionOptions};
pub use status::{format_elapsed, RecordingStatus, RecordingStatusHandle, SessionPhase};
pub use ticker::ElapsedTicker;
