pub mod args;
pub mod client;

pub use args::{Cli, CliCommand, MeetingAction, MeetingCliArgs};
pub use client::{
    handle_home_command, handle_meeting_command, handle_recording_command, handle_status_command,
};
