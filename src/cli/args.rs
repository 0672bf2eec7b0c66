use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "actura")]
#[command(about = "Meeting overlay and recorder for Actura", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// Show the recording status of the running service
    Status,
    /// Start or stop recording
    Toggle,
    /// Start recording
    Start,
    /// Stop recording
    Stop,
    /// Inspect or change the meeting state
    Meeting(MeetingCliArgs),
    /// Open the companion app
    Home,
}

#[derive(ClapArgs, Debug)]
pub struct MeetingCliArgs {
    /// What to do with the meeting state (default: show it)
    #[arg(value_enum)]
    pub action: Option<MeetingAction>,
    /// Meeting title when entering a meeting
    #[arg(short, long)]
    pub title: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeetingAction {
    On,
    Off,
    Toggle,
}
