use actura::{
    app,
    cli::{
        handle_home_command, handle_meeting_command, handle_recording_command,
        handle_status_command, Cli, CliCommand,
    },
};
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("Actura {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(CliCommand::Status) => return handle_status_command().await,
        Some(CliCommand::Toggle) => return handle_recording_command("/toggle").await,
        Some(CliCommand::Start) => return handle_recording_command("/start").await,
        Some(CliCommand::Stop) => return handle_recording_command("/stop").await,
        Some(CliCommand::Meeting(args)) => return handle_meeting_command(args).await,
        Some(CliCommand::Home) => return handle_home_command().await,
        None => {}
    }

    app::run_service().await
}
