//! Open URLs with the desktop's default handler.

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info};
use which::which;

/// Openers tried in order; the first one installed wins.
const OPENERS: [&str; 3] = ["xdg-open", "open", "gio"];

pub async fn open_url(url: &str) -> Result<()> {
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        bail!("Refusing to open non-http URL: {url}");
    }

    let opener = OPENERS
        .iter()
        .find(|cmd| which(cmd).is_ok())
        .ok_or_else(|| anyhow!("No URL opener found (tried {})", OPENERS.join(", ")))?;

    debug!("Opening {} with {}", url, opener);

    let mut command = tokio::process::Command::new(opener);
    if *opener == "gio" {
        command.arg("open");
    }

    let status = command
        .arg(url)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .with_context(|| format!("Failed to run {opener}"))?;

    if !status.success() {
        bail!("{opener} exited with status {status}");
    }

    info!("Opened {}", url);
    Ok(())
}
