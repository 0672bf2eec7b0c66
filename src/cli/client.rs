//! CLI handlers. Every command talks to the running service over its HTTP API.

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};

use crate::cli::args::{MeetingAction, MeetingCliArgs};
use crate::config::Config;

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    pub fn new(port: u16) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://127.0.0.1:{port}"),
        }
    }

    pub fn from_config() -> Result<Self> {
        let config = Config::load()?;
        Ok(Self::new(config.api.port))
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .context("Failed to connect to Actura service. Is it running?")?;
        Self::read(response).await
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value> {
        let mut request = self.client.post(format!("{}{}", self.base_url, path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .context("Failed to connect to Actura service. Is it running?")?;
        Self::read(response).await
    }

    async fn read(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let json: Value = response
            .json()
            .await
            .context("Failed to parse service response")?;

        if !status.is_success() {
            bail!(
                "Request failed ({}): {}",
                status,
                json.get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("Unknown error")
            );
        }
        Ok(json)
    }
}

pub async fn handle_status_command() -> Result<()> {
    let json = ServiceClient::from_config()?.get("/status").await?;

    let phase = json
        .get("phase")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let timer = json.get("timer").and_then(|v| v.as_str()).unwrap_or("00:00");

    println!("Recording: {} ({})", phase, timer);

    if let Some(error) = json.get("last_error").and_then(|v| v.as_str()) {
        println!("Last error: {}", error);
    }
    if let Some(name) = json.pointer("/last_artifact/name").and_then(|v| v.as_str()) {
        println!("Last recording: {}", name);
    }
    if let Some(saved) = json.get("last_saved").and_then(|v| v.as_str()) {
        println!("Saved at: {}", saved);
    }

    Ok(())
}

/// `path` is one of `/toggle`, `/start` or `/stop`.
pub async fn handle_recording_command(path: &str) -> Result<()> {
    let json = ServiceClient::from_config()?.post(path, None).await?;

    println!(
        "{}",
        json.get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Command sent")
    );
    if let Some(error) = json.get("last_error").and_then(|v| v.as_str()) {
        println!("Last error: {}", error);
    }

    Ok(())
}

pub async fn handle_meeting_command(args: MeetingCliArgs) -> Result<()> {
    let client = ServiceClient::from_config()?;

    let json = match args.action {
        None => client.get("/meeting").await?,
        Some(MeetingAction::Toggle) => client.post("/meeting/toggle", None).await?,
        Some(MeetingAction::On) => {
            let body = json!({ "in_meeting": true, "meeting_title": args.title });
            client.post("/meeting-state", Some(body)).await?
        }
        Some(MeetingAction::Off) => {
            let body = json!({ "in_meeting": false, "meeting_title": null });
            client.post("/meeting-state", Some(body)).await?
        }
    };

    print_meeting(&json);
    Ok(())
}

pub async fn handle_home_command() -> Result<()> {
    ServiceClient::from_config()?.post("/home", None).await?;
    println!("Opened Actura");
    Ok(())
}

fn print_meeting(json: &Value) {
    let in_meeting = json
        .get("in_meeting")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    if in_meeting {
        let title = json
            .get("meeting_title")
            .and_then(|v| v.as_str())
            .unwrap_or("Untitled");
        println!("In meeting: {}", title);
    } else {
        println!("Not in a meeting");
    }
}
