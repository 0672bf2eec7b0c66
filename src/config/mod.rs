use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

const SUPABASE_URL_ENV: &str = "ACTURA_SUPABASE_URL";
const SUPABASE_KEY_ENV: &str = "ACTURA_SUPABASE_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub overlay: OverlayConfig,
    pub recording: RecordingConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
}

/// Sizes and placement of the floating overlay window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Logical size restored after device prompts and recordings.
    pub compact_width: f64,
    pub compact_height: f64,
    /// Logical size used while OS permission dialogs may be shown.
    pub expanded_width: f64,
    pub expanded_height: f64,
    pub initial_x: i32,
    pub initial_y: i32,
    /// Physical size of the monitor hosting the overlay. Leave unset when
    /// the monitor cannot be queried; clamping is then skipped.
    pub monitor_width: Option<u32>,
    pub monitor_height: Option<u32>,
    pub scale_factor: f64,
    pub home_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Sample rate of the mixed stream handed to the encoder.
    pub sample_rate: u32,
    /// How often the encoder pulls from the mixed stream.
    pub timeslice_ms: u64,
    /// Refresh interval of the elapsed-time display.
    pub elapsed_tick_ms: u64,
    /// Ordered container/codec preferences, first supported wins.
    pub mime_preferences: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub bucket: String,
    pub folder: String,
    pub keep_local_copy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub port: u16,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            compact_width: 170.0,
            compact_height: 50.0,
            expanded_width: 900.0,
            expanded_height: 600.0,
            initial_x: 40,
            initial_y: 40,
            monitor_width: Some(1920),
            monitor_height: Some(1080),
            scale_factor: 1.0,
            home_url: "https://actura.app".to_string(),
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            timeslice_ms: 1_000,
            elapsed_tick_ms: 500,
            mime_preferences: crate::audio::PREFERRED_MIME_TYPES
                .iter()
                .map(|mime| mime.to_string())
                .collect(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_key: None,
            bucket: "recordings".to_string(),
            folder: "audio".to_string(),
            keep_local_copy: true,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 3838 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            config
        } else {
            let content =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            let config: Self = toml::from_str(&content).context("Failed to parse config file")?;
            info!("Loaded config from {:?}", config_path);
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Storage credentials may come from the environment so they stay out of
    /// the config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(SUPABASE_URL_ENV) {
            debug!("Using storage URL from {}", SUPABASE_URL_ENV);
            self.storage.supabase_url = Some(url);
        }
        if let Ok(key) = std::env::var(SUPABASE_KEY_ENV) {
            debug!("Using storage key from {}", SUPABASE_KEY_ENV);
            self.storage.supabase_key = Some(key);
        }
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_overlay_sizes() {
        let config = Config::default();
        assert_eq!(config.overlay.compact_width, 170.0);
        assert_eq!(config.overlay.compact_height, 50.0);
        assert_eq!(config.overlay.expanded_width, 900.0);
        assert_eq!(config.overlay.expanded_height, 600.0);
        assert_eq!(config.recording.elapsed_tick_ms, 500);
        assert_eq!(config.storage.bucket, "recordings");
        assert_eq!(config.storage.folder, "audio");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            bucket = "meetings"

            [api]
            port = 4000
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.bucket, "meetings");
        assert_eq!(config.storage.folder, "audio");
        assert!(config.storage.keep_local_copy);
        assert_eq!(config.api.port, 4000);
        assert_eq!(config.recording.mime_preferences.len(), 4);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.overlay.monitor_width, Some(1920));
        assert_eq!(parsed.recording.mime_preferences[0], "audio/webm;codecs=opus");
    }
}
