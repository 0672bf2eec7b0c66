//! Remote object storage for recordings.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `path` inside `bucket`. Returns the stored object key.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key")]
    key: Option<String>,
}

/// Supabase Storage over its REST API.
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// None unless both the project URL and key are configured.
    pub fn from_config(config: &StorageConfig) -> Option<Self> {
        match (&config.supabase_url, &config.supabase_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                info!("Initialized Supabase storage at {}", url);
                Some(Self::new(url, key))
            }
            _ => None,
        }
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        debug!("Uploading {} bytes to {}/{}", bytes.len(), bucket, path);

        let response = self
            .client
            .post(self.object_url(bucket, path))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Supabase upload failed with status {}: {}", status, body);
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        let key = serde_json::from_str::<UploadResponse>(&body)
            .ok()
            .and_then(|response| response.key)
            .unwrap_or_else(|| format!("{bucket}/{path}"));
        Ok(key)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, path
        )
    }
}
