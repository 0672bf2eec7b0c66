//! Ships finalized artifacts: local copy first, then remote upload.
//!
//! Failures are reported to the caller, which logs them. Nothing here is
//! retried and nothing rolls back the session that produced the artifact.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::artifact::Artifact;
use super::storage::{ObjectStorage, StorageError, SupabaseStorage};
use crate::config::StorageConfig;
use crate::global;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("remote storage is not configured")]
    NotConfigured,
    #[error(transparent)]
    Upload(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub locator: String,
}

pub struct PersistPipeline {
    storage: Option<Arc<dyn ObjectStorage>>,
    bucket: String,
    folder: String,
    local_dir: Option<PathBuf>,
}

impl PersistPipeline {
    pub fn new(
        storage: Option<Arc<dyn ObjectStorage>>,
        config: &StorageConfig,
        local_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            storage,
            bucket: config.bucket.clone(),
            folder: config.folder.trim_matches('/').to_string(),
            local_dir,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        let storage = SupabaseStorage::from_config(config)
            .map(|storage| Arc::new(storage) as Arc<dyn ObjectStorage>);
        if storage.is_none() {
            warn!("Supabase storage not configured, recordings stay local only");
        }

        let local_dir = if config.keep_local_copy {
            match global::recordings_dir() {
                Ok(dir) => Some(dir),
                Err(e) => {
                    warn!("No local recordings directory: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self::new(storage, config, local_dir)
    }

    /// Object path of an artifact inside the bucket.
    pub fn object_path(&self, name: &str) -> String {
        if self.folder.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.folder, name)
        }
    }

    pub async fn persist(&self, artifact: Artifact) -> Result<UploadResult, PersistError> {
        if let Some(dir) = &self.local_dir {
            match write_local_copy(dir, &artifact).await {
                Ok(path) => info!("Saved local copy to {:?}", path),
                Err(e) => warn!("Failed to save local copy of {}: {}", artifact.name(), e),
            }
        }

        let storage = self.storage.as_ref().ok_or(PersistError::NotConfigured)?;

        let path = self.object_path(artifact.name());
        let content_type = artifact.mime_type().to_string();
        let size = artifact.len();

        let key = storage
            .upload(&self.bucket, &path, artifact.into_bytes(), &content_type)
            .await?;
        let locator = storage.public_url(&self.bucket, &path);

        info!("Uploaded {} ({} bytes) as {}", path, size, key);
        Ok(UploadResult { locator })
    }
}

async fn write_local_copy(dir: &Path, artifact: &Artifact) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(artifact.name());
    tokio::fs::write(&path, artifact.bytes()).await?;
    Ok(path)
}
