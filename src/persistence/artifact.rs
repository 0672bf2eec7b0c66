use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::audio::encoder::extension_for_mime;

/// One finalized recording. Immutable once built.
#[derive(Debug, Clone)]
pub struct Artifact {
    name: String,
    bytes: Vec<u8>,
    mime_type: String,
}

impl Artifact {
    /// Concatenate the encoder's chunks and name the result
    /// `<uuid>_<timestamp_ms>.<ext>`.
    pub fn from_chunks(chunks: Vec<Vec<u8>>, mime_type: &str, captured_at: DateTime<Utc>) -> Self {
        Self {
            name: artifact_name(mime_type, captured_at),
            bytes: chunks.concat(),
            mime_type: mime_type.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.bytes.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSummary {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: usize,
}

pub fn artifact_name(mime_type: &str, captured_at: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        Uuid::new_v4(),
        captured_at.timestamp_millis(),
        extension_for_mime(mime_type)
    )
}
