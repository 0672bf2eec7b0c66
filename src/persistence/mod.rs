//! Finalized recordings and where they go: a local copy plus remote object
//! storage.

pub mod artifact;
pub mod pipeline;
pub mod storage;

pub use artifact::{Artifact, ArtifactSummary};
pub use pipeline::{PersistError, PersistPipeline, UploadResult};
pub use storage::{ObjectStorage, StorageError, SupabaseStorage};
