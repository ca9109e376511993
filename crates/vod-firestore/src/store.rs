//! The metadata-store boundary the worker and submission service depend on.

use async_trait::async_trait;

use vod_models::{VideoId, VideoRecord};

use crate::error::FirestoreResult;

/// Output fields written in one update when a job publishes.
#[derive(Debug, Clone)]
pub struct PublishedOutput {
    pub master_playlist_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: f64,
    pub variants: Vec<String>,
}

/// Create/read/update/delete access to video records, keyed by ID.
///
/// Injected into the worker and the submission service so tests can swap in
/// an in-memory implementation.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Create a new record. Fails if the ID already exists.
    async fn create(&self, record: &VideoRecord) -> FirestoreResult<()>;

    /// Fetch a record by ID; `None` when unknown.
    async fn get(&self, id: &VideoId) -> FirestoreResult<Option<VideoRecord>>;

    /// Advance the record to `processing`.
    async fn set_processing(&self, id: &VideoId) -> FirestoreResult<()>;

    /// Write the terminal `published` state and all output fields in one
    /// atomic update.
    async fn publish(&self, id: &VideoId, output: &PublishedOutput) -> FirestoreResult<()>;

    /// Write the terminal `failed` state with its error message.
    async fn fail(&self, id: &VideoId, error_message: &str) -> FirestoreResult<()>;

    /// Delete a record. Deleting a missing record is a no-op.
    async fn delete(&self, id: &VideoId) -> FirestoreResult<()>;
}
