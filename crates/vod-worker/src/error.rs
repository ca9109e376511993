//! Worker error types.

use thiserror::Error;

use vod_firestore::FirestoreError;
use vod_media::MediaError;
use vod_queue::QueueError;
use vod_storage::StorageError;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// A pipeline failure, wrapping the first failing stage's error without
/// changing its kind.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("transcode failed: {0}")]
    Transcode(#[source] MediaError),

    #[error("thumbnail extraction failed: {0}")]
    Thumbnail(#[source] MediaError),

    #[error("duration probe failed: {0}")]
    Probe(#[source] MediaError),

    #[error("manifest build failed: {0}")]
    Manifest(#[source] MediaError),

    #[error("artifact upload failed: {0}")]
    Upload(#[from] StorageError),

    #[error("pipeline task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Metadata store error: {0}")]
    Firestore(#[from] FirestoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }
}
