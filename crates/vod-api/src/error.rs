//! Service error types.

use thiserror::Error;

use vod_firestore::FirestoreError;
use vod_queue::QueueError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Submission failed: {0}")]
    SubmissionFailed(#[source] QueueError),

    #[error("Metadata store error: {0}")]
    Store(#[from] FirestoreError),
}
