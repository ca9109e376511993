//! Video submission and status queries.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use vod_firestore::VideoStore;
use vod_models::{UploadStatus, VideoId, VideoRecord, VideoStatus};
use vod_queue::{JobQueue, ProcessVideoJob};

use crate::error::{ApiError, ApiResult};

/// Status projection returned to clients.
///
/// Output URLs are present only for published videos, and the error message
/// only for failed ones — unpublished output must never reach a client.
#[derive(Debug, Clone, Serialize)]
pub struct VideoStatusResponse {
    pub status: VideoStatus,
    pub upload_status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_playlist_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl VideoStatusResponse {
    fn from_record(record: &VideoRecord) -> Self {
        let published = record.status == VideoStatus::Published;
        let failed = record.status == VideoStatus::Failed;

        Self {
            status: record.status,
            upload_status: record.upload_status,
            error_message: failed.then(|| record.error_message.clone()).flatten(),
            master_playlist_url: published
                .then(|| record.master_playlist_url.clone())
                .flatten(),
            thumbnail_url: published.then(|| record.thumbnail_url.clone()).flatten(),
        }
    }
}

/// Submission and status service.
///
/// Store and queue clients are injected so the service is testable without
/// a live broker or metadata store.
pub struct VideoService {
    store: Arc<dyn VideoStore>,
    queue: Arc<dyn JobQueue>,
}

impl VideoService {
    /// Create a new service.
    pub fn new(store: Arc<dyn VideoStore>, queue: Arc<dyn JobQueue>) -> Self {
        Self { store, queue }
    }

    /// Accept an uploaded video: create the pending record, then enqueue
    /// the processing job. Returns immediately with the new video ID.
    ///
    /// If enqueueing fails the just-created record is deleted again, so no
    /// pending record that can never progress is left behind.
    pub async fn submit_video(
        &self,
        local_path: &Path,
        owner_id: &str,
        title: &str,
        description: &str,
    ) -> ApiResult<VideoId> {
        let video_id = VideoId::new();
        let record = VideoRecord::new_pending(video_id.clone(), owner_id, title, description);
        self.store.create(&record).await?;

        let job = ProcessVideoJob::new(
            local_path.to_string_lossy(),
            video_id.clone(),
            owner_id,
            title,
            description,
        );

        if let Err(enqueue_err) = self.queue.enqueue(&job).await {
            warn!(
                "Enqueue failed for video {}, removing pending record: {}",
                video_id, enqueue_err
            );
            if let Err(delete_err) = self.store.delete(&video_id).await {
                warn!(
                    "Failed to remove pending record {} after enqueue failure: {}",
                    video_id, delete_err
                );
            }
            return Err(ApiError::SubmissionFailed(enqueue_err));
        }

        info!("Submitted video {} for processing", video_id);
        Ok(video_id)
    }

    /// Read the status projection for a video.
    pub async fn get_video_status(&self, id: &VideoId) -> ApiResult<VideoStatusResponse> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;

        Ok(VideoStatusResponse::from_record(&record))
    }
}
