//! Queue message payload.

use serde::{Deserialize, Serialize};

use vod_models::VideoId;

/// Job to transcode one uploaded video.
///
/// The wire format is fixed JSON: `{videoPath, videoId, userId, title,
/// description}`. Every field is required; malformed payloads are rejected
/// at deserialization instead of failing deep inside the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessVideoJob {
    /// Local path of the raw upload on the submitting host
    pub video_path: String,
    /// Video record ID (document key in the metadata store)
    pub video_id: VideoId,
    /// Owner user ID
    pub user_id: String,
    /// Video title
    pub title: String,
    /// Video description
    pub description: String,
}

impl ProcessVideoJob {
    /// Create a new job payload.
    pub fn new(
        video_path: impl Into<String>,
        video_id: VideoId,
        user_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            video_path: video_path.into(),
            video_id,
            user_id: user_id.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}
