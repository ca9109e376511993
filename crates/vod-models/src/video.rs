//! Video record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a video job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Video lifecycle status. Drives client-side visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Record created, job not yet picked up by a worker
    #[default]
    Pending,
    /// A worker is transcoding the video
    Processing,
    /// Transcoding finished, asset set is live
    Published,
    /// Transcoding failed
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Processing => "processing",
            VideoStatus::Published => "published",
            VideoStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Published | VideoStatus::Failed)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VideoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VideoStatus::Pending),
            "processing" => Ok(VideoStatus::Processing),
            "published" => Ok(VideoStatus::Published),
            "failed" => Ok(VideoStatus::Failed),
            other => Err(format!("unknown video status: {}", other)),
        }
    }
}

/// Upload progress mirror of [`VideoStatus`], kept for display compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Processing => "processing",
            UploadStatus::Completed => "completed",
            UploadStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UploadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UploadStatus::Pending),
            "processing" => Ok(UploadStatus::Processing),
            "completed" => Ok(UploadStatus::Completed),
            "failed" => Ok(UploadStatus::Failed),
            other => Err(format!("unknown upload status: {}", other)),
        }
    }
}

/// Video record stored in the metadata store.
///
/// Output fields (`master_playlist_url`, `thumbnail_url`, `duration_seconds`,
/// `variants`) are only trustworthy once `status` is `Published`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Unique video ID
    pub video_id: VideoId,

    /// Owner user ID (opaque foreign reference)
    pub owner_id: String,

    /// Video title
    pub title: String,

    /// Video description
    pub description: String,

    /// Lifecycle status
    #[serde(default)]
    pub status: VideoStatus,

    /// Upload status mirror
    #[serde(default)]
    pub upload_status: UploadStatus,

    /// Error message (set only on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Public URL of the master playlist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_playlist_url: Option<String>,

    /// Public URL of the thumbnail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Media duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,

    /// Resolution labels actually produced, in manifest order
    #[serde(default)]
    pub variants: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Create a new pending record, as written before enqueueing the job.
    pub fn new_pending(
        video_id: VideoId,
        owner_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            video_id,
            owner_id: owner_id.into(),
            title: title.into(),
            description: description.into(),
            status: VideoStatus::Pending,
            upload_status: UploadStatus::Pending,
            error_message: None,
            master_playlist_url: None,
            thumbnail_url: None,
            duration_seconds: None,
            variants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as published with the full output set.
    pub fn mark_published(
        &mut self,
        master_playlist_url: impl Into<String>,
        thumbnail_url: impl Into<String>,
        duration_seconds: f64,
        variants: Vec<String>,
    ) {
        self.status = VideoStatus::Published;
        self.upload_status = UploadStatus::Completed;
        self.master_playlist_url = Some(master_playlist_url.into());
        self.thumbnail_url = Some(thumbnail_url.into());
        self.duration_seconds = Some(duration_seconds);
        self.variants = variants;
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    /// Mark as failed with an error message.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = VideoStatus::Failed;
        self.upload_status = UploadStatus::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
    }
}
