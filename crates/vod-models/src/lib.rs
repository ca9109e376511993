//! Shared data models for the VodForge backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video records and their processing lifecycle
//! - The fixed HLS bitrate ladder and encoding constants

pub mod encoding;
pub mod video;

// Re-export common types
pub use encoding::{LadderRung, BITRATE_LADDER};
pub use video::{UploadStatus, VideoId, VideoRecord, VideoStatus};
