//! Redis Streams job queue.
//!
//! This crate provides:
//! - Durable enqueueing of video-processing jobs (one fixed stream)
//! - Consumer-group consumption with ack, dead-letter and crash reclaim
//! - The [`JobQueue`] trait the submission service enqueues through

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::ProcessVideoJob;
pub use queue::{JobQueue, QueueConfig, VideoQueue};
