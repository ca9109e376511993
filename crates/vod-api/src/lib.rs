//! Submission and status service layer.
//!
//! The HTTP surface on top of these calls lives elsewhere; this crate owns
//! the core contract: create-then-enqueue on submit (with a compensating
//! delete when enqueueing fails) and the status projection that never leaks
//! output URLs for unpublished videos.

pub mod error;
pub mod service;

pub use error::{ApiError, ApiResult};
pub use service::{VideoService, VideoStatusResponse};
