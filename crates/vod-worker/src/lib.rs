//! Video transcoding worker.
//!
//! This crate provides:
//! - The pipeline orchestrator ([`pipeline::process_video`])
//! - The per-message processor driving status updates
//! - The executor loop consuming the durable queue
//! - Graceful shutdown

pub mod config;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod processor;

pub use config::WorkerConfig;
pub use error::{PipelineError, WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use pipeline::PipelineResult;
pub use processor::ProcessingContext;
