//! The external-tool boundary.

use std::path::Path;

use async_trait::async_trait;

use crate::error::MediaResult;
use crate::probe;
use crate::thumbnail;
use crate::transcode;

/// Everything the pipeline asks of the external media tools.
///
/// Abstracted so tests can substitute a backend that fabricates outputs
/// without spawning real encoder processes.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Transcode `input` into `work_dir/<label>/` for every ladder rung,
    /// returning the labels produced in ladder order.
    async fn transcode(&self, input: &Path, work_dir: &Path) -> MediaResult<Vec<String>>;

    /// Extract the single fixed-offset JPEG frame to `output`.
    async fn extract_thumbnail(&self, input: &Path, output: &Path) -> MediaResult<()>;

    /// Probe the media duration in seconds.
    async fn probe_duration(&self, input: &Path) -> MediaResult<f64>;
}

/// Production backend shelling out to FFmpeg/FFprobe.
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    timeout_secs: Option<u64>,
}

impl FfmpegBackend {
    /// Create a new backend with no timeout.
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Kill encoder processes that run longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn transcode(&self, input: &Path, work_dir: &Path) -> MediaResult<Vec<String>> {
        transcode::transcode_ladder(input, work_dir, self.timeout_secs).await
    }

    async fn extract_thumbnail(&self, input: &Path, output: &Path) -> MediaResult<()> {
        thumbnail::extract_thumbnail(input, output).await
    }

    async fn probe_duration(&self, input: &Path) -> MediaResult<f64> {
        probe::probe_duration(input).await
    }
}
