//! Per-message processing: status updates around one pipeline run.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use vod_firestore::{FirestoreClient, PublishedOutput, VideoRepository, VideoStore};
use vod_media::{FfmpegBackend, MediaBackend};
use vod_queue::ProcessVideoJob;
use vod_storage::{BlobClient, BlobStore};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::pipeline;

/// Shared clients for job processing.
///
/// Store, blob and media backends are injected so the processor is testable
/// without live services or a real encoder.
pub struct ProcessingContext {
    pub config: WorkerConfig,
    pub store: Arc<dyn VideoStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub backend: Arc<dyn MediaBackend>,
}

impl ProcessingContext {
    /// Create a context wired to the production clients.
    pub fn new(config: WorkerConfig) -> WorkerResult<Self> {
        let firestore = FirestoreClient::from_env()?;
        let store = Arc::new(VideoRepository::new(firestore));
        let blobs = Arc::new(BlobClient::from_env()?);
        let backend =
            Arc::new(FfmpegBackend::new().with_timeout(config.ffmpeg_timeout.as_secs()));

        Ok(Self::with_clients(config, store, blobs, backend))
    }

    /// Create a context from explicit clients.
    pub fn with_clients(
        config: WorkerConfig,
        store: Arc<dyn VideoStore>,
        blobs: Arc<dyn BlobStore>,
        backend: Arc<dyn MediaBackend>,
    ) -> Self {
        Self {
            config,
            store,
            blobs,
            backend,
        }
    }
}

/// Process one queue message end to end.
///
/// On failure the record is marked failed with the error message BEFORE the
/// error propagates back to the executor; a pipeline failure never
/// disappears silently.
pub async fn process_message(ctx: &ProcessingContext, job: &ProcessVideoJob) -> WorkerResult<()> {
    let video_id = &job.video_id;
    let input_path = Path::new(&job.video_path);
    info!(video_id = %video_id, input = %job.video_path, "Processing video");

    // Status is advisory; a failed update must not block the job.
    if let Err(e) = ctx.store.set_processing(video_id).await {
        warn!(
            "Failed to mark video {} as processing, continuing: {}",
            video_id, e
        );
    }

    match run_job(ctx, job).await {
        Ok(()) => {
            info!(video_id = %video_id, "Video published");
            Ok(())
        }
        Err(e) => {
            error!(video_id = %video_id, "Video processing failed: {}", e);

            if let Err(store_err) = ctx.store.fail(video_id, &e.to_string()).await {
                error!(
                    "Failed to persist failure state for video {}: {}",
                    video_id, store_err
                );
            }

            // The pipeline's own cleanup normally removes the input; this
            // covers failures before the pipeline took ownership of it.
            remove_if_exists(input_path);

            Err(e)
        }
    }
}

async fn run_job(ctx: &ProcessingContext, job: &ProcessVideoJob) -> WorkerResult<()> {
    let input_path = Path::new(&job.video_path);
    let result = pipeline::process_video(ctx, input_path, &job.video_id).await?;

    let output = PublishedOutput {
        master_playlist_url: result.master_playlist_url,
        thumbnail_url: result.thumbnail_url,
        duration_seconds: result.duration_seconds,
        variants: result.variant_labels,
    };
    ctx.store.publish(&job.video_id, &output).await?;
    Ok(())
}

/// Delete a file if it is still there; deleting a missing file is a no-op.
fn remove_if_exists(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove input file {}: {}", path.display(), e);
        }
    }
}
