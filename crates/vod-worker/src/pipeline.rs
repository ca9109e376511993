//! The per-job processing pipeline.
//!
//! Transcode, thumbnail and duration probe run as parallel tasks against
//! the same input; the master manifest and a single upload pass follow.
//! The local work tree and the input file are removed on every exit path.

use std::collections::HashMap;
use std::path::Path;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use vod_media::manifest::write_master_manifest;
use vod_models::encoding::{MASTER_PLAYLIST, THUMBNAIL_NAME};
use vod_models::VideoId;
use vod_storage::upload_tree;

use crate::error::PipelineError;
use crate::processor::ProcessingContext;

/// Everything one successful pipeline run produced. Transient; the worker
/// projects it into the metadata record.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub video_id: VideoId,
    pub duration_seconds: f64,
    pub variant_labels: Vec<String>,
    pub master_playlist_url: String,
    pub thumbnail_url: String,
    pub uploaded_files: HashMap<String, String>,
}

/// Run the full pipeline for one input file.
///
/// Fails fast with the first failing stage's error; no partial results are
/// returned. Whatever happens, the work directory and the input file are
/// gone when this returns.
pub async fn process_video(
    ctx: &ProcessingContext,
    input_path: &Path,
    video_id: &VideoId,
) -> Result<PipelineResult, PipelineError> {
    let work_dir = ctx.config.work_dir.join(video_id.as_str());
    tokio::fs::create_dir_all(&work_dir).await?;

    // Scratch space and the original upload must not outlive the job,
    // success or failure. The guard runs even if a stage panics.
    let _cleanup = scopeguard::guard(
        (work_dir.clone(), input_path.to_path_buf()),
        |(work_dir, input)| cleanup_local(&work_dir, &input),
    );

    run_stages(ctx, input_path, video_id, &work_dir).await
}

async fn run_stages(
    ctx: &ProcessingContext,
    input_path: &Path,
    video_id: &VideoId,
    work_dir: &Path,
) -> Result<PipelineResult, PipelineError> {
    // Stage 1: transcode, thumbnail and probe are read-only on the input
    // and independent, so they run as parallel tasks.
    let backend = ctx.backend.clone();
    let input = input_path.to_path_buf();
    let dir = work_dir.to_path_buf();
    let transcode_task = tokio::spawn(async move {
        backend
            .transcode(&input, &dir)
            .await
            .map_err(PipelineError::Transcode)
    });

    let backend = ctx.backend.clone();
    let input = input_path.to_path_buf();
    let thumb_path = work_dir.join(THUMBNAIL_NAME);
    let thumbnail_task = tokio::spawn(async move {
        backend
            .extract_thumbnail(&input, &thumb_path)
            .await
            .map_err(PipelineError::Thumbnail)
    });

    let backend = ctx.backend.clone();
    let input = input_path.to_path_buf();
    let probe_task = tokio::spawn(async move {
        backend
            .probe_duration(&input)
            .await
            .map_err(PipelineError::Probe)
    });

    let aborts = [
        transcode_task.abort_handle(),
        thumbnail_task.abort_handle(),
        probe_task.abort_handle(),
    ];

    let staged = tokio::try_join!(
        flatten(transcode_task),
        flatten(thumbnail_task),
        flatten(probe_task),
    );

    let (variant_labels, _, duration_seconds) = match staged {
        Ok(outputs) => outputs,
        Err(e) => {
            // Fail fast: stop whichever siblings are still encoding
            for handle in &aborts {
                handle.abort();
            }
            return Err(e);
        }
    };

    // Stage 2: master manifest, in exactly the produced order
    let (_, master_local) = write_master_manifest(work_dir, &variant_labels)
        .await
        .map_err(PipelineError::Manifest)?;

    // Stage 3: one upload pass moves segments, playlists, manifest and
    // thumbnail together
    let uploaded_files = upload_tree(ctx.blobs.as_ref(), work_dir, video_id.as_str()).await?;

    // Stage 4: resolve final URLs, local paths only as a defensive fallback
    let master_key = format!("{}/{}", video_id, MASTER_PLAYLIST);
    let thumb_key = format!("{}/{}", video_id, THUMBNAIL_NAME);
    let master_playlist_url = uploaded_files
        .get(&master_key)
        .cloned()
        .unwrap_or_else(|| master_local.to_string_lossy().into_owned());
    let thumbnail_url = uploaded_files.get(&thumb_key).cloned().unwrap_or_else(|| {
        work_dir.join(THUMBNAIL_NAME).to_string_lossy().into_owned()
    });

    info!(
        video_id = %video_id,
        variants = variant_labels.len(),
        files = uploaded_files.len(),
        "Pipeline complete"
    );

    Ok(PipelineResult {
        video_id: video_id.clone(),
        duration_seconds,
        variant_labels,
        master_playlist_url,
        thumbnail_url,
        uploaded_files,
    })
}

async fn flatten<T>(handle: JoinHandle<Result<T, PipelineError>>) -> Result<T, PipelineError> {
    match handle.await {
        Ok(result) => result,
        Err(e) => Err(PipelineError::Task(e.to_string())),
    }
}

/// Remove the work tree and the input file. Missing paths are fine.
fn cleanup_local(work_dir: &Path, input: &Path) {
    if let Err(e) = std::fs::remove_dir_all(work_dir) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove work dir {}: {}", work_dir.display(), e);
        }
    }
    if let Err(e) = std::fs::remove_file(input) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove input file {}: {}", input.display(), e);
        }
    }
}
