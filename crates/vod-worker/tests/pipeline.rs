//! Pipeline and processor tests against in-memory fakes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use vod_firestore::{FirestoreError, FirestoreResult, PublishedOutput, VideoStore};
use vod_media::{MediaBackend, MediaError, MediaResult};
use vod_models::encoding::BITRATE_LADDER;
use vod_models::{UploadStatus, VideoId, VideoRecord, VideoStatus};
use vod_queue::ProcessVideoJob;
use vod_worker::processor::{process_message, ProcessingContext};
use vod_worker::{pipeline, PipelineError, WorkerConfig};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Which stage a fake backend should fail at.
#[derive(Clone, Copy, PartialEq)]
enum FailAt {
    Nowhere,
    Transcode,
    Thumbnail,
    Probe,
}

/// Backend that fabricates the HLS layout instead of encoding.
struct FakeBackend {
    fail_at: FailAt,
    labels: Vec<String>,
    duration: f64,
}

impl FakeBackend {
    fn ok() -> Self {
        Self {
            fail_at: FailAt::Nowhere,
            labels: BITRATE_LADDER.iter().map(|r| r.label.to_string()).collect(),
            duration: 10.0,
        }
    }

    fn failing_at(fail_at: FailAt) -> Self {
        Self {
            fail_at,
            ..Self::ok()
        }
    }

    fn with_labels(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            ..Self::ok()
        }
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    async fn transcode(&self, _input: &Path, work_dir: &Path) -> MediaResult<Vec<String>> {
        if self.fail_at == FailAt::Transcode {
            return Err(MediaError::ffmpeg_failed(
                "ffmpeg exited with non-zero status",
                Some("Invalid data found when processing input".into()),
                Some(1),
            ));
        }
        for label in &self.labels {
            let dir = work_dir.join(label);
            tokio::fs::create_dir_all(&dir).await?;
            tokio::fs::write(dir.join("index.m3u8"), b"#EXTM3U").await?;
            tokio::fs::write(dir.join("segment_000.ts"), b"segment").await?;
        }
        Ok(self.labels.clone())
    }

    async fn extract_thumbnail(&self, _input: &Path, output: &Path) -> MediaResult<()> {
        if self.fail_at == FailAt::Thumbnail {
            return Err(MediaError::ffmpeg_failed(
                "ffmpeg exited with non-zero status",
                Some("Output file is empty".into()),
                Some(1),
            ));
        }
        tokio::fs::write(output, b"jpeg").await?;
        Ok(())
    }

    async fn probe_duration(&self, _input: &Path) -> MediaResult<f64> {
        if self.fail_at == FailAt::Probe {
            return Err(MediaError::InvalidDuration("N/A".into()));
        }
        Ok(self.duration)
    }
}

/// Blob store capturing uploads, optionally failing every put.
struct MemoryBlobStore {
    uploads: Mutex<HashMap<String, Vec<u8>>>,
    fail: bool,
}

impl MemoryBlobStore {
    fn new() -> Self {
        Self {
            uploads: Mutex::new(HashMap::new()),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            uploads: Mutex::new(HashMap::new()),
            fail: true,
        }
    }

    fn content(&self, key: &str) -> Option<String> {
        self.uploads
            .lock()
            .unwrap()
            .get(key)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

#[async_trait]
impl vod_storage::BlobStore for MemoryBlobStore {
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        _content_type: &str,
    ) -> vod_storage::StorageResult<String> {
        if self.fail {
            return Err(vod_storage::StorageError::upload_failed(
                "simulated transport error",
            ));
        }
        let bytes = std::fs::read(path)?;
        self.uploads.lock().unwrap().insert(key.to_string(), bytes);
        Ok(format!("https://cdn.test/{}", key))
    }
}

/// In-memory metadata store.
#[derive(Default)]
struct MemoryStore {
    records: Mutex<HashMap<String, VideoRecord>>,
    fail_set_processing: bool,
}

impl MemoryStore {
    fn with_record(record: VideoRecord) -> Self {
        let store = Self::default();
        store
            .records
            .lock()
            .unwrap()
            .insert(record.video_id.to_string(), record);
        store
    }

    fn record(&self, id: &VideoId) -> Option<VideoRecord> {
        self.records.lock().unwrap().get(id.as_str()).cloned()
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn create(&self, record: &VideoRecord) -> FirestoreResult<()> {
        self.records
            .lock()
            .unwrap()
            .insert(record.video_id.to_string(), record.clone());
        Ok(())
    }

    async fn get(&self, id: &VideoId) -> FirestoreResult<Option<VideoRecord>> {
        Ok(self.record(id))
    }

    async fn set_processing(&self, id: &VideoId) -> FirestoreResult<()> {
        if self.fail_set_processing {
            return Err(FirestoreError::request_failed("simulated outage"));
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(id.as_str())
            .ok_or_else(|| FirestoreError::not_found(id.to_string()))?;
        record.status = VideoStatus::Processing;
        record.upload_status = UploadStatus::Processing;
        Ok(())
    }

    async fn publish(&self, id: &VideoId, output: &PublishedOutput) -> FirestoreResult<()> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(id.as_str())
            .ok_or_else(|| FirestoreError::not_found(id.to_string()))?;
        record.mark_published(
            output.master_playlist_url.clone(),
            output.thumbnail_url.clone(),
            output.duration_seconds,
            output.variants.clone(),
        );
        Ok(())
    }

    async fn fail(&self, id: &VideoId, error_message: &str) -> FirestoreResult<()> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(id.as_str())
            .ok_or_else(|| FirestoreError::not_found(id.to_string()))?;
        record.mark_failed(error_message);
        Ok(())
    }

    async fn delete(&self, id: &VideoId) -> FirestoreResult<()> {
        self.records.lock().unwrap().remove(id.as_str());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    ctx: ProcessingContext,
    store: Arc<MemoryStore>,
    blobs: Arc<MemoryBlobStore>,
    input_path: PathBuf,
    scratch: tempfile::TempDir,
    _input_dir: tempfile::TempDir,
}

impl Harness {
    fn new(backend: FakeBackend, blobs: MemoryBlobStore, store: MemoryStore) -> Self {
        let scratch = tempfile::tempdir().unwrap();
        let input_dir = tempfile::tempdir().unwrap();
        let input_path = input_dir.path().join("raw.mp4");
        std::fs::write(&input_path, b"not really a video").unwrap();

        let config = WorkerConfig {
            work_dir: scratch.path().to_path_buf(),
            ..WorkerConfig::default()
        };

        let store = Arc::new(store);
        let blobs = Arc::new(blobs);
        let ctx = ProcessingContext::with_clients(
            config,
            Arc::clone(&store) as Arc<dyn VideoStore>,
            Arc::clone(&blobs) as Arc<dyn vod_storage::BlobStore>,
            Arc::new(backend),
        );

        Self {
            ctx,
            store,
            blobs,
            input_path,
            scratch,
            _input_dir: input_dir,
        }
    }

    fn work_dir(&self, id: &VideoId) -> PathBuf {
        self.scratch.path().join(id.as_str())
    }

    fn assert_cleaned(&self, id: &VideoId) {
        assert!(
            !self.work_dir(id).exists(),
            "work dir should be removed after the pipeline"
        );
        assert!(
            !self.input_path.exists(),
            "input file should be removed after the pipeline"
        );
    }
}

// ---------------------------------------------------------------------------
// Pipeline tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pipeline_success_produces_full_asset_set() {
    let harness = Harness::new(FakeBackend::ok(), MemoryBlobStore::new(), MemoryStore::default());
    let id = VideoId::from("vid-ok");

    let result = pipeline::process_video(&harness.ctx, &harness.input_path, &id)
        .await
        .unwrap();

    assert_eq!(result.duration_seconds, 10.0);
    assert_eq!(
        result.variant_labels,
        vec!["360p", "480p", "720p", "1080p"]
    );
    assert_eq!(
        result.master_playlist_url,
        "https://cdn.test/vid-ok/master.m3u8"
    );
    assert_eq!(result.thumbnail_url, "https://cdn.test/vid-ok/thumb.jpg");

    // Every variant playlist and segment went up in the same pass
    assert!(result.uploaded_files.contains_key("vid-ok/360p/index.m3u8"));
    assert!(result.uploaded_files.contains_key("vid-ok/1080p/segment_000.ts"));
    assert!(result.uploaded_files.contains_key("vid-ok/thumb.jpg"));

    harness.assert_cleaned(&id);
}

#[tokio::test]
async fn pipeline_manifest_follows_produced_variant_order() {
    let harness = Harness::new(
        FakeBackend::with_labels(&["720p", "360p"]),
        MemoryBlobStore::new(),
        MemoryStore::default(),
    );
    let id = VideoId::from("vid-partial");

    let result = pipeline::process_video(&harness.ctx, &harness.input_path, &id)
        .await
        .unwrap();
    assert_eq!(result.variant_labels, vec!["720p", "360p"]);

    let manifest = harness.blobs.content("vid-partial/master.m3u8").unwrap();
    let uris: Vec<&str> = manifest
        .lines()
        .filter(|l| l.ends_with("index.m3u8"))
        .collect();
    assert_eq!(uris, vec!["720p/index.m3u8", "360p/index.m3u8"]);
    assert!(!manifest.contains("1080p"));
}

#[tokio::test]
async fn pipeline_cleans_up_after_transcode_failure() {
    let harness = Harness::new(
        FakeBackend::failing_at(FailAt::Transcode),
        MemoryBlobStore::new(),
        MemoryStore::default(),
    );
    let id = VideoId::from("vid-t");

    let err = pipeline::process_video(&harness.ctx, &harness.input_path, &id)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Transcode(_)));
    assert!(err.to_string().contains("transcode failed"));

    harness.assert_cleaned(&id);
}

#[tokio::test]
async fn pipeline_cleans_up_after_thumbnail_failure() {
    let harness = Harness::new(
        FakeBackend::failing_at(FailAt::Thumbnail),
        MemoryBlobStore::new(),
        MemoryStore::default(),
    );
    let id = VideoId::from("vid-th");

    let err = pipeline::process_video(&harness.ctx, &harness.input_path, &id)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Thumbnail(_)));

    harness.assert_cleaned(&id);
}

#[tokio::test]
async fn pipeline_cleans_up_after_probe_failure() {
    let harness = Harness::new(
        FakeBackend::failing_at(FailAt::Probe),
        MemoryBlobStore::new(),
        MemoryStore::default(),
    );
    let id = VideoId::from("vid-p");

    let err = pipeline::process_video(&harness.ctx, &harness.input_path, &id)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Probe(_)));

    harness.assert_cleaned(&id);
}

#[tokio::test]
async fn pipeline_cleans_up_after_manifest_failure() {
    // A label outside the ladder cannot be written into the master manifest
    let harness = Harness::new(
        FakeBackend::with_labels(&["999p"]),
        MemoryBlobStore::new(),
        MemoryStore::default(),
    );
    let id = VideoId::from("vid-m");

    let err = pipeline::process_video(&harness.ctx, &harness.input_path, &id)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Manifest(_)));

    harness.assert_cleaned(&id);
}

#[tokio::test]
async fn pipeline_cleans_up_after_upload_failure() {
    let harness = Harness::new(
        FakeBackend::ok(),
        MemoryBlobStore::failing(),
        MemoryStore::default(),
    );
    let id = VideoId::from("vid-u");

    let err = pipeline::process_video(&harness.ctx, &harness.input_path, &id)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Upload(_)));

    harness.assert_cleaned(&id);
}

// ---------------------------------------------------------------------------
// Processor tests
// ---------------------------------------------------------------------------

fn pending_record(id: &VideoId) -> VideoRecord {
    VideoRecord::new_pending(id.clone(), "user-1", "Title", "Desc")
}

fn job_for(harness: &Harness, id: &VideoId) -> ProcessVideoJob {
    ProcessVideoJob::new(
        harness.input_path.to_string_lossy(),
        id.clone(),
        "user-1",
        "Title",
        "Desc",
    )
}

#[tokio::test]
async fn process_message_publishes_on_success() {
    let id = VideoId::from("vid-pub");
    let harness = Harness::new(
        FakeBackend::ok(),
        MemoryBlobStore::new(),
        MemoryStore::with_record(pending_record(&id)),
    );

    process_message(&harness.ctx, &job_for(&harness, &id))
        .await
        .unwrap();

    let record = harness.store.record(&id).unwrap();
    assert_eq!(record.status, VideoStatus::Published);
    assert_eq!(record.upload_status, UploadStatus::Completed);
    assert_eq!(record.variants.len(), 4);
    assert_eq!(record.duration_seconds, Some(10.0));
    assert_eq!(
        record.master_playlist_url.as_deref(),
        Some("https://cdn.test/vid-pub/master.m3u8")
    );
    assert_eq!(
        record.thumbnail_url.as_deref(),
        Some("https://cdn.test/vid-pub/thumb.jpg")
    );
}

#[tokio::test]
async fn process_message_marks_failed_and_propagates() {
    let id = VideoId::from("vid-fail");
    let harness = Harness::new(
        FakeBackend::failing_at(FailAt::Thumbnail),
        MemoryBlobStore::new(),
        MemoryStore::with_record(pending_record(&id)),
    );

    let err = process_message(&harness.ctx, &job_for(&harness, &id))
        .await
        .unwrap_err();
    // The error still reaches the queue layer after the state write
    assert!(err.to_string().contains("thumbnail"));

    let record = harness.store.record(&id).unwrap();
    assert_eq!(record.status, VideoStatus::Failed);
    assert_eq!(record.upload_status, UploadStatus::Failed);
    assert!(record
        .error_message
        .as_deref()
        .unwrap()
        .contains("thumbnail"));

    // No partial published state, and the input is gone either way
    assert!(record.master_playlist_url.is_none());
    harness.assert_cleaned(&id);
}

#[tokio::test]
async fn process_message_survives_processing_status_outage() {
    let id = VideoId::from("vid-adv");
    let store = MemoryStore {
        fail_set_processing: true,
        ..MemoryStore::default()
    };
    store
        .records
        .lock()
        .unwrap()
        .insert(id.to_string(), pending_record(&id));

    let harness = Harness::new(FakeBackend::ok(), MemoryBlobStore::new(), store);

    // The processing-status write is advisory; the job still publishes
    process_message(&harness.ctx, &job_for(&harness, &id))
        .await
        .unwrap();

    let record = harness.store.record(&id).unwrap();
    assert_eq!(record.status, VideoStatus::Published);
}
