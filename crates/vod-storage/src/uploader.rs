//! Recursive work-tree upload.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tokio::fs;
use tokio::sync::Semaphore;
use tracing::info;

use crate::client::BlobStore;
use crate::error::{StorageError, StorageResult};

/// Bound on concurrent uploads within one tree pass.
const UPLOAD_CONCURRENCY: usize = 4;

/// MIME type by file extension, so segments and playlists serve correctly.
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("ts") => "video/MP2T",
        Some("m3u8") => "application/vnd.apple.mpegurl",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Upload every regular file under `local_root`, keyed as
/// `<video_id>/<path relative to root>` with `/` separators.
///
/// Returns a map of blob key to public URL. Keys are deterministic, so a
/// retry of the same video ID overwrites the same blobs. A failed upload
/// aborts the pass; already-uploaded files are left in place.
pub async fn upload_tree(
    store: &dyn BlobStore,
    local_root: &Path,
    video_id: &str,
) -> StorageResult<HashMap<String, String>> {
    let files = collect_files(local_root).await?;
    info!(
        "Uploading {} files from {} under {}/",
        files.len(),
        local_root.display(),
        video_id
    );

    let semaphore = Arc::new(Semaphore::new(UPLOAD_CONCURRENCY));

    let tasks = files.iter().map(|path| {
        let semaphore = Arc::clone(&semaphore);
        let key = blob_key(local_root, path, video_id);
        async move {
            let key = key?;
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| StorageError::upload_failed("upload semaphore closed"))?;
            let url = store.put_file(&key, path, content_type_for(path)).await?;
            Ok::<(String, String), StorageError>((key, url))
        }
    });

    let mut uploaded = HashMap::new();
    for result in join_all(tasks).await {
        let (key, url) = result?;
        uploaded.insert(key, url);
    }

    Ok(uploaded)
}

/// Blob key for one file: video ID plus the slash-normalized relative path.
fn blob_key(root: &Path, path: &Path, video_id: &str) -> StorageResult<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| StorageError::InvalidKey(format!("{} outside work tree", path.display())))?;

    let normalized: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    Ok(format!("{}/{}", video_id, normalized.join("/")))
}

/// Collect every regular file under `root`, depth-first.
async fn collect_files(root: &Path) -> StorageResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory blob store recording every put.
    struct MemoryBlobStore {
        puts: Mutex<Vec<(String, String)>>,
        fail_on: Option<String>,
    }

    impl MemoryBlobStore {
        fn new() -> Self {
            Self {
                puts: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(key_part: &str) -> Self {
            Self {
                puts: Mutex::new(Vec::new()),
                fail_on: Some(key_part.to_string()),
            }
        }

        fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self
                .puts
                .lock()
                .unwrap()
                .iter()
                .map(|(k, _)| k.clone())
                .collect();
            keys.sort();
            keys.dedup();
            keys
        }
    }

    #[async_trait]
    impl BlobStore for MemoryBlobStore {
        async fn put_file(
            &self,
            key: &str,
            _path: &Path,
            content_type: &str,
        ) -> StorageResult<String> {
            if let Some(part) = &self.fail_on {
                if key.contains(part.as_str()) {
                    return Err(StorageError::upload_failed("simulated transport error"));
                }
            }
            self.puts
                .lock()
                .unwrap()
                .push((key.to_string(), content_type.to_string()));
            Ok(format!("https://cdn.test/{}", key))
        }
    }

    async fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["360p", "720p"] {
            fs::create_dir_all(dir.path().join(sub)).await.unwrap();
            fs::write(dir.path().join(sub).join("index.m3u8"), b"#EXTM3U")
                .await
                .unwrap();
            fs::write(dir.path().join(sub).join("segment_000.ts"), b"seg")
                .await
                .unwrap();
        }
        fs::write(dir.path().join("master.m3u8"), b"#EXTM3U")
            .await
            .unwrap();
        fs::write(dir.path().join("thumb.jpg"), b"jpeg").await.unwrap();
        dir
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("a/segment_000.ts")), "video/MP2T");
        assert_eq!(
            content_type_for(Path::new("a/index.m3u8")),
            "application/vnd.apple.mpegurl"
        );
        assert_eq!(content_type_for(Path::new("thumb.jpg")), "image/jpeg");
        assert_eq!(
            content_type_for(Path::new("notes.txt")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_upload_tree_keys_and_urls() {
        let dir = sample_tree().await;
        let store = MemoryBlobStore::new();

        let uploaded = upload_tree(&store, dir.path(), "vid-1").await.unwrap();

        let mut keys: Vec<&String> = uploaded.keys().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "vid-1/360p/index.m3u8",
                "vid-1/360p/segment_000.ts",
                "vid-1/720p/index.m3u8",
                "vid-1/720p/segment_000.ts",
                "vid-1/master.m3u8",
                "vid-1/thumb.jpg",
            ]
        );
        assert_eq!(
            uploaded["vid-1/master.m3u8"],
            "https://cdn.test/vid-1/master.m3u8"
        );
    }

    #[tokio::test]
    async fn test_upload_tree_is_idempotent() {
        let dir = sample_tree().await;
        let store = MemoryBlobStore::new();

        let first = upload_tree(&store, dir.path(), "vid-1").await.unwrap();
        let second = upload_tree(&store, dir.path(), "vid-1").await.unwrap();

        let mut first_keys: Vec<_> = first.keys().collect();
        let mut second_keys: Vec<_> = second.keys().collect();
        first_keys.sort();
        second_keys.sort();
        assert_eq!(first_keys, second_keys);
    }

    #[tokio::test]
    async fn test_upload_failure_aborts_pass() {
        let dir = sample_tree().await;
        let store = MemoryBlobStore::failing_on("master.m3u8");

        let err = upload_tree(&store, dir.path(), "vid-1").await.unwrap_err();
        assert!(matches!(err, StorageError::UploadFailed(_)));

        // Files uploaded before the failure are not rolled back
        assert!(!store.keys().is_empty());
    }
}
