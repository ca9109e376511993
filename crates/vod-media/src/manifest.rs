//! ABR master playlist synthesis.

use std::path::{Path, PathBuf};

use tokio::fs;

use vod_models::encoding::{rung_for_label, MASTER_PLAYLIST, VARIANT_PLAYLIST};

use crate::error::{MediaError, MediaResult};

/// Build the master playlist text for the given variant labels.
///
/// Variants appear in exactly the given order; bandwidth and resolution come
/// from the ladder table, never from measured encoder output.
pub fn build_master_manifest(labels: &[String]) -> MediaResult<String> {
    let mut master = String::from("#EXTM3U\n");

    for label in labels {
        let rung =
            rung_for_label(label).ok_or_else(|| MediaError::UnknownVariant(label.clone()))?;

        master.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}\n",
            rung.bandwidth_bits(),
            rung.resolution()
        ));
        master.push_str(&format!("{}/{}\n", label, VARIANT_PLAYLIST));
    }

    Ok(master)
}

/// Build and write `master.m3u8` into the work directory.
///
/// Returns the manifest text and the path written.
pub async fn write_master_manifest(
    work_dir: impl AsRef<Path>,
    labels: &[String],
) -> MediaResult<(String, PathBuf)> {
    let manifest = build_master_manifest(labels)?;
    let path = work_dir.as_ref().join(MASTER_PLAYLIST);
    fs::write(&path, &manifest).await?;
    Ok((manifest, path))
}
