//! Thumbnail extraction.

use std::path::Path;

use vod_models::encoding::{THUMBNAIL_QUALITY, THUMBNAIL_TIMESTAMP};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Extract a single high-quality JPEG frame at the fixed offset.
///
/// Sources shorter than the offset fail here; there is no fallback to the
/// first frame.
pub async fn extract_thumbnail(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let cmd = FfmpegCommand::new(input, output)
        .input_arg("-ss")
        .input_arg(THUMBNAIL_TIMESTAMP)
        .single_frame()
        .output_arg("-q:v")
        .output_arg(THUMBNAIL_QUALITY.to_string());

    FfmpegRunner::new().run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_command_shape() {
        let cmd = FfmpegCommand::new("in.mp4", "thumb.jpg")
            .input_arg("-ss")
            .input_arg(THUMBNAIL_TIMESTAMP)
            .single_frame()
            .output_arg("-q:v")
            .output_arg(THUMBNAIL_QUALITY.to_string());

        let args = cmd.build_args();
        assert!(args.contains(&"00:00:02".to_string()));
        assert!(args.contains(&"-vframes".to_string()));
        assert!(args.contains(&"2".to_string()));
    }

    #[tokio::test]
    async fn test_missing_input_fails() {
        let err = extract_thumbnail("/nonexistent/in.mp4", "/tmp/out.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
