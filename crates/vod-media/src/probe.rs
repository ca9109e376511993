//! FFprobe media inspection.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
}

/// Run ffprobe against a file and parse its JSON output.
async fn run_ffprobe(path: &Path) -> MediaResult<FfprobeOutput> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "ffprobe exited with non-zero status",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    Ok(serde_json::from_slice(&output.stdout)?)
}

/// Get media duration in seconds.
///
/// Fails with [`MediaError::InvalidDuration`] when ffprobe reports no
/// duration or a value that is not a finite number.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();
    let probe = run_ffprobe(path).await?;

    let raw = probe
        .format
        .duration
        .ok_or_else(|| MediaError::InvalidDuration("no duration in ffprobe output".into()))?;

    let duration: f64 = raw
        .parse()
        .map_err(|_| MediaError::InvalidDuration(raw.clone()))?;

    if !duration.is_finite() || duration < 0.0 {
        return Err(MediaError::InvalidDuration(raw));
    }

    Ok(duration)
}

/// Check whether the input carries at least one audio stream.
pub async fn has_audio_stream(path: impl AsRef<Path>) -> MediaResult<bool> {
    let probe = run_ffprobe(path.as_ref()).await?;
    Ok(probe.streams.iter().any(|s| s.codec_type == "audio"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> FfprobeOutput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_probe_output_with_audio() {
        let probe = parse(
            r#"{
                "format": {"duration": "10.048000"},
                "streams": [
                    {"codec_type": "video"},
                    {"codec_type": "audio"}
                ]
            }"#,
        );

        assert!(probe.streams.iter().any(|s| s.codec_type == "audio"));
        let duration: f64 = probe.format.duration.unwrap().parse().unwrap();
        assert!((duration - 10.048).abs() < 0.001);
    }

    #[test]
    fn test_parse_probe_output_video_only() {
        let probe = parse(
            r#"{
                "format": {"duration": "3.2"},
                "streams": [{"codec_type": "video"}]
            }"#,
        );
        assert!(!probe.streams.iter().any(|s| s.codec_type == "audio"));
    }

    #[test]
    fn test_parse_probe_output_without_duration() {
        let probe = parse(r#"{"format": {}, "streams": []}"#);
        assert!(probe.format.duration.is_none());
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_duration("/nonexistent/input.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
