//! HLS bitrate-ladder transcoding.

use std::path::Path;

use tokio::fs;
use tracing::{debug, info};

use vod_models::encoding::{
    AUDIO_CODEC, BITRATE_LADDER, GOP_SIZE, PRESET, RATE_BUFSIZE, SEGMENT_SECONDS,
    SEGMENT_TEMPLATE, VARIANT_PLAYLIST, VIDEO_CODEC,
};

use crate::command::FfmpegRunner;
use crate::error::{MediaError, MediaResult};
use crate::probe::has_audio_stream;

/// Transcode `input` into one HLS segment set per ladder rung under
/// `work_dir/<label>/`, with a single multi-output FFmpeg invocation.
///
/// Returns the variant labels produced, in ladder order. The caller owns
/// `work_dir` and its cleanup.
pub async fn transcode_ladder(
    input: &Path,
    work_dir: &Path,
    timeout_secs: Option<u64>,
) -> MediaResult<Vec<String>> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    // Audio-less sources must not get audio mapping args, or the whole
    // invocation fails.
    let with_audio = has_audio_stream(input).await?;
    debug!("Transcoding {} (audio: {})", input.display(), with_audio);

    for rung in &BITRATE_LADDER {
        fs::create_dir_all(work_dir.join(rung.label)).await?;
    }

    let args = build_hls_args(input, work_dir, with_audio);

    let mut runner = FfmpegRunner::new();
    if let Some(secs) = timeout_secs {
        runner = runner.with_timeout(secs);
    }
    runner.run_args(&args).await?;

    let labels: Vec<String> = BITRATE_LADDER.iter().map(|r| r.label.to_string()).collect();
    info!(
        "Transcoded {} into {} variants under {}",
        input.display(),
        labels.len(),
        work_dir.display()
    );
    Ok(labels)
}

/// Assemble the multi-output FFmpeg invocation for the full ladder.
///
/// One process encodes every rung; each output group carries its own map,
/// scale, rate control and HLS muxer arguments.
fn build_hls_args(input: &Path, work_dir: &Path, with_audio: bool) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
    ];

    for rung in &BITRATE_LADDER {
        let out_dir = work_dir.join(rung.label);

        args.push("-map".into());
        args.push("0:v:0".into());
        if with_audio {
            args.push("-map".into());
            args.push("0:a:0?".into());
        }

        args.push("-vf".into());
        args.push(format!("scale=w={}:h={}", rung.width, rung.height));
        args.push("-c:v".into());
        args.push(VIDEO_CODEC.into());
        args.push("-b:v".into());
        args.push(format!("{}k", rung.video_bitrate_kbps));
        args.push("-maxrate".into());
        args.push(format!("{}k", rung.video_bitrate_kbps));
        args.push("-bufsize".into());
        args.push(RATE_BUFSIZE.into());
        args.push("-preset".into());
        args.push(PRESET.into());
        args.push("-g".into());
        args.push(GOP_SIZE.to_string());
        args.push("-sc_threshold".into());
        args.push("0".into());

        if with_audio {
            args.push("-c:a".into());
            args.push(AUDIO_CODEC.into());
            args.push("-b:a".into());
            args.push(format!("{}k", rung.audio_bitrate_kbps));
        }

        args.push("-f".into());
        args.push("hls".into());
        args.push("-hls_time".into());
        args.push(SEGMENT_SECONDS.to_string());
        args.push("-hls_playlist_type".into());
        args.push("vod".into());
        args.push("-hls_segment_filename".into());
        args.push(out_dir.join(SEGMENT_TEMPLATE).to_string_lossy().into_owned());
        args.push(out_dir.join(VARIANT_PLAYLIST).to_string_lossy().into_owned());
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args_for(with_audio: bool) -> Vec<String> {
        build_hls_args(
            &PathBuf::from("/in/raw.mp4"),
            &PathBuf::from("/work/abc"),
            with_audio,
        )
    }

    fn count(args: &[String], needle: &str) -> usize {
        args.iter().filter(|a| a.as_str() == needle).count()
    }

    #[test]
    fn test_one_output_group_per_rung() {
        let args = args_for(true);

        // Four HLS outputs, four variant playlists
        assert_eq!(count(&args, "hls"), 4);
        assert!(args.contains(&"/work/abc/360p/index.m3u8".to_string()));
        assert!(args.contains(&"/work/abc/1080p/index.m3u8".to_string()));
        assert!(args.contains(&"/work/abc/720p/segment_%03d.ts".to_string()));
    }

    #[test]
    fn test_audio_args_present_with_audio() {
        let args = args_for(true);

        assert_eq!(count(&args, "0:a:0?"), 4);
        assert_eq!(count(&args, "-c:a"), 4);
        assert!(args.contains(&"64k".to_string()));
        assert!(args.contains(&"192k".to_string()));
    }

    #[test]
    fn test_audio_args_omitted_without_audio() {
        let args = args_for(false);

        assert_eq!(count(&args, "0:a:0?"), 0);
        assert_eq!(count(&args, "-c:a"), 0);
        assert_eq!(count(&args, "aac"), 0);
        // Video mapping still present for every rung
        assert_eq!(count(&args, "0:v:0"), 4);
    }

    #[test]
    fn test_keyframe_alignment_args() {
        let args = args_for(true);

        assert_eq!(count(&args, "-sc_threshold"), 4);
        assert_eq!(count(&args, "-g"), 4);
        assert_eq!(count(&args, "veryfast"), 4);
        assert!(args.contains(&"scale=w=1280:h=720".to_string()));
        assert!(args.contains(&"2800k".to_string()));
    }

    #[tokio::test]
    async fn test_transcode_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = transcode_ladder(Path::new("/nonexistent/raw.mp4"), dir.path(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
