//! HLS encoding policy: the fixed bitrate ladder and segmenting constants.

/// Video codec for all variants (H.264)
pub const VIDEO_CODEC: &str = "libx264";
/// Audio codec for all variants
pub const AUDIO_CODEC: &str = "aac";
/// Encoding preset
pub const PRESET: &str = "veryfast";
/// GOP size; keeps keyframes on segment boundaries together with
/// `sc_threshold=0` so every segment starts on a keyframe.
pub const GOP_SIZE: u32 = 48;
/// Target segment duration in seconds
pub const SEGMENT_SECONDS: u32 = 4;
/// Rate-control buffer size passed to `-bufsize`
pub const RATE_BUFSIZE: &str = "2M";

/// Segment filename template inside each variant directory
pub const SEGMENT_TEMPLATE: &str = "segment_%03d.ts";
/// Variant playlist filename
pub const VARIANT_PLAYLIST: &str = "index.m3u8";
/// Master playlist filename
pub const MASTER_PLAYLIST: &str = "master.m3u8";
/// Thumbnail filename
pub const THUMBNAIL_NAME: &str = "thumb.jpg";

/// Thumbnail extraction timestamp. Sources shorter than this fail the job.
pub const THUMBNAIL_TIMESTAMP: &str = "00:00:02";
/// Thumbnail JPEG quality (`-q:v`, lower is better)
pub const THUMBNAIL_QUALITY: u8 = 2;

/// One rung of the bitrate ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LadderRung {
    /// Resolution label, e.g. "720p"
    pub label: &'static str,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Video bitrate in kbit/s
    pub video_bitrate_kbps: u32,
    /// Audio bitrate in kbit/s
    pub audio_bitrate_kbps: u32,
}

impl LadderRung {
    /// Manifest bandwidth in bits per second.
    ///
    /// Taken from the ladder policy, not measured from encoder output.
    pub fn bandwidth_bits(&self) -> u64 {
        self.video_bitrate_kbps as u64 * 1000
    }

    /// Resolution string in `WxH` form.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// The fixed bitrate ladder. Policy, not configuration.
pub const BITRATE_LADDER: [LadderRung; 4] = [
    LadderRung { label: "360p", width: 640, height: 360, video_bitrate_kbps: 800, audio_bitrate_kbps: 64 },
    LadderRung { label: "480p", width: 854, height: 480, video_bitrate_kbps: 1400, audio_bitrate_kbps: 96 },
    LadderRung { label: "720p", width: 1280, height: 720, video_bitrate_kbps: 2800, audio_bitrate_kbps: 128 },
    LadderRung { label: "1080p", width: 1920, height: 1080, video_bitrate_kbps: 5000, audio_bitrate_kbps: 192 },
];

/// Look up a ladder rung by its resolution label.
pub fn rung_for_label(label: &str) -> Option<&'static LadderRung> {
    BITRATE_LADDER.iter().find(|r| r.label == label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_order_and_shape() {
        let labels: Vec<_> = BITRATE_LADDER.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["360p", "480p", "720p", "1080p"]);

        // Bitrates must increase with resolution
        for pair in BITRATE_LADDER.windows(2) {
            assert!(pair[0].video_bitrate_kbps < pair[1].video_bitrate_kbps);
            assert!(pair[0].height < pair[1].height);
        }
    }

    #[test]
    fn test_rung_lookup() {
        let rung = rung_for_label("720p").unwrap();
        assert_eq!(rung.resolution(), "1280x720");
        assert_eq!(rung.bandwidth_bits(), 2_800_000);

        assert!(rung_for_label("144p").is_none());
    }
}
