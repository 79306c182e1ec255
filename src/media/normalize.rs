use std::path::Path;

use tracing::debug;

use crate::error::Result;

use super::ffmpeg::{require_exists, require_output, run_ffmpeg};

/// Canonical concatenation profile. Two clips re-encoded to this profile can
/// be joined by a filter graph regardless of where they came from.
pub const TARGET_WIDTH: u32 = 1080;
pub const TARGET_HEIGHT: u32 = 1920;
pub const TARGET_FPS: u32 = 30;
pub const TARGET_SAMPLE_RATE: u32 = 44_100;
pub const TARGET_CHANNELS: u32 = 2;

fn video_filter() -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,fps={fps}",
        w = TARGET_WIDTH,
        h = TARGET_HEIGHT,
        fps = TARGET_FPS
    )
}

/// Re-encode a clip to the fixed target profile.
pub async fn normalize_clip(input: &Path, output: &Path) -> Result<()> {
    require_exists(input)?;

    debug!("Normalizing {} to {}x{}@{}", input.display(), TARGET_WIDTH, TARGET_HEIGHT, TARGET_FPS);

    let vf = video_filter();
    let sample_rate = TARGET_SAMPLE_RATE.to_string();
    let channels = TARGET_CHANNELS.to_string();
    run_ffmpeg(
        "normalize",
        [
            "-i".as_ref(),
            input.as_os_str(),
            "-vf".as_ref(),
            vf.as_ref(),
            "-c:v".as_ref(),
            "libx264".as_ref(),
            "-preset".as_ref(),
            "veryfast".as_ref(),
            "-c:a".as_ref(),
            "aac".as_ref(),
            "-ar".as_ref(),
            sample_rate.as_ref(),
            "-ac".as_ref(),
            channels.as_ref(),
            output.as_os_str(),
        ],
    )?;
    require_output(output, "normalize")
}
