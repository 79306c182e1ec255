use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::media::ffmpeg::{require_exists, require_output, run_ffmpeg};

use super::srt::render_srt;
use super::{CaptionStyle, CaptionTrack};

/// Burn a caption track into a video, copying the audio stream unchanged.
///
/// The subtitle file is materialized in the job's working directory; the
/// style is computed by the caller from the target video's height.
pub async fn burn_captions(
    video: &Path,
    track: &CaptionTrack,
    style: CaptionStyle,
    work_dir: &Path,
    output: &Path,
) -> Result<()> {
    require_exists(video)?;

    let srt_path = work_dir.join("captions.srt");
    std::fs::write(&srt_path, render_srt(track))?;

    // Colons and quotes are filter-graph syntax; escape the path so tempdirs
    // with unusual names survive.
    let escaped = srt_path
        .display()
        .to_string()
        .replace('\\', r"\\")
        .replace(':', r"\:")
        .replace('\'', r"\'");
    let vf = format!("subtitles={}:force_style='{}'", escaped, style.force_style());

    debug!("Burning {} cues into {}", track.cues.len(), video.display());

    run_ffmpeg(
        "caption burn",
        [
            "-i".as_ref(),
            video.as_os_str(),
            "-vf".as_ref(),
            vf.as_ref(),
            "-c:a".as_ref(),
            "copy".as_ref(),
            output.as_os_str(),
        ],
    )?;
    require_output(output, "caption burn")
}
