use std::path::Path;

use tracing::debug;

use crate::error::Result;

use super::ffmpeg::{require_exists, require_output, run_ffmpeg};

/// Truncate a hook video to `target_secs` and re-encode to the canonical
/// codec pair (H.264 + AAC).
///
/// Callers must have already verified the hook is at least `target_secs`
/// long; a shorter hook is a skip decision made upstream, not an error here.
pub async fn cut_clip(input: &Path, target_secs: f64, output: &Path) -> Result<()> {
    require_exists(input)?;

    debug!("Cutting {} to {:.3}s", input.display(), target_secs);

    let duration = format!("{:.3}", target_secs);
    run_ffmpeg(
        "clip cut",
        [
            "-i".as_ref(),
            input.as_os_str(),
            "-t".as_ref(),
            duration.as_ref(),
            "-c:v".as_ref(),
            "libx264".as_ref(),
            "-preset".as_ref(),
            "veryfast".as_ref(),
            "-c:a".as_ref(),
            "aac".as_ref(),
            output.as_os_str(),
        ],
    )?;
    require_output(output, "clip cut")
}
