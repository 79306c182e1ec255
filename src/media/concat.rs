use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

use super::ffmpeg::{require_exists, require_output, run_ffmpeg};
use super::normalize::normalize_clip;

/// How a finalized clip was produced. The fallback is a first-class path,
/// not an incidental catch-all, so callers can see which route ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConcatOutcome {
    /// Container-level join, streams copied without re-encoding.
    StreamCopied(PathBuf),
    /// Full re-encode through the normalization profile.
    Reencoded(PathBuf),
}

impl ConcatOutcome {
    pub fn path(&self) -> &Path {
        match self {
            ConcatOutcome::StreamCopied(p) | ConcatOutcome::Reencoded(p) => p,
        }
    }
}

fn write_concat_list(clips: &[&Path], list_path: &Path) -> Result<()> {
    let mut contents = String::new();
    for clip in clips {
        // Concat-demuxer entry; single quotes in paths close and reopen the
        // quoted string.
        let escaped = clip.display().to_string().replace('\'', r"'\''");
        contents.push_str(&format!("file '{escaped}'\n"));
    }
    std::fs::write(list_path, contents)?;
    Ok(())
}

/// Finalize a single clip (no body segment).
///
/// Tries the cheap container-level copy first; any failure falls back to a
/// full re-encode, which always works but costs a transcode. The output
/// duration matches the input either way.
pub async fn finalize_single(clip: &Path, work_dir: &Path, output: &Path) -> Result<ConcatOutcome> {
    require_exists(clip)?;

    match stream_copy_single(clip, work_dir, output).await {
        Ok(()) => {
            debug!("Fast-path stream copy succeeded for {}", clip.display());
            Ok(ConcatOutcome::StreamCopied(output.to_path_buf()))
        }
        Err(e) => {
            warn!(
                "Stream copy failed for {} ({e}), re-encoding instead",
                clip.display()
            );
            normalize_clip(clip, output).await?;
            Ok(ConcatOutcome::Reencoded(output.to_path_buf()))
        }
    }
}

async fn stream_copy_single(clip: &Path, work_dir: &Path, output: &Path) -> Result<()> {
    let list_path = work_dir.join("concat_list.txt");
    write_concat_list(&[clip], &list_path)?;

    run_ffmpeg(
        "stream-copy concat",
        [
            "-f".as_ref(),
            "concat".as_ref(),
            "-safe".as_ref(),
            "0".as_ref(),
            "-i".as_ref(),
            list_path.as_os_str(),
            "-c".as_ref(),
            "copy".as_ref(),
            output.as_os_str(),
        ],
    )?;
    require_output(output, "stream-copy concat")
}

/// Join the hook+voice-over clip with a body segment.
///
/// The two sides are independently sourced, so both are normalized to the
/// target profile first and joined through a filter graph with a re-encode.
/// Stream copy is never attempted here.
pub async fn concat_with_body(
    base: &Path,
    body: &Path,
    work_dir: &Path,
    output: &Path,
) -> Result<()> {
    require_exists(base)?;
    require_exists(body)?;

    let norm_base = work_dir.join("norm_base.mp4");
    let norm_body = work_dir.join("norm_body.mp4");
    normalize_clip(base, &norm_base).await?;
    normalize_clip(body, &norm_body).await?;

    debug!(
        "Concatenating {} + {}",
        norm_base.display(),
        norm_body.display()
    );

    run_ffmpeg(
        "filter-graph concat",
        [
            "-i".as_ref(),
            norm_base.as_os_str(),
            "-i".as_ref(),
            norm_body.as_os_str(),
            "-filter_complex".as_ref(),
            "[0:v][0:a][1:v][1:a]concat=n=2:v=1:a=1[v][a]".as_ref(),
            "-map".as_ref(),
            "[v]".as_ref(),
            "-map".as_ref(),
            "[a]".as_ref(),
            "-c:v".as_ref(),
            "libx264".as_ref(),
            "-preset".as_ref(),
            "veryfast".as_ref(),
            "-c:a".as_ref(),
            "aac".as_ref(),
            output.as_os_str(),
        ],
    )?;
    require_output(output, "filter-graph concat")
}
