use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{ClipstormError, Result};

/// Check if FFmpeg is installed and accessible.
pub fn check_ffmpeg() -> Result<()> {
    let output = Command::new("ffmpeg").arg("-version").output().map_err(|e| {
        ClipstormError::Transcode(format!(
            "FFmpeg not found. Please install FFmpeg and ensure it's in your PATH. Error: {e}"
        ))
    })?;

    if !output.status.success() {
        return Err(ClipstormError::Transcode("FFmpeg check failed".to_string()));
    }

    debug!("FFmpeg is available");
    Ok(())
}

/// Check if FFprobe is installed and accessible.
pub fn check_ffprobe() -> Result<()> {
    let output = Command::new("ffprobe").arg("-version").output().map_err(|e| {
        ClipstormError::Transcode(format!(
            "FFprobe not found. Please install FFmpeg (includes FFprobe). Error: {e}"
        ))
    })?;

    if !output.status.success() {
        return Err(ClipstormError::Transcode("FFprobe check failed".to_string()));
    }

    debug!("FFprobe is available");
    Ok(())
}

/// Run an ffmpeg invocation to completion, mapping any failure to a
/// `Transcode` error carrying the tail of stderr.
pub(crate) fn run_ffmpeg<I, S>(operation: &str, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new("ffmpeg")
        .arg("-y")
        .args(args)
        .output()
        .map_err(|e| ClipstormError::Transcode(format!("Failed to run FFmpeg ({operation}): {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ClipstormError::Transcode(format!(
            "FFmpeg {operation} failed: {}",
            stderr_tail(&stderr)
        )));
    }

    Ok(())
}

/// Last few stderr lines; full ffmpeg banners drown the actual cause.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let tail = lines.len().saturating_sub(4);
    lines[tail..].join(" | ")
}

pub(crate) fn require_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ClipstormError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

/// Verify an ffmpeg invocation actually produced its output file.
pub(crate) fn require_output(path: &Path, operation: &str) -> Result<()> {
    if !path.exists() {
        return Err(ClipstormError::Transcode(format!(
            "FFmpeg {operation} reported success but produced no output: {}",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
