use std::path::Path;
use std::process::Command;

use tracing::debug;

/// Pixel height assumed when a video stream's height cannot be read.
pub const DEFAULT_HEIGHT: u32 = 720;

/// Media duration in seconds, `0.0` when indeterminate.
///
/// Unreadable files, missing metadata, and a missing ffprobe all collapse to
/// `0.0`; probing never fails. Callers may cache the value per asset.
pub fn probe_duration(input: &Path) -> f64 {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .output();

    let output = match output {
        Ok(o) if o.status.success() => o,
        Ok(_) | Err(_) => {
            debug!("Duration probe failed for {}, treating as indeterminate", input.display());
            return 0.0;
        }
    };

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<f64>()
        .unwrap_or(0.0)
}

/// Height in pixels of the primary video stream, `DEFAULT_HEIGHT` when it
/// cannot be determined.
pub fn probe_height(input: &Path) -> u32 {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=height",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .output();

    let output = match output {
        Ok(o) if o.status.success() => o,
        Ok(_) | Err(_) => {
            debug!("Height probe failed for {}, using default", input.display());
            return DEFAULT_HEIGHT;
        }
    };

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<u32>()
        .unwrap_or(DEFAULT_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_probe_duration_unreadable_is_zero() {
        assert_eq!(probe_duration(&PathBuf::from("/nonexistent/clip.mp4")), 0.0);
    }

    #[test]
    fn test_probe_duration_non_media_is_zero() {
        // An existing file with no media metadata is indeterminate, not an error.
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"not a video").unwrap();
        assert_eq!(probe_duration(file.path()), 0.0);
    }

    #[test]
    fn test_probe_height_falls_back_to_default() {
        assert_eq!(probe_height(&PathBuf::from("/nonexistent/clip.mp4")), DEFAULT_HEIGHT);
    }
}
