use std::path::Path;

use tracing::debug;

use crate::error::Result;

use super::ffmpeg::{require_exists, require_output, run_ffmpeg};

/// Replace a video's audio track with a separately supplied one.
///
/// The visual stream is copied untouched; the voice-over is encoded to AAC.
/// `-shortest` bounds the output to the shorter of the two streams, so a cut
/// hook and its trimmed voice-over stay in lockstep.
pub async fn merge_audio(video: &Path, audio: &Path, output: &Path) -> Result<()> {
    require_exists(video)?;
    require_exists(audio)?;

    debug!(
        "Merging audio {} into {}",
        audio.display(),
        video.display()
    );

    run_ffmpeg(
        "audio merge",
        [
            "-i".as_ref(),
            video.as_os_str(),
            "-i".as_ref(),
            audio.as_os_str(),
            "-map".as_ref(),
            "0:v".as_ref(),
            "-map".as_ref(),
            "1:a".as_ref(),
            "-c:v".as_ref(),
            "copy".as_ref(),
            "-c:a".as_ref(),
            "aac".as_ref(),
            "-shortest".as_ref(),
            output.as_os_str(),
        ],
    )?;
    require_output(output, "audio merge")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClipstormError;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_merge_missing_video() {
        let result = merge_audio(
            &PathBuf::from("/nonexistent/base.mp4"),
            &PathBuf::from("/nonexistent/voice.wav"),
            &PathBuf::from("/tmp/out.mp4"),
        )
        .await;
        assert!(matches!(result, Err(ClipstormError::FileNotFound(_))));
    }
}
