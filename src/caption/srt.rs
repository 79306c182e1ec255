use super::CaptionTrack;

/// Render a caption track as SRT.
pub fn render_srt(track: &CaptionTrack) -> String {
    track
        .cues
        .iter()
        .map(|cue| {
            format!(
                "{}\n{} --> {}\n{}\n",
                cue.index,
                format_timestamp(cue.start),
                format_timestamp(cue.end),
                cue.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_timestamp(d: std::time::Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = d.subsec_millis();
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::TranscriptSegment;
    use std::time::Duration;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp(Duration::from_millis(1500)),
            "00:00:01,500"
        );
        assert_eq!(
            format_timestamp(Duration::from_secs(3661) + Duration::from_millis(123)),
            "01:01:01,123"
        );
    }

    #[test]
    fn test_render_srt() {
        let track = CaptionTrack::from_segments(vec![
            TranscriptSegment {
                start: Duration::from_millis(1500),
                end: Duration::from_millis(4000),
                text: "Hello, world.".to_string(),
            },
            TranscriptSegment {
                start: Duration::from_millis(4500),
                end: Duration::from_millis(7000),
                text: "This is a test".to_string(),
            },
        ]);

        let output = render_srt(&track);

        assert!(output.contains("1\n00:00:01,500 --> 00:00:04,000\nHello, world"));
        assert!(output.contains("2\n00:00:04,500 --> 00:00:07,000\nThis is a test"));
    }

    #[test]
    fn test_render_srt_empty_track() {
        assert!(render_srt(&CaptionTrack::default()).is_empty());
    }
}
