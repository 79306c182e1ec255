pub mod burn;
pub mod srt;
pub mod whisper;

pub use burn::burn_captions;
pub use whisper::WhisperClient;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// One timestamped piece of transcribed speech.
#[derive(Debug, Clone)]
pub struct TranscriptSegment {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

/// Speech-to-text provider seam. Production uses `WhisperClient`; tests
/// substitute a mock.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>>;
    fn name(&self) -> &'static str;
}

/// A single on-screen caption.
#[derive(Debug, Clone)]
pub struct CaptionCue {
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

/// Ordered, non-overlapping captions for one voice-over.
///
/// Derived once per distinct voice-over and reused for every hook/body
/// pairing; the track is independent of the video it is burned into.
#[derive(Debug, Clone, Default)]
pub struct CaptionTrack {
    pub cues: Vec<CaptionCue>,
}

impl CaptionTrack {
    /// Build a track from raw transcript segments: sort by start time, clamp
    /// overlapping cues, strip trailing periods, drop empty text.
    pub fn from_segments(mut segments: Vec<TranscriptSegment>) -> Self {
        segments.sort_by_key(|s| s.start);

        let mut cues: Vec<CaptionCue> = Vec::with_capacity(segments.len());
        for segment in segments {
            let text = segment.text.trim().trim_end_matches('.').to_string();
            if text.is_empty() {
                continue;
            }
            let end = segment.end.max(segment.start);
            if let Some(last) = cues.last_mut() {
                if segment.start < last.end {
                    last.end = segment.start;
                }
            }
            cues.push(CaptionCue {
                index: cues.len() + 1,
                start: segment.start,
                end,
                text,
            });
        }

        Self { cues }
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// Caption styling scaled to the target video's pixel height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptionStyle {
    pub font_size: u32,
    pub outline: f32,
    /// Vertical margin from the bottom edge.
    pub margin_v: u32,
}

impl CaptionStyle {
    /// Font size 5% of height, outline 0.3%, bottom margin 15%.
    pub fn for_height(height: u32) -> Self {
        let h = height as f32;
        Self {
            font_size: (h * 0.05).round() as u32,
            outline: h * 0.003,
            margin_v: (h * 0.15).round() as u32,
        }
    }

    /// Render as a libass `force_style` argument.
    pub fn force_style(&self) -> String {
        format!(
            "FontSize={},Outline={:.1},MarginV={},Alignment=2",
            self.font_size, self.outline, self.margin_v
        )
    }
}
