pub mod concat;
pub mod cut;
pub mod ffmpeg;
pub mod merge;
pub mod normalize;
pub mod probe;
pub mod trim;

pub use concat::{concat_with_body, finalize_single, ConcatOutcome};
pub use cut::cut_clip;
pub use ffmpeg::{check_ffmpeg, check_ffprobe};
pub use merge::merge_audio;
pub use normalize::normalize_clip;
pub use probe::{probe_duration, probe_height, DEFAULT_HEIGHT};
pub use trim::{trim_voiceover, TrimWindow};

use std::path::PathBuf;

use crate::name::sanitize_stem;

/// What role a raw upload plays in a composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Hook,
    Voiceover,
    Body,
}

/// A raw media input plus its probed metadata.
///
/// Metadata is captured once at construction; assets are immutable after
/// that, so durations read during job execution are always consistent.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    /// Sanitized file stem, used in output names.
    pub name: String,
    /// The name the upload arrived with.
    pub original_name: String,
    pub kind: MediaKind,
    pub path: PathBuf,
    /// Seconds; `0.0` means the probe could not determine it.
    pub duration: f64,
    /// Pixel height of the primary video stream (videos only).
    pub height: u32,
}

impl MediaAsset {
    /// Build an asset by probing the file on disk.
    pub fn probed(kind: MediaKind, path: PathBuf, original_name: &str) -> Self {
        let duration = probe_duration(&path);
        let height = match kind {
            MediaKind::Voiceover => DEFAULT_HEIGHT,
            MediaKind::Hook | MediaKind::Body => probe_height(&path),
        };
        Self {
            name: sanitize_stem(original_name),
            original_name: original_name.to_string(),
            kind,
            path,
            duration,
            height,
        }
    }

    /// Build an asset with already-known metadata. Used by tests and by
    /// callers that probed elsewhere.
    pub fn with_metadata(
        kind: MediaKind,
        path: PathBuf,
        original_name: &str,
        duration: f64,
        height: u32,
    ) -> Self {
        Self {
            name: sanitize_stem(original_name),
            original_name: original_name.to_string(),
            kind,
            path,
            duration,
            height,
        }
    }
}

/// A voice-over with endpoint silence removed.
///
/// Computed exactly once per distinct voice-over upload and shared read-only
/// across every job that references it.
#[derive(Debug, Clone)]
pub struct TrimmedVoiceover {
    pub path: PathBuf,
    pub duration: f64,
}
