use std::sync::OnceLock;

use regex::Regex;

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[\s"']+"#).unwrap())
}

fn disallowed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").unwrap())
}

/// Normalize an arbitrary user-supplied name into a string that is safe as a
/// filesystem path component and as an unquoted CLI argument.
///
/// Whitespace, double quotes, and apostrophes collapse to a single
/// underscore; anything else outside `[A-Za-z0-9._-]` is stripped.
pub fn sanitize(input: &str) -> String {
    let underscored = separator_re().replace_all(input, "_");
    disallowed_re().replace_all(&underscored, "").into_owned()
}

/// Sanitized file stem of a path-like name (extension removed first).
///
/// Two different uploads can sanitize to the same stem; callers treat that
/// as a visible naming collision, not something to silently deduplicate.
pub fn sanitize_stem(file_name: &str) -> String {
    let stem = std::path::Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    sanitize(&stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_separators() {
        assert_eq!(sanitize("my cool clip"), "my_cool_clip");
        assert_eq!(sanitize("it's \"fine\""), "it_s_fine_");
    }

    #[test]
    fn test_sanitize_strips_disallowed() {
        assert_eq!(sanitize("héllo!@#.mp4"), "hllo.mp4");
        assert_eq!(sanitize("a/b\\c"), "abc");
    }

    #[test]
    fn test_sanitize_idempotent() {
        let inputs = ["my clip (final).mp4", "ümläut video", "  spaces  ", "clean-name_01.mp4"];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_sanitize_output_charset() {
        let out = sanitize("w%e$i#r@d n'a\"m e.mov");
        assert!(out
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'));
    }

    #[test]
    fn test_sanitize_stem_drops_extension() {
        assert_eq!(sanitize_stem("my clip.mp4"), "my_clip");
        assert_eq!(sanitize_stem("voice over.wav"), "voice_over");
    }

    #[test]
    fn test_distinct_inputs_can_collide() {
        // Caller-visible collision: different raw names, same sanitized stem.
        assert_eq!(sanitize_stem("take one.mp4"), sanitize_stem("take'one.mp4"));
    }
}
