//! Whitespace normalization used for segment comparison and rendering.

use crate::types::Segment;

/// Collapse runs of whitespace to single spaces and trim. This is the
/// comparison form for confirmation, so leading/trailing-space differences
/// between decode passes never block a match.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render segments to a space-joined, normalized string. Blank segments
/// drop out rather than producing doubled spaces.
pub fn render_segments(segments: &[Segment]) -> String {
    let joined = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_whitespace(&joined)
}

/// Join two already-normalized pieces with a single space, skipping blanks.
pub fn join_nonblank(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{} {}", left, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_trims() {
        assert_eq!(normalize_whitespace("  Hello   world \n"), "Hello world");
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn render_skips_blank_segments() {
        let segs = vec![
            Segment::new(" Hello ", 0, 500),
            Segment::new("   ", 500, 600),
            Segment::new("world", 600, 1000),
        ];
        assert_eq!(render_segments(&segs), "Hello world");
    }

    #[test]
    fn join_nonblank_handles_empty_sides() {
        assert_eq!(join_nonblank("", "tail"), "tail");
        assert_eq!(join_nonblank("head", ""), "head");
        assert_eq!(join_nonblank("head", "tail"), "head tail");
    }
}
