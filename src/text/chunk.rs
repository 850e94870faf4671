//! Overlapping text chunking for embedding.
//!
//! Splits normalized text into fixed-size windows with overlap, biasing
//! window boundaries toward sentence ends.

/// How far past the window a cut may move to land on a sentence end.
pub const LOOKAHEAD: usize = 100;

/// An ordered span of text with its char offsets in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// Span text.
    pub text: String,
    /// Start offset (chars, inclusive).
    pub start: usize,
    /// End offset (chars, exclusive).
    pub end: usize,
}

/// Split text into overlapping spans of roughly `chunk_size` chars.
///
/// Each window may extend past `chunk_size` by at most [`LOOKAHEAD`] chars
/// to end on the last period found there, but only when that period lies
/// past 80% of the window. The next window starts `overlap` chars before
/// the previous cut, so consecutive spans share context.
///
/// # Panics
///
/// Panics if `overlap >= chunk_size` or `chunk_size == 0`.
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextSpan> {
    assert!(chunk_size > 0, "chunk_size must be positive");
    assert!(
        overlap < chunk_size,
        "overlap ({}) must be smaller than chunk_size ({})",
        overlap,
        chunk_size
    );

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let window_end = (start + chunk_size).min(chars.len());
        let extended_end = (start + chunk_size + LOOKAHEAD).min(chars.len());

        let mut end = window_end;
        if window_end < chars.len() {
            // Last period in the extended window, accepted only past 80%
            // of the nominal window.
            let threshold = start + chunk_size * 4 / 5;
            if let Some(pos) = (start..extended_end).rev().find(|&i| chars[i] == '.') {
                if pos >= threshold {
                    end = pos + 1;
                }
            }
        }

        spans.push(TextSpan {
            text: chars[start..end].iter().collect(),
            start,
            end,
        });

        if end >= chars.len() {
            break;
        }

        // Overlap the next window; always make forward progress.
        start = end.saturating_sub(overlap).max(start + 1);
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(split("", 100, 20).is_empty());
    }

    #[test]
    fn test_short_input_single_span() {
        let spans = split("short text", 100, 20);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "short text");
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[0].end, 10);
    }

    #[test]
    #[should_panic(expected = "overlap")]
    fn test_rejects_overlap_not_smaller_than_chunk_size() {
        split("some text", 50, 50);
    }

    #[test]
    fn test_terminates_and_bounds_length() {
        let text = "word ".repeat(500);
        let spans = split(&text, 100, 20);
        assert!(!spans.is_empty());
        for span in &spans {
            assert!(span.text.chars().count() <= 100 + LOOKAHEAD);
        }
    }

    #[test]
    fn test_overlap_between_consecutive_spans() {
        let text = "a".repeat(250);
        let spans = split(&text, 100, 20);
        // No periods, so cuts land exactly on the window.
        assert_eq!(spans[0].end, 100);
        assert_eq!(spans[1].start, 80);
        let tail_of_first: String = spans[0].text.chars().skip(80).collect();
        let head_of_second: String = spans[1].text.chars().take(20).collect();
        assert_eq!(tail_of_first, head_of_second);
    }

    #[test]
    fn test_reconstruction_from_offsets() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(30);
        let spans = split(&text, 120, 30);

        let mut rebuilt = String::new();
        let mut covered = 0usize;
        for span in &spans {
            assert!(span.start <= covered, "gap between spans");
            let skip = covered - span.start;
            rebuilt.extend(span.text.chars().skip(skip));
            covered = span.end;
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_prefers_sentence_boundary_past_threshold() {
        // Period at char 95 of a 100-char window: past the 80% mark, so the
        // cut moves there.
        let mut text = "x".repeat(95);
        text.push('.');
        text.push_str(&"y".repeat(200));
        let spans = split(&text, 100, 10);
        assert_eq!(spans[0].end, 96);
        assert!(spans[0].text.ends_with('.'));
    }

    #[test]
    fn test_ignores_sentence_boundary_before_threshold() {
        // Period at char 40: before the 80% mark, cut stays at the window.
        let mut text = "x".repeat(40);
        text.push('.');
        text.push_str(&"y".repeat(300));
        let spans = split(&text, 100, 10);
        assert_eq!(spans[0].end, 100);
    }

    #[test]
    fn test_lookahead_can_extend_past_window() {
        // No period inside the window, one shortly after it: the extended
        // window picks it up.
        let mut text = "x".repeat(120);
        text.push('.');
        text.push_str(&"y".repeat(300));
        let spans = split(&text, 100, 10);
        assert_eq!(spans[0].end, 121);
        assert!(spans[0].text.chars().count() <= 100 + LOOKAHEAD);
    }
}
