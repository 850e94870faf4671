//! Raw transcript normalization.
//!
//! Pure text cleanup applied before enrichment: HTML entity decoding,
//! filler-word removal, whitespace collapsing, and re-paragraphing.
//! Normalizing already-normalized text is a no-op.

use regex::Regex;

/// Options controlling normalization.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Strip filler tokens from the text.
    pub remove_fillers: bool,
    /// Re-group sentences into paragraphs.
    pub add_paragraphs: bool,
    /// Sentences per paragraph. Zero disables paragraphing.
    pub sentences_per_paragraph: usize,
    /// Filler words, matched on word boundaries only.
    pub filler_words: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            remove_fillers: true,
            add_paragraphs: true,
            sentences_per_paragraph: 4,
            filler_words: ["um", "uh", "er", "ah", "you know", "like"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl From<&crate::config::NormalizeSettings> for NormalizeOptions {
    fn from(s: &crate::config::NormalizeSettings) -> Self {
        Self {
            remove_fillers: s.remove_fillers,
            add_paragraphs: s.add_paragraphs,
            sentences_per_paragraph: s.sentences_per_paragraph,
            filler_words: s.filler_words.clone(),
        }
    }
}

/// Transcript normalizer with pre-compiled patterns.
pub struct Normalizer {
    options: NormalizeOptions,
    filler_regex: Option<Regex>,
    entity_regex: Regex,
    whitespace_regex: Regex,
    space_before_punct_regex: Regex,
    sentence_regex: Regex,
}

impl Normalizer {
    /// Create a normalizer for the given options.
    pub fn new(options: NormalizeOptions) -> Self {
        let filler_regex = if options.remove_fillers && !options.filler_words.is_empty() {
            // Longest alternatives first so multi-word fillers win.
            let mut words: Vec<&str> = options.filler_words.iter().map(|s| s.as_str()).collect();
            words.sort_by_key(|w| std::cmp::Reverse(w.len()));
            let pattern = format!(
                r"(?i)\b(?:{})\b,?",
                words
                    .iter()
                    .map(|w| regex::escape(w))
                    .collect::<Vec<_>>()
                    .join("|")
            );
            Regex::new(&pattern).ok()
        } else {
            None
        };

        Self {
            options,
            filler_regex,
            entity_regex: Regex::new(r"&#(\d+);").expect("Invalid regex"),
            whitespace_regex: Regex::new(r"\s+").expect("Invalid regex"),
            space_before_punct_regex: Regex::new(r"\s+([,.!?;:])").expect("Invalid regex"),
            sentence_regex: Regex::new(r"[^.!?]*[.!?]").expect("Invalid regex"),
        }
    }

    /// Normalize raw transcript text.
    pub fn normalize(&self, text: &str) -> String {
        let decoded = self.decode_entities(text);

        let without_fillers = match &self.filler_regex {
            Some(re) => re.replace_all(&decoded, "").into_owned(),
            None => decoded,
        };

        let collapsed = self
            .whitespace_regex
            .replace_all(without_fillers.trim(), " ")
            .into_owned();
        let collapsed = self
            .space_before_punct_regex
            .replace_all(&collapsed, "$1")
            .into_owned();

        if self.options.add_paragraphs && self.options.sentences_per_paragraph > 0 {
            self.paragraphs(&collapsed)
        } else {
            collapsed
        }
    }

    /// Decode HTML entities, including doubly-encoded forms such as
    /// `&amp;amp;`.
    fn decode_entities(&self, text: &str) -> String {
        let mut result = text.to_string();
        // Two passes cover the doubly-encoded case; a pass that changes
        // nothing ends early.
        for _ in 0..2 {
            let decoded = self.decode_entities_once(&result);
            if decoded == result {
                break;
            }
            result = decoded;
        }
        result
    }

    fn decode_entities_once(&self, text: &str) -> String {
        let named = text
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&apos;", "'")
            .replace("&nbsp;", " ")
            .replace("&amp;", "&");

        self.entity_regex
            .replace_all(&named, |caps: &regex::Captures| {
                caps[1]
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Re-group sentences into paragraphs of N sentences.
    ///
    /// A sentence is a run of non-terminator characters ending in `.`, `!`,
    /// or `?`. Trailing text without a terminator becomes part of the last
    /// paragraph.
    fn paragraphs(&self, text: &str) -> String {
        let flat = text.replace('\n', " ");
        let mut sentences: Vec<String> = self
            .sentence_regex
            .find_iter(&flat)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Anything after the final terminator.
        let consumed: usize = self
            .sentence_regex
            .find_iter(&flat)
            .map(|m| m.end())
            .last()
            .unwrap_or(0);
        let trailing = flat[consumed..].trim();
        if !trailing.is_empty() {
            sentences.push(trailing.to_string());
        }

        if sentences.is_empty() {
            return String::new();
        }

        sentences
            .chunks(self.options.sentences_per_paragraph)
            .map(|group| group.join(" "))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(NormalizeOptions::default())
    }

    #[test]
    fn test_idempotent() {
        let n = normalizer();
        let input = "Um, this is uh a test. It has &amp;amp; entities.   And    spaces. \
                     Another sentence here! A fourth one. And a fifth begins.";
        let once = n.normalize(input);
        let twice = n.normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_decodes_double_encoded_entities() {
        let n = normalizer();
        assert_eq!(n.normalize("A &amp;amp; B."), "A & B.");
        assert_eq!(n.normalize("A &amp; B."), "A & B.");
        assert_eq!(n.normalize("&lt;tag&gt;."), "<tag>.");
        assert_eq!(n.normalize("it&#39;s fine."), "it's fine.");
    }

    #[test]
    fn test_filler_removal_respects_word_boundaries() {
        let n = normalizer();
        // "umbrella" contains "um", "Berlin" contains "er"; both survive.
        let out = n.normalize("Um, the umbrella in Berlin er stayed dry.");
        assert_eq!(out, "the umbrella in Berlin stayed dry.");
    }

    #[test]
    fn test_multiword_filler() {
        let n = normalizer();
        let out = n.normalize("So you know this works.");
        assert_eq!(out, "So this works.");
    }

    #[test]
    fn test_collapses_whitespace() {
        let n = Normalizer::new(NormalizeOptions {
            add_paragraphs: false,
            ..Default::default()
        });
        assert_eq!(n.normalize("a   b\n\t c."), "a b c.");
    }

    #[test]
    fn test_paragraph_grouping() {
        let n = Normalizer::new(NormalizeOptions {
            remove_fillers: false,
            add_paragraphs: true,
            sentences_per_paragraph: 2,
            filler_words: vec![],
        });
        let out = n.normalize("One. Two! Three? Four. Five.");
        assert_eq!(out, "One. Two!\n\nThree? Four.\n\nFive.");
    }

    #[test]
    fn test_trailing_text_without_terminator_kept() {
        let n = Normalizer::new(NormalizeOptions {
            remove_fillers: false,
            add_paragraphs: true,
            sentences_per_paragraph: 2,
            filler_words: vec![],
        });
        let out = n.normalize("One. Two. And then");
        assert_eq!(out, "One. Two.\n\nAnd then");
    }

    #[test]
    fn test_empty_input() {
        let n = normalizer();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize("   "), "");
    }
}
