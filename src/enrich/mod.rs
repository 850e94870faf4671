//! LLM enrichment: cleaning, summary, and tagging.
//!
//! Cleaning runs first; its output feeds the summary and tagging calls,
//! which run concurrently. No sub-step failure aborts the pipeline — the
//! result degrades to raw/partial text and empty summary/tags instead.

use crate::config::Prompts;
use crate::error::{ArkivError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Result of enriching a transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    /// Cleaned transcript text. Falls back to the input when cleaning fails.
    pub cleaned_text: String,
    /// 5-10 bullet point summary, when the call succeeded.
    pub summary: Option<String>,
    /// Lowercase topical tags. Empty on tagging failure or malformed output.
    pub tags: Vec<String>,
    /// Whether any sub-step failed and the result is partial.
    pub degraded: bool,
}

/// Trait for enrichment services.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Clean, summarize, and tag a raw transcript.
    async fn enrich(&self, raw_text: &str) -> Result<Enrichment>;
}

/// Chat-model enrichment implementation.
pub struct LlmEnricher {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    clean_chunk_chars: usize,
    summary_input_chars: usize,
    prompts: Prompts,
}

impl LlmEnricher {
    pub fn new(model: &str) -> Self {
        Self::with_config(model, 8_000, 24_000, Prompts::default())
    }

    pub fn with_config(
        model: &str,
        clean_chunk_chars: usize,
        summary_input_chars: usize,
        prompts: Prompts,
    ) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            clean_chunk_chars,
            summary_input_chars,
            prompts,
        }
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| ArkivError::Enrichment(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| ArkivError::Enrichment(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.3)
            .build()
            .map_err(|e| ArkivError::Enrichment(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ArkivError::OpenAI(format!("Chat completion failed: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| ArkivError::Enrichment("Empty response from LLM".to_string()))
    }

    fn render(&self, template: &str, text: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), text.to_string());
        self.prompts.render_with_custom(template, &vars)
    }

    /// Clean the transcript, splitting at the char ceiling when needed.
    async fn clean(&self, text: &str) -> Result<String> {
        let pieces = split_for_cleaning(text, self.clean_chunk_chars);
        debug!("Cleaning transcript in {} piece(s)", pieces.len());

        let mut cleaned = Vec::with_capacity(pieces.len());
        for piece in &pieces {
            let response = self
                .chat(
                    &self.prompts.cleaning.system,
                    &self.render(&self.prompts.cleaning.user, piece),
                )
                .await?;
            cleaned.push(response.trim().to_string());
        }

        Ok(cleaned.join("\n\n"))
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let truncated: String = text.chars().take(self.summary_input_chars).collect();
        let response = self
            .chat(
                &self.prompts.summary.system,
                &self.render(&self.prompts.summary.user, &truncated),
            )
            .await?;
        Ok(response.trim().to_string())
    }

    async fn tag(&self, text: &str) -> Result<Vec<String>> {
        let truncated: String = text.chars().take(self.summary_input_chars).collect();
        let response = self
            .chat(
                &self.prompts.tagging.system,
                &self.render(&self.prompts.tagging.user, &truncated),
            )
            .await?;
        Ok(parse_tags(&response))
    }
}

#[async_trait]
impl Enricher for LlmEnricher {
    #[instrument(skip(self, raw_text), fields(chars = raw_text.len()))]
    async fn enrich(&self, raw_text: &str) -> Result<Enrichment> {
        if raw_text.trim().is_empty() {
            return Ok(Enrichment {
                cleaned_text: String::new(),
                summary: None,
                tags: Vec::new(),
                degraded: false,
            });
        }

        let mut degraded = false;

        let cleaned_text = match self.clean(raw_text).await {
            Ok(cleaned) => cleaned,
            Err(e) => {
                warn!("Cleaning failed, keeping raw text: {}", e);
                degraded = true;
                raw_text.to_string()
            }
        };

        // Summary and tagging both read the cleaned text and have no
        // dependency on each other.
        let (summary_result, tags_result) =
            tokio::join!(self.summarize(&cleaned_text), self.tag(&cleaned_text));

        let summary = match summary_result {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("Summary failed: {}", e);
                degraded = true;
                None
            }
        };

        let tags = match tags_result {
            Ok(tags) => tags,
            Err(e) => {
                warn!("Tagging failed: {}", e);
                degraded = true;
                Vec::new()
            }
        };

        info!(
            "Enrichment complete ({} tags, summary: {}, degraded: {})",
            tags.len(),
            summary.is_some(),
            degraded
        );

        Ok(Enrichment {
            cleaned_text,
            summary,
            tags,
            degraded,
        })
    }
}

/// Split text at a char ceiling, preferring sentence boundaries.
///
/// Sentences longer than the ceiling are hard-split at the ceiling.
pub fn split_for_cleaning(text: &str, max_chars: usize) -> Vec<String> {
    assert!(max_chars > 0, "max_chars must be positive");

    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in sentences(text) {
        let sentence_len = sentence.chars().count();

        if current_len + sentence_len > max_chars && !current.is_empty() {
            pieces.push(current.trim().to_string());
            current = String::new();
            current_len = 0;
        }

        if sentence_len > max_chars {
            // A single run with no usable boundary: hard-split.
            let chars: Vec<char> = sentence.chars().collect();
            for window in chars.chunks(max_chars) {
                pieces.push(window.iter().collect::<String>().trim().to_string());
            }
            continue;
        }

        current.push_str(&sentence);
        current_len += sentence_len;
    }

    if !current.trim().is_empty() {
        pieces.push(current.trim().to_string());
    }

    pieces.retain(|p| !p.is_empty());
    pieces
}

/// Iterate sentence-ish pieces: runs ending in `.`, `!`, or `?` plus any
/// trailing remainder.
fn sentences(text: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            result.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        result.push(current);
    }

    result
}

/// Parse the tagging response defensively.
///
/// Malformed output yields an empty list; a parse failure never crosses
/// this boundary.
pub fn parse_tags(response: &str) -> Vec<String> {
    let json_start = response.find('[');
    let json_end = response.rfind(']');

    let json_str = match (json_start, json_end) {
        (Some(start), Some(end)) if end > start => &response[start..=end],
        _ => return Vec::new(),
    };

    let parsed: Vec<String> = match serde_json::from_str(json_str) {
        Ok(tags) => tags,
        Err(e) => {
            warn!("Malformed tag response, dropping tags: {}", e);
            return Vec::new();
        }
    };

    let mut tags: Vec<String> = parsed
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    tags.dedup();
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags_plain_array() {
        let tags = parse_tags(r#"["Rust", "async programming", "rust"]"#);
        assert_eq!(tags, vec!["rust", "async programming", "rust"]);
    }

    #[test]
    fn test_parse_tags_with_markdown_fence() {
        let response = "Here you go:\n```json\n[\"governance\", \"policy\"]\n```";
        assert_eq!(parse_tags(response), vec!["governance", "policy"]);
    }

    #[test]
    fn test_parse_tags_malformed_yields_empty() {
        assert!(parse_tags("I could not produce tags.").is_empty());
        assert!(parse_tags(r#"{"tags": "wrong shape"}"#).is_empty());
        assert!(parse_tags(r#"[1, 2, 3]"#).is_empty());
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn test_split_for_cleaning_short_text_untouched() {
        let pieces = split_for_cleaning("One sentence. Two.", 100);
        assert_eq!(pieces, vec!["One sentence. Two."]);
    }

    #[test]
    fn test_split_for_cleaning_respects_sentence_boundaries() {
        let text = "Aaaa aaaa. Bbbb bbbb. Cccc cccc.";
        let pieces = split_for_cleaning(text, 22);
        assert_eq!(pieces, vec!["Aaaa aaaa. Bbbb bbbb.", "Cccc cccc."]);
    }

    #[test]
    fn test_split_for_cleaning_hard_splits_giant_sentence() {
        let text = "a".repeat(25);
        let pieces = split_for_cleaning(&text, 10);
        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().all(|p| p.chars().count() <= 10));
    }

    #[test]
    fn test_sentences_keeps_trailing_fragment() {
        let s = sentences("One. Two! And then");
        assert_eq!(s, vec!["One.", " Two!", " And then"]);
    }
}
