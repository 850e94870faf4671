//! Prompt templates for Arkiv.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub cleaning: CleaningPrompts,
    pub summary: SummaryPrompts,
    pub tagging: TaggingPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for transcript cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningPrompts {
    pub system: String,
    pub user: String,
}

impl Default for CleaningPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a transcript editor. You receive a portion of a raw video transcript and return the same content, cleaned.

Rules:
- Format the text into readable paragraphs
- Correct grammar, punctuation, and capitalization
- Preserve the meaning exactly; never add, remove, or reorder ideas
- Preserve names, places, and technical terms as spoken
- Return only the cleaned text, with no commentary"#
                .to_string(),

            user: r#"Clean the following transcript portion:

{{text}}"#
                .to_string(),
        }
    }
}

/// Prompts for summary generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You summarize video transcripts. Produce 5-10 bullet points covering the main topics and conclusions. Each bullet is one sentence. Return only the bullet list."#
                .to_string(),

            user: r#"Summarize this transcript:

{{text}}"#
                .to_string(),
        }
    }
}

/// Prompts for topical tagging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingPrompts {
    pub system: String,
    pub user: String,
}

impl Default for TaggingPrompts {
    fn default() -> Self {
        Self {
            system: r#"You assign topical tags to video transcripts. Return a JSON array of 5-10 lowercase tags, each 1-3 words, naming the subjects discussed. Return only the JSON array, nothing else.

Example: ["rust", "async programming", "error handling"]"#
                .to_string(),

            user: r#"Tag this transcript:

{{text}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let cleaning_path = custom_path.join("cleaning.toml");
            if cleaning_path.exists() {
                let content = std::fs::read_to_string(&cleaning_path)?;
                prompts.cleaning = toml::from_str(&content)?;
            }

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let tagging_path = custom_path.join("tagging.toml");
            if tagging_path.exists() {
                let content = std::fs::read_to_string(&tagging_path)?;
                prompts.tagging = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.cleaning.system.is_empty());
        assert!(!prompts.tagging.system.is_empty());
    }

    #[test]
    fn test_render_template() {
        let template = "Clean this: {{text}}";
        let mut vars = std::collections::HashMap::new();
        vars.insert("text".to_string(), "hello".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Clean this: hello");
    }
}
