//! Configuration settings for Arkiv.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub store: StoreSettings,
    pub youtube: YoutubeSettings,
    pub acquisition: AcquisitionSettings,
    pub normalize: NormalizeSettings,
    pub enrichment: EnrichmentSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub search: SearchSettings,
    pub ingest: IngestSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary files (downloaded audio).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.arkiv".to_string(),
            temp_dir: "/tmp/arkiv".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// SQLite store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path to the SQLite database.
    pub sqlite_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.arkiv/archive.db".to_string(),
        }
    }
}

/// YouTube Data API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct YoutubeSettings {
    /// API key for the YouTube Data API. Falls back to the
    /// YOUTUBE_API_KEY environment variable when unset.
    pub api_key: Option<String>,
}

impl YoutubeSettings {
    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("YOUTUBE_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Transcript acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionSettings {
    /// Preferred caption language.
    pub caption_language: String,
    /// Whisper model for the audio-transcription fallback.
    pub whisper_model: String,
    /// Payload ceiling for audio sent to the transcription provider, in bytes.
    pub max_audio_bytes: u64,
    /// Maximum video duration to process (in seconds).
    pub max_duration_seconds: u32,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            caption_language: "en".to_string(),
            whisper_model: "whisper-1".to_string(),
            max_audio_bytes: 24 * 1024 * 1024,
            max_duration_seconds: 14_400, // 4 hours
        }
    }
}

/// Text normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeSettings {
    /// Strip filler tokens ("um", "uh", ...).
    pub remove_fillers: bool,
    /// Re-group sentences into paragraphs.
    pub add_paragraphs: bool,
    /// Sentences per paragraph when re-paragraphing.
    pub sentences_per_paragraph: usize,
    /// Filler word list, matched on word boundaries.
    pub filler_words: Vec<String>,
}

impl Default for NormalizeSettings {
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

/// Enrichment (LLM cleaning/summary/tagging) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentSettings {
    /// Run enrichment at all. When false, the cleaned text falls back to
    /// the normalized raw text.
    pub enabled: bool,
    /// Chat model for cleaning, summary, and tagging.
    pub model: String,
    /// Character ceiling per cleaning call; longer text is split at
    /// sentence boundaries.
    pub clean_chunk_chars: usize,
    /// Character ceiling for the summary call input.
    pub summary_input_chars: usize,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4o-mini".to_string(),
            clean_chunk_chars: 8_000,
            summary_input_chars: 24_000,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Maximum concurrent embedding requests.
    pub max_concurrent: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            max_concurrent: 4,
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Target chunk size in characters.
    pub chunk_chars: usize,
    /// Overlap between consecutive chunks in characters. Must be smaller
    /// than `chunk_chars`.
    pub overlap_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_chars: 1_200,
            overlap_chars: 200,
        }
    }
}

/// Hybrid search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Minimum cosine similarity for semantic hits.
    pub min_similarity: f32,
    /// Result cap per strategy before merging.
    pub per_strategy_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_similarity: 0.3,
            per_strategy_limit: 20,
        }
    }
}

/// Channel ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Lookback window in days when the store holds no videos for a channel.
    pub lookback_days: i64,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self { lookback_days: 30 }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ArkivError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("arkiv")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.store.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.embedding.dimensions, 1536);
        assert_eq!(settings.acquisition.max_audio_bytes, 24 * 1024 * 1024);
        assert!(settings.chunking.overlap_chars < settings.chunking.chunk_chars);
    }

    #[test]
    fn test_roundtrip() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.enrichment.model, settings.enrichment.model);
    }
}
