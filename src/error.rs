//! Error types for Arkiv.

use thiserror::Error;

/// Library-level error type for Arkiv operations.
#[derive(Error, Debug)]
pub enum ArkivError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Video or channel absent upstream or in the store. Terminal; not
    /// retried automatically.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network/auth/rate-limit failure from an external service. The video
    /// stays retryable.
    #[error("Provider unavailable: {0}")]
    Provider(String),

    /// Audio exceeds the transcription payload ceiling. Terminal for the
    /// acquisition attempt; never truncated.
    #[error("Payload too large: {size} bytes exceeds ceiling of {ceiling} bytes")]
    PayloadTooLarge { size: u64, ceiling: u64 },

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Enrichment failed: {0}")]
    Enrichment(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ArkivError {
    /// Whether the failed video may be re-run manually.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ArkivError::NotFound(_) | ArkivError::InvalidInput(_))
    }
}

/// Result type alias for Arkiv operations.
pub type Result<T> = std::result::Result<T, ArkivError>;
