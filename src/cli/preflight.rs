//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::acquire::ensure_tool;
use crate::error::{ArkivError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion may need the full acquisition toolchain plus API keys.
    Ingest,
    /// Search needs the OpenAI key for query embedding.
    Search,
    /// Listing/lookup reads the store only.
    Read,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Ingest => {
            check_openai_key()?;
            ensure_tool("yt-dlp")?;
            ensure_tool("ffmpeg")?;
            ensure_tool("ffprobe")?;
        }
        Operation::Search => {
            check_openai_key()?;
        }
        Operation::Read => {
            // No external requirements
        }
    }
    Ok(())
}

/// Check that a YouTube Data API key is available from config or env.
pub fn check_youtube_key(settings: &crate::config::Settings) -> Result<()> {
    match settings.youtube.resolve_api_key() {
        Some(_) => Ok(()),
        None => Err(ArkivError::Config(
            "YouTube API key not configured. Set youtube.api_key or YOUTUBE_API_KEY.".to_string(),
        )),
    }
}

/// Check if the OpenAI API key is configured.
pub fn check_openai_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(ArkivError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(ArkivError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_has_no_requirements() {
        assert!(check(Operation::Read).is_ok());
    }
}
