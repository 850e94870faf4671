//! Whisper audio-transcription fallback.
//!
//! Downloads the audio track to a scratch location and sends it to the
//! speech-to-text provider. The provider enforces a payload ceiling, so
//! oversize audio is a hard failure for this attempt; it is never
//! truncated. The scratch file is removed on both success and failure.

use super::audio::{download_audio, ensure_tool};
use super::{AcquiredTranscript, CaptionSegment};
use crate::error::{ArkivError, Result};
use crate::openai::create_client;
use crate::store::TranscriptSource;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Whisper-based acquisition fallback.
pub struct WhisperFallback {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    max_audio_bytes: u64,
}

impl WhisperFallback {
    pub fn new(model: &str, max_audio_bytes: u64) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            max_audio_bytes,
        }
    }

    /// Download a video's audio to a scratch directory and transcribe it.
    #[instrument(skip(self))]
    pub async fn transcribe_video(&self, video_id: &str) -> Result<AcquiredTranscript> {
        ensure_tool("yt-dlp")?;
        ensure_tool("ffmpeg")?;
        ensure_tool("ffprobe")?;

        let scratch = tempfile::tempdir()?;
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let audio_path = download_audio(&url, video_id, scratch.path()).await?;

        let result = self.transcribe_file(&audio_path).await;

        // The scratch file goes away whether or not transcription worked;
        // dropping the tempdir removes anything left behind.
        if let Err(e) = std::fs::remove_file(&audio_path) {
            warn!("Failed to remove scratch audio {:?}: {}", audio_path, e);
        }
        drop(scratch);

        result
    }

    /// Transcribe an audio file already on disk.
    ///
    /// Enforces the payload ceiling before contacting the provider.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    pub async fn transcribe_file(&self, audio_path: &Path) -> Result<AcquiredTranscript> {
        let size = tokio::fs::metadata(audio_path).await?.len();
        check_payload_size(size, self.max_audio_bytes)?;

        debug!("Transcribing {} byte audio file", size);

        let file_bytes = tokio::fs::read(audio_path).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .build()
            .map_err(|e| ArkivError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| ArkivError::OpenAI(format!("Whisper API error: {}", e)))?;

        // Parse segments from verbose JSON response
        let segments: Vec<CaptionSegment> = response
            .segments
            .map(|segs| {
                segs.iter()
                    .map(|s| {
                        CaptionSegment::new(
                            s.start as f64,
                            s.end as f64,
                            s.text.trim().to_string(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_else(|| {
                // Fallback: single segment from the full text
                vec![CaptionSegment::new(
                    0.0,
                    response.duration as f64,
                    response.text.trim().to_string(),
                )]
            });

        info!("Whisper produced {} segments", segments.len());
        Ok(AcquiredTranscript::from_segments(
            segments,
            TranscriptSource::WhisperFallback,
        ))
    }
}

/// Reject audio larger than the provider's payload ceiling.
fn check_payload_size(size: u64, ceiling: u64) -> Result<()> {
    if size > ceiling {
        return Err(ArkivError::PayloadTooLarge { size, ceiling });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_ceiling() {
        let ceiling = 24 * 1024 * 1024;
        assert!(check_payload_size(30 * 1024 * 1024, ceiling).is_err());
        assert!(check_payload_size(ceiling, ceiling).is_ok());
        assert!(check_payload_size(0, ceiling).is_ok());
    }

    #[tokio::test]
    async fn test_oversize_file_rejected_before_provider_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.mp3");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        // Ceiling below the file size: the provider is never contacted, so
        // no API key or network is needed for this to fail fast.
        let whisper = WhisperFallback::new("whisper-1", 32);
        let err = whisper.transcribe_file(&path).await.unwrap_err();
        assert!(matches!(
            err,
            ArkivError::PayloadTooLarge { size: 64, ceiling: 32 }
        ));

        // The input file is left alone by transcribe_file; cleanup is the
        // caller's job.
        assert!(path.exists());
    }
}
