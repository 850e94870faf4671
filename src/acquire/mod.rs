//! Transcript acquisition.
//!
//! Obtains transcript text for a video through an ordered fallback of
//! providers: caption fetch, subtitle extraction, then audio download with
//! speech-to-text. The first step that yields text wins.

mod audio;
mod captions;
mod whisper;

pub use audio::{download_audio, ensure_tool, extract_subtitles};
pub use captions::{parse_json3, CaptionClient};
pub use whisper::WhisperFallback;

use crate::config::Settings;
use crate::error::{ArkivError, Result};
use crate::store::TranscriptSource;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

/// A timed caption segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Segment text.
    pub text: String,
}

impl CaptionSegment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: String) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text,
        }
    }
}

/// The result of a successful acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquiredTranscript {
    /// Full transcript text (space-joined segments).
    pub text: String,
    /// Timed segments, when the provider supplied them.
    pub segments: Vec<CaptionSegment>,
    /// Which provider produced the text.
    pub source: TranscriptSource,
}

impl AcquiredTranscript {
    /// Build a transcript from segments, space-joining their text.
    pub fn from_segments(segments: Vec<CaptionSegment>, source: TranscriptSource) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            text,
            segments,
            source,
        }
    }
}

/// Trait for transcript acquisition services.
#[async_trait]
pub trait Acquirer: Send + Sync {
    /// Obtain a transcript for a video, or `NotFound` when no provider has
    /// one. Callers must not synthesize placeholder content on failure.
    async fn acquire(&self, video_id: &str) -> Result<AcquiredTranscript>;
}

/// One provider in the fallback chain.
#[async_trait]
pub trait AcquisitionStep: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Attempt acquisition. `Ok(None)` is a normal miss (provider has no
    /// transcript); `Err` is a failed attempt. Both move on to the next
    /// step.
    async fn attempt(&self, video_id: &str) -> Result<Option<AcquiredTranscript>>;
}

/// Ordered fallback across acquisition providers, short-circuiting on the
/// first success.
pub struct FallbackAcquirer {
    steps: Vec<Box<dyn AcquisitionStep>>,
}

impl FallbackAcquirer {
    /// Build the standard chain: captions, subtitle extractor, Whisper.
    pub fn new(settings: &Settings) -> Self {
        let temp_dir = settings.temp_dir();
        let language = settings.acquisition.caption_language.clone();

        Self {
            steps: vec![
                Box::new(CaptionFetchStep {
                    client: CaptionClient::new(&language),
                }),
                Box::new(SubtitleExtractStep {
                    temp_dir,
                    language,
                }),
                Box::new(WhisperStep {
                    whisper: WhisperFallback::new(
                        &settings.acquisition.whisper_model,
                        settings.acquisition.max_audio_bytes,
                    ),
                }),
            ],
        }
    }

    /// Build a chain from explicit steps (useful for testing).
    pub fn with_steps(steps: Vec<Box<dyn AcquisitionStep>>) -> Self {
        Self { steps }
    }
}

#[async_trait]
impl Acquirer for FallbackAcquirer {
    #[instrument(skip(self))]
    async fn acquire(&self, video_id: &str) -> Result<AcquiredTranscript> {
        for step in &self.steps {
            match step.attempt(video_id).await {
                Ok(Some(transcript)) if !transcript.text.trim().is_empty() => {
                    info!(
                        "Acquired transcript for {} via {} ({} chars)",
                        video_id,
                        step.name(),
                        transcript.text.len()
                    );
                    return Ok(transcript);
                }
                Ok(_) => {
                    debug!("No transcript from {} for {}", step.name(), video_id);
                }
                Err(e) => {
                    warn!("Acquisition step {} failed for {}: {}", step.name(), video_id, e);
                }
            }
        }

        Err(ArkivError::NotFound(format!(
            "No provider produced a transcript for {}",
            video_id
        )))
    }
}

/// Step 1: fetch published captions.
struct CaptionFetchStep {
    client: CaptionClient,
}

#[async_trait]
impl AcquisitionStep for CaptionFetchStep {
    fn name(&self) -> &'static str {
        "captions"
    }

    async fn attempt(&self, video_id: &str) -> Result<Option<AcquiredTranscript>> {
        let segments = self.client.fetch(video_id).await?;
        if segments.is_empty() {
            return Ok(None);
        }
        Ok(Some(AcquiredTranscript::from_segments(
            segments,
            TranscriptSource::Captions,
        )))
    }
}

/// Step 2: extract (auto-generated) subtitles with yt-dlp.
struct SubtitleExtractStep {
    temp_dir: PathBuf,
    language: String,
}

#[async_trait]
impl AcquisitionStep for SubtitleExtractStep {
    fn name(&self) -> &'static str {
        "extractor"
    }

    async fn attempt(&self, video_id: &str) -> Result<Option<AcquiredTranscript>> {
        let body = match extract_subtitles(video_id, &self.language, &self.temp_dir).await? {
            Some(body) => body,
            None => return Ok(None),
        };

        let segments = parse_json3(&body)?;
        if segments.is_empty() {
            return Ok(None);
        }
        Ok(Some(AcquiredTranscript::from_segments(
            segments,
            TranscriptSource::Extractor,
        )))
    }
}

/// Step 3: download the audio track and transcribe it.
struct WhisperStep {
    whisper: WhisperFallback,
}

#[async_trait]
impl AcquisitionStep for WhisperStep {
    fn name(&self) -> &'static str {
        "whisper-fallback"
    }

    async fn attempt(&self, video_id: &str) -> Result<Option<AcquiredTranscript>> {
        self.whisper.transcribe_video(video_id).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStep {
        name: &'static str,
        result: fn() -> Result<Option<AcquiredTranscript>>,
    }

    #[async_trait]
    impl AcquisitionStep for FixedStep {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn attempt(&self, _video_id: &str) -> Result<Option<AcquiredTranscript>> {
            (self.result)()
        }
    }

    fn hit(source: TranscriptSource) -> Result<Option<AcquiredTranscript>> {
        Ok(Some(AcquiredTranscript::from_segments(
            vec![CaptionSegment::new(0.0, 1.0, "some words".to_string())],
            source,
        )))
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let acquirer = FallbackAcquirer::with_steps(vec![
            Box::new(FixedStep {
                name: "captions",
                result: || hit(TranscriptSource::Captions),
            }),
            Box::new(FixedStep {
                name: "extractor",
                result: || panic!("later step must not run"),
            }),
        ]);

        let result = acquirer.acquire("v1").await.unwrap();
        assert_eq!(result.source, TranscriptSource::Captions);
    }

    #[tokio::test]
    async fn test_primary_miss_falls_back_with_fallback_tag() {
        let acquirer = FallbackAcquirer::with_steps(vec![
            Box::new(FixedStep {
                name: "captions",
                result: || Ok(None),
            }),
            Box::new(FixedStep {
                name: "whisper-fallback",
                result: || hit(TranscriptSource::WhisperFallback),
            }),
        ]);

        let result = acquirer.acquire("v1").await.unwrap();
        assert_eq!(result.source, TranscriptSource::WhisperFallback);
    }

    #[tokio::test]
    async fn test_step_error_continues_chain() {
        let acquirer = FallbackAcquirer::with_steps(vec![
            Box::new(FixedStep {
                name: "captions",
                result: || Err(ArkivError::Provider("rate limited".into())),
            }),
            Box::new(FixedStep {
                name: "extractor",
                result: || hit(TranscriptSource::Extractor),
            }),
        ]);

        let result = acquirer.acquire("v1").await.unwrap();
        assert_eq!(result.source, TranscriptSource::Extractor);
    }

    #[tokio::test]
    async fn test_all_steps_fail_is_not_found() {
        let acquirer = FallbackAcquirer::with_steps(vec![
            Box::new(FixedStep {
                name: "captions",
                result: || Ok(None),
            }),
            Box::new(FixedStep {
                name: "whisper-fallback",
                result: || Err(ArkivError::Provider("down".into())),
            }),
        ]);

        let err = acquirer.acquire("v1").await.unwrap_err();
        assert!(matches!(err, ArkivError::NotFound(_)));
    }

    #[test]
    fn test_from_segments_joins_text() {
        let t = AcquiredTranscript::from_segments(
            vec![
                CaptionSegment::new(0.0, 2.0, " hello ".to_string()),
                CaptionSegment::new(2.0, 4.0, "world".to_string()),
                CaptionSegment::new(4.0, 5.0, "  ".to_string()),
            ],
            TranscriptSource::Captions,
        );
        assert_eq!(t.text, "hello world");
        assert_eq!(t.segments.len(), 3);
    }
}
