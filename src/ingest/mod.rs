//! Ingestion orchestration.
//!
//! Drives one video (or a whole channel) through acquisition, enrichment,
//! and embedding, persisting state after every step so a crash resumes
//! rather than restarts. The `completed` status check is the sole
//! idempotency guard; every write below it is an upsert.

use crate::acquire::{Acquirer, FallbackAcquirer};
use crate::config::{Prompts, Settings};
use crate::embed::{Embedder, EmbeddingWriter, OpenAIEmbedder};
use crate::enrich::{Enricher, Enrichment, LlmEnricher};
use crate::error::{ArkivError, Result};
use crate::store::{
    ProcessingStatus, SqliteStore, StepOutcome, TranscriptSource, TranscriptUpsert, VideoMeta,
    VideoStatus,
};
use crate::text::{NormalizeOptions, Normalizer};
use crate::youtube::{ChannelInfo, YoutubeClient};
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Options for ingesting a single video.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Skip LLM enrichment; the cleaned text falls back to the normalized
    /// raw text.
    pub skip_enrichment: bool,
}

/// Options for channel-level batch ingestion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelOptions {
    /// Ceiling on the number of videos processed this run.
    pub max_videos: Option<usize>,
    /// Passed through to each video.
    pub skip_enrichment: bool,
}

/// Result of processing one video.
#[derive(Debug)]
pub struct IngestReport {
    /// External video id.
    pub video_id: String,
    /// Video title.
    pub title: String,
    /// Chunks stored for this video.
    pub chunks_stored: usize,
    /// Whether processing was skipped (already completed).
    pub skipped: bool,
    /// Whether enrichment degraded to partial/raw output.
    pub degraded: bool,
    /// Which provider produced the transcript.
    pub source: Option<TranscriptSource>,
}

/// Result of a channel batch run.
#[derive(Debug, Default)]
pub struct ChannelReport {
    pub channel_id: String,
    pub channel_title: String,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// The main orchestrator for the ingestion pipeline.
pub struct Orchestrator {
    settings: Settings,
    store: Arc<SqliteStore>,
    youtube: Arc<YoutubeClient>,
    acquirer: Arc<dyn Acquirer>,
    enricher: Arc<dyn Enricher>,
    writer: EmbeddingWriter,
    normalizer: Normalizer,
}

impl Orchestrator {
    /// Create an orchestrator with the default component wiring.
    ///
    /// API key presence is a preflight concern; a missing key surfaces as a
    /// provider error on the first listing call.
    pub fn new(settings: Settings) -> Result<Self> {
        let api_key = settings.youtube.resolve_api_key().unwrap_or_default();

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let store = Arc::new(SqliteStore::new(&settings.sqlite_path())?);
        let youtube = Arc::new(YoutubeClient::new(&api_key));
        let acquirer: Arc<dyn Acquirer> = Arc::new(FallbackAcquirer::new(&settings));
        let enricher: Arc<dyn Enricher> = Arc::new(LlmEnricher::with_config(
            &settings.enrichment.model,
            settings.enrichment.clean_chunk_chars,
            settings.enrichment.summary_input_chars,
            prompts,
        ));
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        std::fs::create_dir_all(settings.temp_dir())?;

        Ok(Self::with_components(
            settings, store, youtube, acquirer, enricher, embedder,
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        store: Arc<SqliteStore>,
        youtube: Arc<YoutubeClient>,
        acquirer: Arc<dyn Acquirer>,
        enricher: Arc<dyn Enricher>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let writer = EmbeddingWriter::new(
            store.clone(),
            embedder,
            settings.chunking.chunk_chars,
            settings.chunking.overlap_chars,
            settings.embedding.max_concurrent,
        );
        let normalizer = Normalizer::new(NormalizeOptions::from(&settings.normalize));

        Self {
            settings,
            store,
            youtube,
            acquirer,
            enricher,
            writer,
            normalizer,
        }
    }

    /// Get a reference to the store.
    pub fn store(&self) -> Arc<SqliteStore> {
        self.store.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Ingest a single video from a URL or bare id.
    #[instrument(skip(self), fields(input = %input))]
    pub async fn ingest_video(&self, input: &str, options: IngestOptions) -> Result<IngestReport> {
        let video_id = self.youtube.extract_video_id(input).ok_or_else(|| {
            ArkivError::InvalidInput(format!("Could not parse video id from: {}", input))
        })?;

        // Completed videos short-circuit before any provider call.
        if self.store.video_status(&video_id)? == Some(VideoStatus::Completed) {
            info!("Video {} already completed, skipping", video_id);
            return Ok(IngestReport {
                video_id,
                title: "Already completed".to_string(),
                chunks_stored: 0,
                skipped: true,
                degraded: false,
                source: None,
            });
        }

        let meta = self.youtube.fetch_video(&video_id).await?;

        let channel = match self.youtube.fetch_video_channel(&video_id).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("Could not resolve channel for {}: {}", video_id, e);
                None
            }
        };

        self.ingest_with_meta(meta, channel.as_ref(), options).await
    }

    /// Ingest a video whose metadata is already known (single-video path
    /// after the metadata fetch, and the channel batch path).
    #[instrument(skip(self, meta, channel), fields(video_id = %meta.external_id))]
    pub async fn ingest_with_meta(
        &self,
        meta: VideoMeta,
        channel: Option<&ChannelInfo>,
        options: IngestOptions,
    ) -> Result<IngestReport> {
        let video_id = meta.external_id.clone();

        // Step 1: idempotency guard. Zero writes past this point for
        // completed videos.
        if self.store.video_status(&video_id)? == Some(VideoStatus::Completed) {
            info!("Video {} already completed, skipping", video_id);
            return Ok(IngestReport {
                video_id,
                title: meta.title,
                chunks_stored: 0,
                skipped: true,
                degraded: false,
                source: None,
            });
        }

        if let Some(duration) = meta.duration_seconds {
            if duration > self.settings.acquisition.max_duration_seconds {
                return Err(ArkivError::InvalidInput(format!(
                    "Video duration ({} seconds) exceeds maximum ({} seconds)",
                    duration, self.settings.acquisition.max_duration_seconds
                )));
            }
        }

        // Step 2: upsert rows and enter `processing`.
        let channel_row_id = match channel {
            Some(info) => Some(self.store.upsert_channel(&info.external_id, &info.title)?),
            None => None,
        };
        self.store.upsert_video(&meta, channel_row_id)?;
        self.store.set_video_status(&video_id, VideoStatus::Processing)?;
        self.store.append_log(
            &video_id,
            "metadata",
            StepOutcome::Succeeded,
            json!({ "title": meta.title }),
        )?;

        // A transcript row exists as soon as acquisition begins.
        self.store.upsert_transcript(
            &video_id,
            &TranscriptUpsert {
                raw_text: String::new(),
                cleaned_text: None,
                summary: None,
                source: None,
                processing_status: ProcessingStatus::Processing,
                error_detail: None,
            },
        )?;

        // Step 3: acquisition. Failure marks the video failed and stops.
        let acquired = match self.acquirer.acquire(&video_id).await {
            Ok(acquired) => {
                self.store.append_log(
                    &video_id,
                    "acquire",
                    StepOutcome::Succeeded,
                    json!({ "source": acquired.source.as_str(), "chars": acquired.text.len() }),
                )?;
                acquired
            }
            Err(e) => {
                self.store.append_log(
                    &video_id,
                    "acquire",
                    StepOutcome::Failed,
                    json!({ "error": e.to_string() }),
                )?;
                self.store.upsert_transcript(
                    &video_id,
                    &TranscriptUpsert {
                        raw_text: String::new(),
                        cleaned_text: None,
                        summary: None,
                        source: None,
                        processing_status: ProcessingStatus::Failed,
                        error_detail: Some(e.to_string()),
                    },
                )?;
                self.store.set_video_status(&video_id, VideoStatus::Failed)?;
                return Err(e);
            }
        };

        let normalized = self.normalizer.normalize(&acquired.text);
        self.store.append_log(
            &video_id,
            "normalize",
            StepOutcome::Succeeded,
            json!({ "chars": normalized.len() }),
        )?;

        // Step 4: enrichment. Failure degrades; it never fails the video.
        let enrichment = if options.skip_enrichment || !self.settings.enrichment.enabled {
            self.store.append_log(
                &video_id,
                "enrich",
                StepOutcome::Skipped,
                json!({ "reason": "disabled" }),
            )?;
            None
        } else {
            match self.enricher.enrich(&normalized).await {
                Ok(enrichment) => {
                    let outcome = if enrichment.degraded {
                        StepOutcome::Degraded
                    } else {
                        StepOutcome::Succeeded
                    };
                    self.store.append_log(
                        &video_id,
                        "enrich",
                        outcome,
                        json!({
                            "tags": enrichment.tags.len(),
                            "summary": enrichment.summary.is_some(),
                        }),
                    )?;
                    Some(enrichment)
                }
                Err(e) => {
                    warn!("Enrichment failed for {}, using raw text: {}", video_id, e);
                    self.store.append_log(
                        &video_id,
                        "enrich",
                        StepOutcome::Failed,
                        json!({ "error": e.to_string() }),
                    )?;
                    None
                }
            }
        };

        let degraded = enrichment.as_ref().map(|e| e.degraded).unwrap_or(false);
        let Enrichment {
            cleaned_text,
            summary,
            tags,
            ..
        } = enrichment.unwrap_or_else(|| Enrichment {
            cleaned_text: normalized.clone(),
            summary: None,
            tags: Vec::new(),
            degraded: false,
        });

        // Step 5: transcript upsert with the raw text kept verbatim.
        self.store.upsert_transcript(
            &video_id,
            &TranscriptUpsert {
                raw_text: acquired.text.clone(),
                cleaned_text: Some(cleaned_text.clone()),
                summary: summary.clone(),
                source: Some(acquired.source),
                processing_status: ProcessingStatus::Completed,
                error_detail: None,
            },
        )?;
        self.store.append_log(
            &video_id,
            "transcript",
            StepOutcome::Succeeded,
            json!({ "source": acquired.source.as_str() }),
        )?;

        // Step 6: tag upsert and linking, both repeat-safe.
        let linked = self.store.link_tags(&video_id, &tags)?;
        self.store.append_log(
            &video_id,
            "tags",
            StepOutcome::Succeeded,
            json!({ "linked": linked }),
        )?;

        // Embedding: a wholly failed pass fails the video; no content is
        // fine.
        let chunks_stored = match self.writer.embed_and_store(&video_id, &cleaned_text).await {
            Ok(outcome) => {
                let (step_outcome, detail) = if outcome.no_content {
                    (StepOutcome::Skipped, json!({ "reason": "no content" }))
                } else if outcome.skipped_existing {
                    (StepOutcome::Skipped, json!({ "reason": "chunks exist", "stored": outcome.stored }))
                } else {
                    (
                        StepOutcome::Succeeded,
                        json!({ "stored": outcome.stored, "failed": outcome.failed }),
                    )
                };
                self.store.append_log(&video_id, "embed", step_outcome, detail)?;
                outcome.stored
            }
            Err(e) => {
                self.store.append_log(
                    &video_id,
                    "embed",
                    StepOutcome::Failed,
                    json!({ "error": e.to_string() }),
                )?;
                self.store.set_video_status(&video_id, VideoStatus::Failed)?;
                return Err(e);
            }
        };

        // Step 7: done.
        self.store.set_video_status(&video_id, VideoStatus::Completed)?;
        self.store.append_log(
            &video_id,
            "complete",
            StepOutcome::Succeeded,
            json!({ "chunks": chunks_stored }),
        )?;

        info!(
            "Completed {} ({} chunks, source {})",
            video_id,
            chunks_stored,
            acquired.source
        );

        Ok(IngestReport {
            video_id,
            title: meta.title,
            chunks_stored,
            skipped: false,
            degraded,
            source: Some(acquired.source),
        })
    }

    /// Ingest a channel's recent videos sequentially.
    ///
    /// Lists videos published after the most recent publish timestamp in
    /// the store, or a lookback window when the channel is new, applying an
    /// optional processed-count ceiling. Per-video failures are logged and
    /// the batch continues.
    #[instrument(skip(self), fields(channel_id = %channel_id))]
    pub async fn ingest_channel(
        &self,
        channel_id: &str,
        options: ChannelOptions,
    ) -> Result<ChannelReport> {
        let info = self.youtube.fetch_channel(channel_id).await?;
        self.store.upsert_channel(&info.external_id, &info.title)?;

        let since = match self.store.latest_published_at(channel_id)? {
            Some(latest) => latest,
            None => Utc::now() - Duration::days(self.settings.ingest.lookback_days),
        };

        info!(
            "Listing videos for {} published after {}",
            info.title, since
        );
        let videos = self
            .youtube
            .list_videos_since(channel_id, since, options.max_videos)
            .await?;

        let mut report = ChannelReport {
            channel_id: info.external_id.clone(),
            channel_title: info.title.clone(),
            ..Default::default()
        };

        let ingest_options = IngestOptions {
            skip_enrichment: options.skip_enrichment,
        };

        for meta in videos {
            let video_id = meta.external_id.clone();
            match self.ingest_with_meta(meta, Some(&info), ingest_options).await {
                Ok(r) if r.skipped => report.skipped += 1,
                Ok(_) => report.processed += 1,
                Err(e) => {
                    warn!("Video {} failed: {}", video_id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Channel {} done: {} processed, {} skipped, {} failed",
            info.title, report.processed, report.skipped, report.failed
        );
        Ok(report)
    }

    /// Re-embed a video's stored transcript (deletes and recreates its
    /// chunks).
    #[instrument(skip(self))]
    pub async fn reembed_video(&self, video_id: &str) -> Result<usize> {
        let transcript = self.store.get_transcript(video_id)?.ok_or_else(|| {
            ArkivError::NotFound(format!("No stored transcript for {}", video_id))
        })?;

        let text = transcript
            .cleaned_text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(transcript.raw_text);

        let outcome = self.writer.reembed(video_id, &text).await?;
        self.store.append_log(
            video_id,
            "reembed",
            StepOutcome::Succeeded,
            json!({ "stored": outcome.stored, "failed": outcome.failed }),
        )?;
        Ok(outcome.stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::{AcquiredTranscript, CaptionSegment};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FakeAcquirer {
        fail: AtomicBool,
        source: TranscriptSource,
        text: String,
    }

    impl FakeAcquirer {
        fn ok(text: &str) -> Self {
            Self {
                fail: AtomicBool::new(false),
                source: TranscriptSource::Captions,
                text: text.to_string(),
            }
        }

        fn failing() -> Self {
            Self {
                fail: AtomicBool::new(true),
                source: TranscriptSource::Captions,
                text: String::new(),
            }
        }
    }

    #[async_trait]
    impl Acquirer for FakeAcquirer {
        async fn acquire(&self, video_id: &str) -> Result<AcquiredTranscript> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ArkivError::NotFound(format!("no transcript for {}", video_id)));
            }
            Ok(AcquiredTranscript {
                text: self.text.clone(),
                segments: vec![CaptionSegment::new(0.0, 5.0, self.text.clone())],
                source: self.source,
            })
        }
    }

    struct FakeEnricher {
        fail: bool,
    }

    #[async_trait]
    impl Enricher for FakeEnricher {
        async fn enrich(&self, raw_text: &str) -> Result<Enrichment> {
            if self.fail {
                return Err(ArkivError::OpenAI("model down".into()));
            }
            Ok(Enrichment {
                cleaned_text: format!("Cleaned: {}", raw_text),
                summary: Some("- point one\n- point two".to_string()),
                tags: vec!["Governance".to_string(), "testing".to_string()],
                degraded: false,
            })
        }
    }

    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn orchestrator_with(acquirer: Arc<dyn Acquirer>, enricher: FakeEnricher) -> Orchestrator {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        Orchestrator::with_components(
            Settings::default(),
            store,
            Arc::new(YoutubeClient::new("test-key")),
            acquirer,
            Arc::new(enricher),
            Arc::new(FakeEmbedder),
        )
    }

    fn orchestrator(acquirer: FakeAcquirer, enricher: FakeEnricher) -> Orchestrator {
        orchestrator_with(Arc::new(acquirer), enricher)
    }

    fn meta(id: &str) -> VideoMeta {
        VideoMeta {
            external_id: id.to_string(),
            title: format!("Video {}", id),
            description: Some("about things".to_string()),
            published_at: Some(Utc::now()),
            duration_seconds: Some(300),
            view_count: Some(42),
        }
    }

    #[tokio::test]
    async fn test_full_ingest_completes_video() {
        let orch = orchestrator(
            FakeAcquirer::ok("hello world. this is a transcript."),
            FakeEnricher { fail: false },
        );

        let report = orch
            .ingest_with_meta(meta("v1"), None, IngestOptions::default())
            .await
            .unwrap();

        assert!(!report.skipped);
        assert!(report.chunks_stored > 0);
        assert_eq!(report.source, Some(TranscriptSource::Captions));

        let store = orch.store();
        assert_eq!(store.video_status("v1").unwrap(), Some(VideoStatus::Completed));

        let transcript = store.get_transcript("v1").unwrap().unwrap();
        assert_eq!(transcript.processing_status, ProcessingStatus::Completed);
        assert_eq!(transcript.raw_text, "hello world. this is a transcript.");
        assert!(transcript.cleaned_text.unwrap().starts_with("Cleaned:"));
        assert!(transcript.summary.is_some());

        let tags = store.tags_for_video("v1").unwrap();
        assert_eq!(tags, vec!["governance".to_string(), "testing".to_string()]);
    }

    #[tokio::test]
    async fn test_completed_video_short_circuits_with_zero_writes() {
        let orch = orchestrator(
            FakeAcquirer::ok("some transcript text here."),
            FakeEnricher { fail: false },
        );

        orch.ingest_with_meta(meta("v1"), None, IngestOptions::default())
            .await
            .unwrap();

        let store = orch.store();
        let logs_before = store.logs_for_video("v1").unwrap().len();
        let video_before = store.get_video("v1").unwrap().unwrap();

        let second = orch
            .ingest_with_meta(meta("v1"), None, IngestOptions::default())
            .await
            .unwrap();

        assert!(second.skipped);
        assert_eq!(store.logs_for_video("v1").unwrap().len(), logs_before);
        let video_after = store.get_video("v1").unwrap().unwrap();
        assert_eq!(video_after.updated_at, video_before.updated_at);
    }

    #[tokio::test]
    async fn test_acquisition_failure_marks_video_failed() {
        let orch = orchestrator(FakeAcquirer::failing(), FakeEnricher { fail: false });

        let err = orch
            .ingest_with_meta(meta("v1"), None, IngestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ArkivError::NotFound(_)));

        let store = orch.store();
        assert_eq!(store.video_status("v1").unwrap(), Some(VideoStatus::Failed));

        let transcript = store.get_transcript("v1").unwrap().unwrap();
        assert_eq!(transcript.processing_status, ProcessingStatus::Failed);
        assert!(transcript.error_detail.is_some());

        let logs = store.logs_for_video("v1").unwrap();
        let acquire_log = logs.iter().find(|l| l.step == "acquire").unwrap();
        assert_eq!(acquire_log.outcome, StepOutcome::Failed);

        // Failed videos are absent from public listings.
        assert!(store.list_completed_videos(10, 0, None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enrichment_failure_degrades_not_fails() {
        let orch = orchestrator(
            FakeAcquirer::ok("raw words. more raw words."),
            FakeEnricher { fail: true },
        );

        let report = orch
            .ingest_with_meta(meta("v1"), None, IngestOptions::default())
            .await
            .unwrap();
        assert!(!report.skipped);

        let store = orch.store();
        assert_eq!(store.video_status("v1").unwrap(), Some(VideoStatus::Completed));

        let transcript = store.get_transcript("v1").unwrap().unwrap();
        // Falls back to the normalized raw text with no summary or tags.
        assert_eq!(transcript.cleaned_text.unwrap(), "raw words. more raw words.");
        assert!(transcript.summary.is_none());
        assert!(store.tags_for_video("v1").unwrap().is_empty());

        let logs = store.logs_for_video("v1").unwrap();
        let enrich_log = logs.iter().find(|l| l.step == "enrich").unwrap();
        assert_eq!(enrich_log.outcome, StepOutcome::Failed);
    }

    #[tokio::test]
    async fn test_skip_enrichment_option() {
        let orch = orchestrator(
            FakeAcquirer::ok("plain text. kept as is."),
            FakeEnricher { fail: false },
        );

        orch.ingest_with_meta(
            meta("v1"),
            None,
            IngestOptions {
                skip_enrichment: true,
            },
        )
        .await
        .unwrap();

        let store = orch.store();
        let transcript = store.get_transcript("v1").unwrap().unwrap();
        assert_eq!(transcript.cleaned_text.unwrap(), "plain text. kept as is.");
        assert!(transcript.summary.is_none());
        assert!(store.tags_for_video("v1").unwrap().is_empty());
        assert_eq!(store.video_status("v1").unwrap(), Some(VideoStatus::Completed));
    }

    #[tokio::test]
    async fn test_failed_video_is_retryable() {
        let acquirer = Arc::new(FakeAcquirer {
            fail: AtomicBool::new(true),
            source: TranscriptSource::Captions,
            text: "recovered transcript text.".to_string(),
        });
        let orch = orchestrator_with(acquirer.clone(), FakeEnricher { fail: false });

        let _ = orch
            .ingest_with_meta(meta("v1"), None, IngestOptions::default())
            .await;
        assert_eq!(
            orch.store().video_status("v1").unwrap(),
            Some(VideoStatus::Failed)
        );

        // Manual retry: failed -> processing is a legal transition, and the
        // second run completes.
        acquirer.fail.store(false, Ordering::SeqCst);

        let report = orch
            .ingest_with_meta(meta("v1"), None, IngestOptions::default())
            .await
            .unwrap();
        assert!(!report.skipped);
        assert_eq!(
            orch.store().video_status("v1").unwrap(),
            Some(VideoStatus::Completed)
        );
    }

    #[tokio::test]
    async fn test_empty_transcript_completes_without_chunks() {
        // Whitespace-only acquisition text: no content to embed is a
        // non-fatal outcome.
        let orch = orchestrator(FakeAcquirer::ok("   "), FakeEnricher { fail: true });

        let report = orch
            .ingest_with_meta(meta("v1"), None, IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(report.chunks_stored, 0);

        let store = orch.store();
        assert_eq!(store.video_status("v1").unwrap(), Some(VideoStatus::Completed));
        let logs = store.logs_for_video("v1").unwrap();
        let embed_log = logs.iter().find(|l| l.step == "embed").unwrap();
        assert_eq!(embed_log.outcome, StepOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_channel_link_recorded() {
        let orch = orchestrator(
            FakeAcquirer::ok("channel video text."),
            FakeEnricher { fail: false },
        );

        let channel = ChannelInfo {
            external_id: "UC123".to_string(),
            title: "A Channel".to_string(),
        };
        orch.ingest_with_meta(meta("v1"), Some(&channel), IngestOptions::default())
            .await
            .unwrap();

        let store = orch.store();
        assert!(store.get_channel("UC123").unwrap().is_some());
        let listed = store.list_completed_videos(10, 0, Some("UC123")).unwrap();
        assert_eq!(listed.len(), 1);
    }
}
