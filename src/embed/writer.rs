//! Chunk embedding and persistence.
//!
//! Chunks enriched transcript text, requests one embedding per chunk, and
//! bulk-inserts chunk+vector rows. Idempotent: videos that already have
//! chunks are skipped rather than overwritten.

use super::Embedder;
use crate::error::{ArkivError, Result};
use crate::store::{SqliteStore, StoredChunk};
use crate::text;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of an embed-and-store pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedOutcome {
    /// Chunks stored with embeddings (or already present when skipped).
    pub stored: usize,
    /// Chunks whose embedding failed and were skipped.
    pub failed: usize,
    /// The video already had chunks; nothing was written.
    pub skipped_existing: bool,
    /// The text produced no chunks (empty transcript). Non-fatal.
    pub no_content: bool,
}

/// Writes embedded transcript chunks to the store.
pub struct EmbeddingWriter {
    store: Arc<SqliteStore>,
    embedder: Arc<dyn Embedder>,
    chunk_chars: usize,
    overlap_chars: usize,
    max_concurrent: usize,
}

impl EmbeddingWriter {
    pub fn new(
        store: Arc<SqliteStore>,
        embedder: Arc<dyn Embedder>,
        chunk_chars: usize,
        overlap_chars: usize,
        max_concurrent: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            chunk_chars,
            overlap_chars,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Chunk, embed, and store a video's transcript text.
    ///
    /// A failure embedding one chunk skips that chunk without aborting the
    /// rest, but a non-empty chunk list storing nothing is an error.
    #[instrument(skip(self, text), fields(video_id = %video_id, chars = text.len()))]
    pub async fn embed_and_store(&self, video_id: &str, text: &str) -> Result<EmbedOutcome> {
        let existing = self.store.chunk_count(video_id)?;
        if existing > 0 {
            info!("Video {} already has {} chunks, skipping", video_id, existing);
            return Ok(EmbedOutcome {
                stored: existing,
                failed: 0,
                skipped_existing: true,
                no_content: false,
            });
        }

        let spans = text::split(text, self.chunk_chars, self.overlap_chars);
        if spans.is_empty() {
            info!("Video {} has no content to embed", video_id);
            return Ok(EmbedOutcome {
                stored: 0,
                failed: 0,
                skipped_existing: false,
                no_content: true,
            });
        }

        let span_count = spans.len();
        let results: Vec<(usize, Result<Vec<f32>>)> = stream::iter(spans.iter().enumerate())
            .map(|(idx, span)| {
                let embedder = self.embedder.clone();
                let content = span.text.clone();
                async move { (idx, embedder.embed(&content).await) }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut chunks: Vec<StoredChunk> = Vec::with_capacity(span_count);
        let mut failed = 0usize;

        let mut sorted = results;
        sorted.sort_by_key(|(idx, _)| *idx);

        for (idx, result) in sorted {
            match result {
                Ok(embedding) => chunks.push(StoredChunk::new(
                    video_id.to_string(),
                    idx as i32,
                    spans[idx].text.clone(),
                    embedding,
                )),
                Err(e) => {
                    warn!("Embedding chunk {} of {} failed: {}", idx, video_id, e);
                    failed += 1;
                }
            }
        }

        if chunks.is_empty() {
            return Err(ArkivError::Embedding(format!(
                "All {} chunks failed to embed for {}",
                span_count, video_id
            )));
        }

        let stored = self.store.insert_chunks(&chunks)?;
        info!(
            "Stored {} of {} chunks for {} ({} failed)",
            stored, span_count, video_id, failed
        );

        Ok(EmbedOutcome {
            stored,
            failed,
            skipped_existing: false,
            no_content: false,
        })
    }

    /// Delete a video's chunks and rebuild them from the given text.
    #[instrument(skip(self, text), fields(video_id = %video_id))]
    pub async fn reembed(&self, video_id: &str, text: &str) -> Result<EmbedOutcome> {
        self.store.delete_chunks(video_id)?;
        self.embed_and_store(video_id, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{VideoMeta, VideoStatus};
    use async_trait::async_trait;

    /// Embedder that fails on any text containing the word "poison".
    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("poison") {
                return Err(ArkivError::OpenAI("simulated failure".to_string()));
            }
            Ok(vec![1.0, 0.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn store_with_video(id: &str) -> Arc<SqliteStore> {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store
            .upsert_video(
                &VideoMeta {
                    external_id: id.to_string(),
                    title: "Test".to_string(),
                    description: None,
                    published_at: None,
                    duration_seconds: None,
                    view_count: None,
                },
                None,
            )
            .unwrap();
        store.set_video_status(id, VideoStatus::Processing).unwrap();
        store
    }

    fn writer(store: Arc<SqliteStore>) -> EmbeddingWriter {
        EmbeddingWriter::new(store, Arc::new(FakeEmbedder), 100, 20, 2)
    }

    #[tokio::test]
    async fn test_empty_text_is_no_content() {
        let store = store_with_video("v1");
        let outcome = writer(store.clone()).embed_and_store("v1", "").await.unwrap();

        assert!(outcome.no_content);
        assert_eq!(outcome.stored, 0);
        assert_eq!(store.chunk_count("v1").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_chunks_stored_in_order() {
        let store = store_with_video("v1");
        let text = "sentence one here. ".repeat(30);
        let outcome = writer(store.clone()).embed_and_store("v1", &text).await.unwrap();

        assert!(outcome.stored > 1);
        assert_eq!(outcome.failed, 0);
        assert!(!outcome.skipped_existing);
        assert_eq!(store.chunk_count("v1").unwrap(), outcome.stored);
    }

    #[tokio::test]
    async fn test_idempotent_skip_when_chunks_exist() {
        let store = store_with_video("v1");
        let w = writer(store.clone());
        let text = "sentence one here. ".repeat(30);

        let first = w.embed_and_store("v1", &text).await.unwrap();
        let second = w.embed_and_store("v1", &text).await.unwrap();

        assert!(second.skipped_existing);
        assert_eq!(second.stored, first.stored);
        assert_eq!(store.chunk_count("v1").unwrap(), first.stored);
    }

    #[tokio::test]
    async fn test_reembed_replaces_chunks() {
        let store = store_with_video("v1");
        let w = writer(store.clone());
        let text = "sentence one here. ".repeat(30);

        let first = w.embed_and_store("v1", &text).await.unwrap();
        let again = w.reembed("v1", &text).await.unwrap();

        assert!(!again.skipped_existing);
        assert_eq!(again.stored, first.stored);
        assert_eq!(store.chunk_count("v1").unwrap(), first.stored);
    }

    #[tokio::test]
    async fn test_single_chunk_failure_skips_not_aborts() {
        let store = store_with_video("v1");
        let w = writer(store.clone());

        // Two windows: the second contains the poison token.
        let mut text = "good words only here. ".repeat(8);
        text.push_str(&"poison in this part. ".repeat(8));

        let outcome = w.embed_and_store("v1", &text).await.unwrap();
        assert!(outcome.failed > 0);
        assert!(outcome.stored > 0);
        assert_eq!(store.chunk_count("v1").unwrap(), outcome.stored);
    }

    #[tokio::test]
    async fn test_all_chunks_failing_is_an_error() {
        let store = store_with_video("v1");
        let w = writer(store.clone());
        let text = "poison everywhere. ".repeat(30);

        let err = w.embed_and_store("v1", &text).await.unwrap_err();
        assert!(matches!(err, ArkivError::Embedding(_)));
        assert_eq!(store.chunk_count("v1").unwrap(), 0);
    }
}
