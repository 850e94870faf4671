//! Hybrid retrieval over the archive.
//!
//! Runs tag, semantic, and lexical strategies concurrently and merges
//! their results in a fixed priority order. A strategy that errors
//! contributes an empty result set rather than aborting the search.

use crate::config::SearchSettings;
use crate::embed::Embedder;
use crate::error::Result;
use crate::store::{SqliteStore, Video};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Which strategy produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Tag,
    Semantic,
    Lexical,
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchSource::Tag => write!(f, "tag"),
            MatchSource::Semantic => write!(f, "semantic"),
            MatchSource::Lexical => write!(f, "lexical"),
        }
    }
}

/// One ranked search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub video: Video,
    /// Display snippet: the best-matching chunk for semantic hits.
    pub snippet: Option<String>,
    pub matched_by: MatchSource,
    /// Similarity score for semantic hits.
    pub score: Option<f32>,
}

/// Multi-strategy retrieval engine.
pub struct HybridSearchEngine {
    store: Arc<SqliteStore>,
    embedder: Arc<dyn Embedder>,
    min_similarity: f32,
    per_strategy_limit: usize,
}

impl HybridSearchEngine {
    pub fn new(
        store: Arc<SqliteStore>,
        embedder: Arc<dyn Embedder>,
        settings: &SearchSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            min_similarity: settings.min_similarity,
            per_strategy_limit: settings.per_strategy_limit,
        }
    }

    /// Search the archive, returning a deduplicated ranked list.
    ///
    /// Merge order is the fixed priority tag > semantic > lexical; the
    /// first occurrence of a video wins. For a fixed query and fixed store
    /// contents the ordering is deterministic.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let (tag_result, semantic_result, lexical_result) = tokio::join!(
            self.tag_strategy(query),
            self.semantic_strategy(query),
            self.lexical_strategy(query),
        );

        let tag_hits = tag_result.unwrap_or_else(|e| {
            warn!("Tag strategy failed: {}", e);
            Vec::new()
        });
        let semantic_hits = semantic_result.unwrap_or_else(|e| {
            warn!("Semantic strategy failed: {}", e);
            Vec::new()
        });
        let lexical_hits = lexical_result.unwrap_or_else(|e| {
            warn!("Lexical strategy failed: {}", e);
            Vec::new()
        });

        debug!(
            "Strategy hits: {} tag, {} semantic, {} lexical",
            tag_hits.len(),
            semantic_hits.len(),
            lexical_hits.len()
        );

        Ok(merge_hits(tag_hits, semantic_hits, lexical_hits, limit))
    }

    /// Exact/prefix match against canonical tag names.
    async fn tag_strategy(&self, query: &str) -> Result<Vec<SearchHit>> {
        let videos = self
            .store
            .videos_by_tag_prefix(query, self.per_strategy_limit)?;

        Ok(videos
            .into_iter()
            .map(|video| SearchHit {
                video,
                snippet: None,
                matched_by: MatchSource::Tag,
                score: None,
            })
            .collect())
    }

    /// Embed the query and group nearest chunks by video, keeping the
    /// best-matching chunk as the display snippet.
    async fn semantic_strategy(&self, query: &str) -> Result<Vec<SearchHit>> {
        let query_embedding = self.embedder.embed(query).await?;

        // Over-fetch chunks so grouping by video still fills the limit.
        let hits = self.store.nearest_chunks(
            &query_embedding,
            self.min_similarity,
            self.per_strategy_limit * 4,
        )?;

        let mut results: Vec<SearchHit> = Vec::new();
        for hit in hits {
            if results
                .iter()
                .any(|r| r.video.external_id == hit.chunk.video_external_id)
            {
                // Chunks arrive score-descending, so the first chunk per
                // video is its best match.
                continue;
            }

            let Some(video) = self.store.get_video(&hit.chunk.video_external_id)? else {
                continue;
            };

            results.push(SearchHit {
                video,
                snippet: Some(hit.chunk.content.clone()),
                matched_by: MatchSource::Semantic,
                score: Some(hit.score),
            });

            if results.len() >= self.per_strategy_limit {
                break;
            }
        }

        Ok(results)
    }

    /// Full-text search over transcript raw text, then substring matches
    /// over title/description for videos not already found.
    async fn lexical_strategy(&self, query: &str) -> Result<Vec<SearchHit>> {
        let mut videos = self.store.search_transcripts(query, self.per_strategy_limit)?;

        let title_matches = self
            .store
            .search_title_description(query, self.per_strategy_limit)?;
        for video in title_matches {
            if !videos.iter().any(|v| v.external_id == video.external_id) {
                videos.push(video);
            }
        }
        videos.truncate(self.per_strategy_limit);

        Ok(videos
            .into_iter()
            .map(|video| SearchHit {
                video,
                snippet: None,
                matched_by: MatchSource::Lexical,
                score: None,
            })
            .collect())
    }
}

/// Concatenate strategy results in fixed priority order (tag, semantic,
/// lexical), deduplicate by video identity keeping the first occurrence,
/// and truncate.
///
/// The priority order is a deliberate, documented tie-break rather than a
/// numeric relevance fusion.
fn merge_hits(
    tag: Vec<SearchHit>,
    semantic: Vec<SearchHit>,
    lexical: Vec<SearchHit>,
    limit: usize,
) -> Vec<SearchHit> {
    let mut merged: Vec<SearchHit> = Vec::new();

    for hit in tag.into_iter().chain(semantic).chain(lexical) {
        if merged
            .iter()
            .any(|m| m.video.external_id == hit.video.external_id)
        {
            continue;
        }
        merged.push(hit);
        if merged.len() >= limit {
            break;
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArkivError;
    use crate::store::{
        ProcessingStatus, StoredChunk, TranscriptSource, TranscriptUpsert, VideoMeta, VideoStatus,
    };
    use async_trait::async_trait;

    /// Deterministic embedder: "governance" maps onto the x axis,
    /// everything else onto y.
    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("governance") {
                Ok(vec![1.0, 0.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0, 0.0])
            }
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

    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(ArkivError::OpenAI("embedding service down".into()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(ArkivError::OpenAI("embedding service down".into()))
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn completed_video(store: &SqliteStore, id: &str, title: &str, raw_text: &str) {
        store
            .upsert_video(
                &VideoMeta {
                    external_id: id.to_string(),
                    title: title.to_string(),
                    description: Some(format!("{} description", title)),
                    published_at: Some(chrono::Utc::now()),
                    duration_seconds: Some(60),
                    view_count: Some(1),
                },
                None,
            )
            .unwrap();
        store.set_video_status(id, VideoStatus::Processing).unwrap();
        store
            .upsert_transcript(
                id,
                &TranscriptUpsert {
                    raw_text: raw_text.to_string(),
                    cleaned_text: Some(raw_text.to_string()),
                    summary: None,
                    source: Some(TranscriptSource::Captions),
                    processing_status: ProcessingStatus::Completed,
                    error_detail: None,
                },
            )
            .unwrap();
        store.set_video_status(id, VideoStatus::Completed).unwrap();
    }

    fn engine(store: Arc<SqliteStore>) -> HybridSearchEngine {
        HybridSearchEngine::new(
            store,
            Arc::new(FakeEmbedder),
            &SearchSettings {
                min_similarity: 0.3,
                per_strategy_limit: 20,
            },
        )
    }

    /// A tag match on V1 plus a semantic hit on V2 and no lexical hits
    /// yields [V1, V2].
    #[tokio::test]
    async fn test_governance_scenario() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        completed_video(&store, "v1", "Board Meeting", "minutes of the board meeting");
        store.link_tags("v1", &["governance".to_string()]).unwrap();

        completed_video(&store, "v2", "Policy Talk", "discussion of oversight policy");
        store
            .insert_chunks(&[StoredChunk::new(
                "v2".to_string(),
                0,
                "chunk about governance topics".to_string(),
                vec![0.95, 0.05, 0.0],
            )])
            .unwrap();

        let hits = engine(store).search("governance", 10).await.unwrap();

        let ids: Vec<&str> = hits.iter().map(|h| h.video.external_id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v2"]);
        assert_eq!(hits[0].matched_by, MatchSource::Tag);
        assert_eq!(hits[1].matched_by, MatchSource::Semantic);
        assert_eq!(
            hits[1].snippet.as_deref(),
            Some("chunk about governance topics")
        );
    }

    /// A video appearing in both the tag and semantic result sets shows up
    /// exactly once, positioned as if only the tag hit occurred.
    #[tokio::test]
    async fn test_merge_dedup_keeps_highest_priority() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        completed_video(&store, "v1", "Tagged and Embedded", "words");
        store.link_tags("v1", &["governance".to_string()]).unwrap();
        store
            .insert_chunks(&[StoredChunk::new(
                "v1".to_string(),
                0,
                "governance chunk".to_string(),
                vec![1.0, 0.0, 0.0],
            )])
            .unwrap();

        completed_video(&store, "v2", "Only Embedded", "words");
        store
            .insert_chunks(&[StoredChunk::new(
                "v2".to_string(),
                0,
                "another governance chunk".to_string(),
                vec![0.9, 0.1, 0.0],
            )])
            .unwrap();

        let hits = engine(store).search("governance", 10).await.unwrap();

        let v1_hits: Vec<_> = hits
            .iter()
            .filter(|h| h.video.external_id == "v1")
            .collect();
        assert_eq!(v1_hits.len(), 1);
        assert_eq!(v1_hits[0].matched_by, MatchSource::Tag);
        // v1 keeps its tag-priority position at the front.
        assert_eq!(hits[0].video.external_id, "v1");
    }

    #[tokio::test]
    async fn test_lexical_fallback_via_fts() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        completed_video(
            &store,
            "v1",
            "Untagged",
            "a transcript mentioning kubernetes networking",
        );

        let hits = engine(store).search("kubernetes", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched_by, MatchSource::Lexical);
    }

    #[tokio::test]
    async fn test_title_substring_match() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        completed_video(&store, "v1", "Kubernetes Deep Dive", "unrelated transcript words");

        let hits = engine(store).search("Kubernetes", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched_by, MatchSource::Lexical);
    }

    #[tokio::test]
    async fn test_failed_strategy_contributes_empty_set() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        completed_video(&store, "v1", "Tagged", "words");
        store.link_tags("v1", &["governance".to_string()]).unwrap();

        // The embedder is down: the semantic strategy fails, but tag and
        // lexical results still come back.
        let engine = HybridSearchEngine::new(
            store,
            Arc::new(BrokenEmbedder),
            &SearchSettings {
                min_similarity: 0.3,
                per_strategy_limit: 20,
            },
        );

        let hits = engine.search("governance", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched_by, MatchSource::Tag);
    }

    #[tokio::test]
    async fn test_deterministic_ordering() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        for i in 0..5 {
            let id = format!("v{}", i);
            completed_video(&store, &id, &format!("Video {}", i), "governance transcript");
            store.link_tags(&id, &["governance".to_string()]).unwrap();
        }

        let engine = engine(store);
        let first = engine.search("governance", 10).await.unwrap();
        let second = engine.search("governance", 10).await.unwrap();

        let ids = |hits: &[SearchHit]| {
            hits.iter()
                .map(|h| h.video.external_id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
    }

    #[tokio::test]
    async fn test_limit_truncates_after_merge() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        for i in 0..5 {
            let id = format!("v{}", i);
            completed_video(&store, &id, &format!("Video {}", i), "words about governance");
            store.link_tags(&id, &["governance".to_string()]).unwrap();
        }

        let hits = engine(store).search("governance", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_query_returns_nothing() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let hits = engine(store).search("   ", 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_merge_priority_order_is_fixed() {
        fn hit(id: &str, matched_by: MatchSource) -> SearchHit {
            SearchHit {
                video: Video {
                    id: 0,
                    external_id: id.to_string(),
                    channel_id: None,
                    title: id.to_string(),
                    description: None,
                    published_at: None,
                    duration_seconds: None,
                    view_count: None,
                    status: VideoStatus::Completed,
                    created_at: chrono::Utc::now(),
                    updated_at: chrono::Utc::now(),
                },
                snippet: None,
                matched_by,
                score: None,
            }
        }

        let merged = merge_hits(
            vec![hit("t1", MatchSource::Tag)],
            vec![hit("s1", MatchSource::Semantic), hit("t1", MatchSource::Semantic)],
            vec![hit("l1", MatchSource::Lexical), hit("s1", MatchSource::Lexical)],
            10,
        );

        let ids: Vec<&str> = merged.iter().map(|h| h.video.external_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "s1", "l1"]);
        assert_eq!(merged[0].matched_by, MatchSource::Tag);
        assert_eq!(merged[1].matched_by, MatchSource::Semantic);
    }
}
