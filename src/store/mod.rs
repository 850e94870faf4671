//! Relational store for the transcript archive.
//!
//! Data model types plus the SQLite implementation: keyed upserts, FTS5
//! lexical search, and a cosine nearest-neighbor primitive over stored
//! chunk embeddings.

mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Video processing status. The sole coordination signal for idempotent
/// re-runs: only videos not already `Completed` are re-processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Processing => "processing",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        }
    }

    /// Whether moving to `next` is a valid transition. Transitions only go
    /// forward, except `Failed -> Processing` on manual retry. Same-state
    /// writes are permitted so repeated upserts stay safe.
    pub fn can_transition_to(&self, next: VideoStatus) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (VideoStatus::Pending, VideoStatus::Processing)
                | (VideoStatus::Processing, VideoStatus::Completed)
                | (VideoStatus::Processing, VideoStatus::Failed)
                | (VideoStatus::Failed, VideoStatus::Processing)
        )
    }
}

impl std::str::FromStr for VideoStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VideoStatus::Pending),
            "processing" => Ok(VideoStatus::Processing),
            "completed" => Ok(VideoStatus::Completed),
            "failed" => Ok(VideoStatus::Failed),
            _ => Err(format!("Unknown video status: {}", s)),
        }
    }
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transcript processing status, tracked separately from the video status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ProcessingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProcessingStatus::Pending),
            "processing" => Ok(ProcessingStatus::Processing),
            "completed" => Ok(ProcessingStatus::Completed),
            "failed" => Ok(ProcessingStatus::Failed),
            _ => Err(format!("Unknown processing status: {}", s)),
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a transcript's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranscriptSource {
    Captions,
    Extractor,
    WhisperFallback,
}

impl TranscriptSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptSource::Captions => "captions",
            TranscriptSource::Extractor => "extractor",
            TranscriptSource::WhisperFallback => "whisper-fallback",
        }
    }
}

impl std::str::FromStr for TranscriptSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "captions" => Ok(TranscriptSource::Captions),
            "extractor" => Ok(TranscriptSource::Extractor),
            "whisper-fallback" => Ok(TranscriptSource::WhisperFallback),
            _ => Err(format!("Unknown transcript source: {}", s)),
        }
    }
}

impl std::fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An external content channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Video metadata used for upserts, as fetched from the listing provider.
#[derive(Debug, Clone)]
pub struct VideoMeta {
    pub external_id: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u32>,
    pub view_count: Option<u64>,
}

/// A stored video row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    pub external_id: String,
    pub channel_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u32>,
    pub view_count: Option<u64>,
    pub status: VideoStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transcript upsert payload.
#[derive(Debug, Clone)]
pub struct TranscriptUpsert {
    pub raw_text: String,
    pub cleaned_text: Option<String>,
    pub summary: Option<String>,
    pub source: Option<TranscriptSource>,
    pub processing_status: ProcessingStatus,
    pub error_detail: Option<String>,
}

/// A stored transcript row, one-to-one with its video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub video_external_id: String,
    pub raw_text: String,
    pub cleaned_text: Option<String>,
    pub summary: Option<String>,
    pub source: Option<TranscriptSource>,
    pub processing_status: ProcessingStatus,
    pub error_detail: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// An embedded span of a video's cleaned transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: Uuid,
    pub video_external_id: String,
    pub chunk_order: i32,
    pub content: String,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

impl StoredChunk {
    pub fn new(
        video_external_id: String,
        chunk_order: i32,
        content: String,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            video_external_id,
            chunk_order,
            content,
            embedding,
            created_at: Utc::now(),
        }
    }
}

/// A nearest-neighbor hit with its similarity score.
#[derive(Debug, Clone)]
pub struct ChunkHit {
    pub chunk: StoredChunk,
    pub score: f32,
}

/// Outcome recorded for one pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    Succeeded,
    Failed,
    Skipped,
    Degraded,
}

impl StepOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepOutcome::Succeeded => "succeeded",
            StepOutcome::Failed => "failed",
            StepOutcome::Skipped => "skipped",
            StepOutcome::Degraded => "degraded",
        }
    }
}

impl std::str::FromStr for StepOutcome {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "succeeded" => Ok(StepOutcome::Succeeded),
            "failed" => Ok(StepOutcome::Failed),
            "skipped" => Ok(StepOutcome::Skipped),
            "degraded" => Ok(StepOutcome::Degraded),
            _ => Err(format!("Unknown step outcome: {}", s)),
        }
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only audit record for one ingestion step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionLogEntry {
    pub id: i64,
    pub video_external_id: String,
    pub step: String,
    pub outcome: StepOutcome,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A user-submitted correction note for a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub id: i64,
    pub video_external_id: String,
    pub category: String,
    pub description: String,
    pub timestamp_seconds: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_status_transitions() {
        use VideoStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Processing));
        // Same-state writes stay legal for upsert repeats.
        assert!(Processing.can_transition_to(Processing));
        // No going backward from completed.
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn test_status_roundtrip() {
        for s in ["pending", "processing", "completed", "failed"] {
            let parsed: VideoStatus = s.parse().unwrap();
            assert_eq!(parsed.as_str(), s);
        }
        for s in ["captions", "extractor", "whisper-fallback"] {
            let parsed: TranscriptSource = s.parse().unwrap();
            assert_eq!(parsed.as_str(), s);
        }
    }
}
