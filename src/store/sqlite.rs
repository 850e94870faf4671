//! SQLite-backed archive store.
//!
//! Uses SQLite with FTS5 for lexical search and cosine similarity computed
//! in Rust for nearest-neighbor queries. For large archives, consider the
//! sqlite-vec extension or a dedicated vector database.

use super::{
    cosine_similarity, Channel, ChunkHit, ErrorReport, IngestionLogEntry, ProcessingStatus,
    StepOutcome, StoredChunk, TranscriptRecord, TranscriptSource, TranscriptUpsert, Video,
    VideoMeta, VideoStatus,
};
use crate::error::{ArkivError, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse::<$ty>()
                    .map_err(|e| FromSqlError::Other(e.into()))
            }
        }
    };
}

sql_text_enum!(VideoStatus);
sql_text_enum!(ProcessingStatus);
sql_text_enum!(TranscriptSource);
sql_text_enum!(StepOutcome);

/// SQLite-backed store for channels, videos, transcripts, tags, chunks,
/// logs, and error reports.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS channels (
    id INTEGER PRIMARY KEY,
    external_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS videos (
    id INTEGER PRIMARY KEY,
    external_id TEXT NOT NULL UNIQUE,
    channel_id INTEGER REFERENCES channels(id),
    title TEXT NOT NULL,
    description TEXT,
    published_at TEXT,
    duration_seconds INTEGER,
    view_count INTEGER,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_videos_status ON videos(status);
CREATE INDEX IF NOT EXISTS idx_videos_channel ON videos(channel_id);

CREATE TABLE IF NOT EXISTS transcripts (
    video_id INTEGER PRIMARY KEY REFERENCES videos(id),
    raw_text TEXT NOT NULL,
    cleaned_text TEXT,
    summary TEXT,
    source TEXT,
    processing_status TEXT NOT NULL DEFAULT 'pending',
    error_detail TEXT,
    updated_at TEXT NOT NULL
);

CREATE VIRTUAL TABLE IF NOT EXISTS transcripts_fts USING fts5(
    video_external_id UNINDEXED,
    raw_text
);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS video_tags (
    video_id INTEGER NOT NULL REFERENCES videos(id),
    tag_id INTEGER NOT NULL REFERENCES tags(id),
    PRIMARY KEY (video_id, tag_id)
);

CREATE TABLE IF NOT EXISTS transcript_chunks (
    id TEXT PRIMARY KEY,
    video_id INTEGER NOT NULL REFERENCES videos(id),
    chunk_order INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_video ON transcript_chunks(video_id);

CREATE TABLE IF NOT EXISTS ingestion_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    video_external_id TEXT NOT NULL,
    step TEXT NOT NULL,
    outcome TEXT NOT NULL,
    detail TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_logs_video ON ingestion_logs(video_external_id);

CREATE TABLE IF NOT EXISTS error_reports (
    id INTEGER PRIMARY KEY,
    video_external_id TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT NOT NULL,
    timestamp_seconds REAL,
    created_at TEXT NOT NULL
);
"#;

impl SqliteStore {
    /// Open (or create) a store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized archive store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ArkivError::Store(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn video_row_id(conn: &Connection, external_id: &str) -> Result<Option<i64>> {
        let id = conn
            .query_row(
                "SELECT id FROM videos WHERE external_id = ?1",
                params![external_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn require_video_row_id(conn: &Connection, external_id: &str) -> Result<i64> {
        Self::video_row_id(conn, external_id)?
            .ok_or_else(|| ArkivError::NotFound(format!("Video not in store: {}", external_id)))
    }

    // ========================================================================
    // Channels
    // ========================================================================

    /// Upsert a channel by external id, returning its row id.
    pub fn upsert_channel(&self, external_id: &str, title: &str) -> Result<i64> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO channels (external_id, title, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(external_id) DO UPDATE SET title = excluded.title
            "#,
            params![external_id, title, Utc::now().to_rfc3339()],
        )?;

        let id = conn.query_row(
            "SELECT id FROM channels WHERE external_id = ?1",
            params![external_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn get_channel(&self, external_id: &str) -> Result<Option<Channel>> {
        let conn = self.lock()?;

        let channel = conn
            .query_row(
                "SELECT id, external_id, title, created_at FROM channels WHERE external_id = ?1",
                params![external_id],
                |row| {
                    let created_at: String = row.get(3)?;
                    Ok(Channel {
                        id: row.get(0)?,
                        external_id: row.get(1)?,
                        title: row.get(2)?,
                        created_at: parse_datetime(&created_at),
                    })
                },
            )
            .optional()?;
        Ok(channel)
    }

    // ========================================================================
    // Videos
    // ========================================================================

    /// Upsert a video's metadata. The status column is untouched on
    /// conflict; new rows start at `pending`.
    pub fn upsert_video(&self, meta: &VideoMeta, channel_id: Option<i64>) -> Result<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO videos
            (external_id, channel_id, title, description, published_at,
             duration_seconds, view_count, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT(external_id) DO UPDATE SET
                channel_id = COALESCE(excluded.channel_id, videos.channel_id),
                title = excluded.title,
                description = excluded.description,
                published_at = excluded.published_at,
                duration_seconds = excluded.duration_seconds,
                view_count = excluded.view_count,
                updated_at = excluded.updated_at
            "#,
            params![
                meta.external_id,
                channel_id,
                meta.title,
                meta.description,
                meta.published_at.map(|dt| dt.to_rfc3339()),
                meta.duration_seconds,
                meta.view_count,
                VideoStatus::Pending,
                now,
            ],
        )?;

        debug!("Upserted video {}", meta.external_id);
        Ok(())
    }

    pub fn get_video(&self, external_id: &str) -> Result<Option<Video>> {
        let conn = self.lock()?;

        let video = conn
            .query_row(
                &format!("{} WHERE external_id = ?1", SELECT_VIDEO),
                params![external_id],
                video_from_row,
            )
            .optional()?;
        Ok(video)
    }

    pub fn video_status(&self, external_id: &str) -> Result<Option<VideoStatus>> {
        let conn = self.lock()?;

        let status = conn
            .query_row(
                "SELECT status FROM videos WHERE external_id = ?1",
                params![external_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(status)
    }

    /// Move a video to a new status, enforcing transition validity.
    pub fn set_video_status(&self, external_id: &str, next: VideoStatus) -> Result<()> {
        let conn = self.lock()?;

        let current: VideoStatus = conn
            .query_row(
                "SELECT status FROM videos WHERE external_id = ?1",
                params![external_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| ArkivError::NotFound(format!("Video not in store: {}", external_id)))?;

        if !current.can_transition_to(next) {
            return Err(ArkivError::Store(format!(
                "Invalid status transition for {}: {} -> {}",
                external_id, current, next
            )));
        }

        conn.execute(
            "UPDATE videos SET status = ?1, updated_at = ?2 WHERE external_id = ?3",
            params![next, Utc::now().to_rfc3339(), external_id],
        )?;

        debug!("Video {} status {} -> {}", external_id, current, next);
        Ok(())
    }

    /// List completed videos, newest first by publish date.
    pub fn list_completed_videos(
        &self,
        limit: usize,
        offset: usize,
        channel_external_id: Option<&str>,
    ) -> Result<Vec<Video>> {
        let conn = self.lock()?;

        let videos = match channel_external_id {
            Some(channel) => {
                let mut stmt = conn.prepare(&format!(
                    r#"{}
                    WHERE status = 'completed'
                      AND channel_id = (SELECT id FROM channels WHERE external_id = ?1)
                    ORDER BY published_at DESC
                    LIMIT ?2 OFFSET ?3
                    "#,
                    SELECT_VIDEO
                ))?;
                let rows = stmt.query_map(params![channel, limit, offset], video_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    r#"{}
                    WHERE status = 'completed'
                    ORDER BY published_at DESC
                    LIMIT ?1 OFFSET ?2
                    "#,
                    SELECT_VIDEO
                ))?;
                let rows = stmt.query_map(params![limit, offset], video_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        Ok(videos)
    }

    /// Most recent publish timestamp stored for a channel's videos.
    pub fn latest_published_at(&self, channel_external_id: &str) -> Result<Option<DateTime<Utc>>> {
        let conn = self.lock()?;

        let latest: Option<String> = conn.query_row(
            r#"
            SELECT MAX(published_at) FROM videos
            WHERE channel_id = (SELECT id FROM channels WHERE external_id = ?1)
            "#,
            params![channel_external_id],
            |row| row.get(0),
        )?;

        Ok(latest.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }))
    }

    // ========================================================================
    // Transcripts
    // ========================================================================

    /// Upsert the transcript row for a video and refresh its FTS entry.
    pub fn upsert_transcript(&self, external_id: &str, upsert: &TranscriptUpsert) -> Result<()> {
        let conn = self.lock()?;
        let video_id = Self::require_video_row_id(&conn, external_id)?;

        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO transcripts
            (video_id, raw_text, cleaned_text, summary, source,
             processing_status, error_detail, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(video_id) DO UPDATE SET
                raw_text = excluded.raw_text,
                cleaned_text = excluded.cleaned_text,
                summary = excluded.summary,
                source = excluded.source,
                processing_status = excluded.processing_status,
                error_detail = excluded.error_detail,
                updated_at = excluded.updated_at
            "#,
            params![
                video_id,
                upsert.raw_text,
                upsert.cleaned_text,
                upsert.summary,
                upsert.source,
                upsert.processing_status,
                upsert.error_detail,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.execute(
            "DELETE FROM transcripts_fts WHERE video_external_id = ?1",
            params![external_id],
        )?;
        tx.execute(
            "INSERT INTO transcripts_fts (video_external_id, raw_text) VALUES (?1, ?2)",
            params![external_id, upsert.raw_text],
        )?;

        tx.commit()?;
        debug!("Upserted transcript for {}", external_id);
        Ok(())
    }

    pub fn get_transcript(&self, external_id: &str) -> Result<Option<TranscriptRecord>> {
        let conn = self.lock()?;

        let record = conn
            .query_row(
                r#"
                SELECT v.external_id, t.raw_text, t.cleaned_text, t.summary,
                       t.source, t.processing_status, t.error_detail, t.updated_at
                FROM transcripts t
                JOIN videos v ON v.id = t.video_id
                WHERE v.external_id = ?1
                "#,
                params![external_id],
                |row| {
                    let updated_at: String = row.get(7)?;
                    Ok(TranscriptRecord {
                        video_external_id: row.get(0)?,
                        raw_text: row.get(1)?,
                        cleaned_text: row.get(2)?,
                        summary: row.get(3)?,
                        source: row.get(4)?,
                        processing_status: row.get(5)?,
                        error_detail: row.get(6)?,
                        updated_at: parse_datetime(&updated_at),
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    // ========================================================================
    // Tags
    // ========================================================================

    /// Upsert tags by canonical name and link them to a video. Safe to
    /// repeat: neither duplicate tag rows nor duplicate join rows are
    /// created. Returns the number of tags linked.
    pub fn link_tags(&self, external_id: &str, tags: &[String]) -> Result<usize> {
        let conn = self.lock()?;
        let video_id = Self::require_video_row_id(&conn, external_id)?;

        let tx = conn.unchecked_transaction()?;
        let mut linked = 0usize;

        for tag in tags {
            let name = tag.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }

            tx.execute(
                "INSERT INTO tags (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
                params![name],
            )?;
            let tag_id: i64 = tx.query_row(
                "SELECT id FROM tags WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO video_tags (video_id, tag_id) VALUES (?1, ?2)",
                params![video_id, tag_id],
            )?;
            linked += 1;
        }

        tx.commit()?;
        debug!("Linked {} tags to {}", linked, external_id);
        Ok(linked)
    }

    pub fn tags_for_video(&self, external_id: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT t.name FROM tags t
            JOIN video_tags vt ON vt.tag_id = t.id
            JOIN videos v ON v.id = vt.video_id
            WHERE v.external_id = ?1
            ORDER BY t.name
            "#,
        )?;

        let rows = stmt.query_map(params![external_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Completed videos linked to tags matching the query exactly or by
    /// prefix. Exact matches sort first.
    pub fn videos_by_tag_prefix(&self, query: &str, limit: usize) -> Result<Vec<Video>> {
        let name = query.trim().to_lowercase();
        if name.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            r#"
            {}
            WHERE status = 'completed' AND id IN (
                SELECT vt.video_id FROM video_tags vt
                JOIN tags t ON t.id = vt.tag_id
                WHERE t.name = ?1 OR t.name LIKE ?2
            )
            ORDER BY (SELECT COUNT(*) FROM video_tags vt2
                      JOIN tags t2 ON t2.id = vt2.tag_id
                      WHERE vt2.video_id = videos.id AND t2.name = ?1) DESC,
                     published_at DESC
            LIMIT ?3
            "#,
            SELECT_VIDEO
        ))?;

        let pattern = format!("{}%", like_escape(&name));
        let rows = stmt.query_map(params![name, pattern, limit], video_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ========================================================================
    // Chunks
    // ========================================================================

    pub fn chunk_count(&self, external_id: &str) -> Result<usize> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM transcript_chunks c
            JOIN videos v ON v.id = c.video_id
            WHERE v.external_id = ?1
            "#,
            params![external_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Bulk-insert chunk rows in one transaction.
    pub fn insert_chunks(&self, chunks: &[StoredChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for chunk in chunks {
            let video_id = Self::require_video_row_id(&tx, &chunk.video_external_id)?;
            let embedding_bytes = Self::embedding_to_bytes(&chunk.embedding);

            tx.execute(
                r#"
                INSERT OR REPLACE INTO transcript_chunks
                (id, video_id, chunk_order, content, embedding, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    chunk.id.to_string(),
                    video_id,
                    chunk.chunk_order,
                    chunk.content,
                    embedding_bytes,
                    chunk.created_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Inserted {} chunks", chunks.len());
        Ok(chunks.len())
    }

    /// Delete all chunks for a video (for re-embedding).
    pub fn delete_chunks(&self, external_id: &str) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn.execute(
            r#"
            DELETE FROM transcript_chunks
            WHERE video_id = (SELECT id FROM videos WHERE external_id = ?1)
            "#,
            params![external_id],
        )?;

        info!("Deleted {} chunks for video {}", deleted, external_id);
        Ok(deleted)
    }

    /// Nearest-neighbor query over stored chunk embeddings (cosine
    /// similarity), restricted to completed videos.
    #[instrument(skip(self, query_embedding))]
    pub fn nearest_chunks(
        &self,
        query_embedding: &[f32],
        min_score: f32,
        limit: usize,
    ) -> Result<Vec<ChunkHit>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT c.id, v.external_id, c.chunk_order, c.content, c.embedding, c.created_at
            FROM transcript_chunks c
            JOIN videos v ON v.id = c.video_id
            WHERE v.status = 'completed'
            "#,
        )?;

        let chunks = stmt.query_map([], |row| {
            let id_str: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(4)?;
            let created_at: String = row.get(5)?;

            Ok(StoredChunk {
                id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
                video_external_id: row.get(1)?,
                chunk_order: row.get(2)?,
                content: row.get(3)?,
                embedding: Self::bytes_to_embedding(&embedding_bytes),
                created_at: parse_datetime(&created_at),
            })
        })?;

        let mut hits: Vec<ChunkHit> = chunks
            .filter_map(|c| c.ok())
            .map(|chunk| {
                let score = cosine_similarity(query_embedding, &chunk.embedding);
                ChunkHit { chunk, score }
            })
            .filter(|h| h.score >= min_score)
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);

        debug!("Found {} chunk hits", hits.len());
        Ok(hits)
    }

    // ========================================================================
    // Lexical search
    // ========================================================================

    /// Full-text search over transcript raw text, ranked by the FTS5 bm25
    /// ordering. Completed videos only.
    pub fn search_transcripts(&self, query: &str, limit: usize) -> Result<Vec<Video>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT v.id, v.external_id, v.channel_id, v.title, v.description,
                   v.published_at, v.duration_seconds, v.view_count, v.status,
                   v.created_at, v.updated_at
            FROM transcripts_fts f
            JOIN videos v ON v.external_id = f.video_external_id
            WHERE transcripts_fts MATCH ?1 AND v.status = 'completed'
            ORDER BY rank
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![fts_quote(query), limit], video_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Simple substring match over title and description. Completed videos
    /// only, newest first.
    pub fn search_title_description(&self, query: &str, limit: usize) -> Result<Vec<Video>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            r#"
            {}
            WHERE status = 'completed'
              AND (title LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\')
            ORDER BY published_at DESC
            LIMIT ?2
            "#,
            SELECT_VIDEO
        ))?;

        let pattern = format!("%{}%", like_escape(query.trim()));
        let rows = stmt.query_map(params![pattern, limit], video_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ========================================================================
    // Ingestion log
    // ========================================================================

    /// Append one audit entry. The log is never mutated or deleted.
    pub fn append_log(
        &self,
        external_id: &str,
        step: &str,
        outcome: StepOutcome,
        detail: serde_json::Value,
    ) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO ingestion_logs (video_external_id, step, outcome, detail, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                external_id,
                step,
                outcome,
                detail.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn logs_for_video(&self, external_id: &str) -> Result<Vec<IngestionLogEntry>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, video_external_id, step, outcome, detail, created_at
            FROM ingestion_logs
            WHERE video_external_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map(params![external_id], |row| {
            let detail: String = row.get(4)?;
            let created_at: String = row.get(5)?;
            Ok(IngestionLogEntry {
                id: row.get(0)?,
                video_external_id: row.get(1)?,
                step: row.get(2)?,
                outcome: row.get(3)?,
                detail: serde_json::from_str(&detail).unwrap_or(serde_json::Value::Null),
                created_at: parse_datetime(&created_at),
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ========================================================================
    // Error reports
    // ========================================================================

    pub fn insert_error_report(
        &self,
        external_id: &str,
        category: &str,
        description: &str,
        timestamp_seconds: Option<f64>,
    ) -> Result<i64> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO error_reports
            (video_external_id, category, description, timestamp_seconds, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                external_id,
                category,
                description,
                timestamp_seconds,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn error_reports_for_video(&self, external_id: &str) -> Result<Vec<ErrorReport>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, video_external_id, category, description, timestamp_seconds, created_at
            FROM error_reports
            WHERE video_external_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map(params![external_id], |row| {
            let created_at: String = row.get(5)?;
            Ok(ErrorReport {
                id: row.get(0)?,
                video_external_id: row.get(1)?,
                category: row.get(2)?,
                description: row.get(3)?,
                timestamp_seconds: row.get(4)?,
                created_at: parse_datetime(&created_at),
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

const SELECT_VIDEO: &str = r#"
SELECT id, external_id, channel_id, title, description, published_at,
       duration_seconds, view_count, status, created_at, updated_at
FROM videos
"#;

fn video_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Video> {
    let published_at: Option<String> = row.get(5)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Video {
        id: row.get(0)?,
        external_id: row.get(1)?,
        channel_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        published_at: published_at.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }),
        duration_seconds: row.get(6)?,
        view_count: row.get(7)?,
        status: row.get(8)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Quote a user query for FTS5 MATCH so punctuation can't change the query
/// syntax.
fn fts_quote(query: &str) -> String {
    format!("\"{}\"", query.replace('"', " "))
}

/// Escape LIKE wildcards in user input.
fn like_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
