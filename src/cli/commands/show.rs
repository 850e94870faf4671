//! Show command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::SqliteStore;
use anyhow::Result;

/// Show one video with its transcript summary, tags, and ingestion log.
pub fn run_show(video_id: &str, settings: Settings) -> Result<()> {
    let store = SqliteStore::new(&settings.sqlite_path())?;

    let Some(video) = store.get_video(video_id)? else {
        Output::error(&format!("Video not found: {}", video_id));
        return Ok(());
    };

    Output::header(&video.title);
    Output::kv("Video", &video.external_id);
    Output::kv("Status", video.status.as_str());
    if let Some(published) = video.published_at {
        Output::kv("Published", &published.format("%Y-%m-%d").to_string());
    }
    if let Some(duration) = video.duration_seconds {
        Output::kv("Duration", &format!("{}s", duration));
    }
    if let Some(views) = video.view_count {
        Output::kv("Views", &views.to_string());
    }

    let tags = store.tags_for_video(video_id)?;
    if !tags.is_empty() {
        Output::kv("Tags", &tags.join(", "));
    }

    if let Some(transcript) = store.get_transcript(video_id)? {
        if let Some(source) = transcript.source {
            Output::kv("Transcript source", source.as_str());
        }
        Output::kv("Transcript status", transcript.processing_status.as_str());
        if let Some(error) = &transcript.error_detail {
            Output::kv("Error", error);
        }
        if let Some(summary) = &transcript.summary {
            Output::header("Summary");
            println!("{}", summary);
        }
    }

    Output::kv("Chunks", &store.chunk_count(video_id)?.to_string());

    let logs = store.logs_for_video(video_id)?;
    if !logs.is_empty() {
        Output::header("Ingestion log");
        for entry in &logs {
            Output::list_item(&format!(
                "{} {} ({})",
                entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                entry.step,
                entry.outcome
            ));
        }
    }

    Ok(())
}
