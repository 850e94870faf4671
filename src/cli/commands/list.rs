//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::SqliteStore;
use anyhow::Result;

/// List completed videos, newest first.
pub fn run_list(
    limit: usize,
    offset: usize,
    channel: Option<&str>,
    settings: Settings,
) -> Result<()> {
    let store = SqliteStore::new(&settings.sqlite_path())?;
    let videos = store.list_completed_videos(limit, offset, channel)?;

    if videos.is_empty() {
        Output::info("No completed videos in the archive yet.");
        return Ok(());
    }

    Output::header(&format!("Videos ({})", videos.len()));
    for video in &videos {
        let published = video
            .published_at
            .map(|dt| dt.format("%Y-%m-%d").to_string());
        Output::video_line(
            &video.title,
            &video.external_id,
            published.as_deref(),
            video.duration_seconds,
        );
    }

    Ok(())
}
