//! Error report submission command.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::SqliteStore;
use anyhow::Result;

/// Submit a correction report for a video.
pub fn run_report(
    video_id: &str,
    category: &str,
    description: &str,
    timestamp: Option<f64>,
    settings: Settings,
) -> Result<()> {
    let store = SqliteStore::new(&settings.sqlite_path())?;

    if store.get_video(video_id)?.is_none() {
        Output::warning(&format!(
            "Video {} is not in the archive; recording the report anyway.",
            video_id
        ));
    }

    let id = store.insert_error_report(video_id, category, description, timestamp)?;
    Output::success(&format!("Report #{} recorded for {}", id, video_id));

    Ok(())
}
