//! Re-embed command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::ingest::Orchestrator;
use anyhow::Result;

/// Re-embed a video's stored transcript.
pub async fn run_reembed(video_id: &str, settings: Settings) -> Result<()> {
    preflight::check(preflight::Operation::Search)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Re-embedding {}...", video_id));
    let result = orchestrator.reembed_video(video_id).await;
    spinner.finish_and_clear();

    match result {
        Ok(stored) => {
            Output::success(&format!("Stored {} chunks for {}", stored, video_id));
        }
        Err(e) => {
            Output::error(&format!("Re-embedding failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
