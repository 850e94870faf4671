//! Ingest command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::ingest::{IngestOptions, Orchestrator};
use anyhow::Result;

/// Run the ingest command for a single video.
pub async fn run_ingest(input: &str, skip_enrichment: bool, settings: Settings) -> Result<()> {
    preflight::check(preflight::Operation::Ingest)?;
    preflight::check_youtube_key(&settings)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Ingesting {}...", input));
    let result = orchestrator
        .ingest_video(input, IngestOptions { skip_enrichment })
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(report) if report.skipped => {
            Output::info(&format!("{} is already completed, skipped", report.video_id));
        }
        Ok(report) => {
            Output::success(&format!("Ingested: {}", report.title));
            Output::kv("Video", &report.video_id);
            if let Some(source) = report.source {
                Output::kv("Source", source.as_str());
            }
            Output::kv("Chunks", &report.chunks_stored.to_string());
            if report.degraded {
                Output::warning("Enrichment was partial; raw text was kept where needed.");
            }
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
