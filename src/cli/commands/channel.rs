//! Channel batch ingestion command.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::ingest::{ChannelOptions, Orchestrator};
use anyhow::Result;

/// Run batch ingestion for a channel.
pub async fn run_channel(
    channel_id: &str,
    limit: Option<usize>,
    skip_enrichment: bool,
    settings: Settings,
) -> Result<()> {
    preflight::check(preflight::Operation::Ingest)?;
    preflight::check_youtube_key(&settings)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Processing channel {}...", channel_id));
    let result = orchestrator
        .ingest_channel(
            channel_id,
            ChannelOptions {
                max_videos: limit,
                skip_enrichment,
            },
        )
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            Output::success(&format!("Channel: {}", report.channel_title));
            Output::kv("Processed", &report.processed.to_string());
            Output::kv("Skipped", &report.skipped.to_string());
            Output::kv("Failed", &report.failed.to_string());
            if report.failed > 0 {
                Output::warning("Some videos failed; they stay retryable. See the ingestion log.");
            }
        }
        Err(e) => {
            Output::error(&format!("Channel ingestion failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
