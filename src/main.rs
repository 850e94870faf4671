//! Arkiv CLI entry point.

use anyhow::Result;
use arkiv::cli::{commands, Cli, Commands};
use arkiv::config::Settings;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("arkiv={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Ingest {
            input,
            skip_enrichment,
        } => {
            commands::run_ingest(input, *skip_enrichment, settings).await?;
        }

        Commands::Channel {
            channel_id,
            limit,
            skip_enrichment,
        } => {
            commands::run_channel(channel_id, *limit, *skip_enrichment, settings).await?;
        }

        Commands::Search { query, limit } => {
            commands::run_search(query, *limit, settings).await?;
        }

        Commands::List {
            limit,
            offset,
            channel,
        } => {
            commands::run_list(*limit, *offset, channel.as_deref(), settings)?;
        }

        Commands::Show { video_id } => {
            commands::run_show(video_id, settings)?;
        }

        Commands::Report {
            video_id,
            category,
            description,
            timestamp,
        } => {
            commands::run_report(video_id, category, description, *timestamp, settings)?;
        }

        Commands::Reembed { video_id } => {
            commands::run_reembed(video_id, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
