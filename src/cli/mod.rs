//! CLI module for Arkiv.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Arkiv - Video Transcript Archive
///
/// Ingests video transcripts, enriches them with LLM cleaning, summaries,
/// and tags, and serves hybrid (tag + semantic + lexical) search over the
/// archive.
#[derive(Parser, Debug)]
#[command(name = "arkiv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Ingest a single video by URL or id
    Ingest {
        /// YouTube URL or video id
        input: String,

        /// Skip LLM enrichment (store normalized raw text only)
        #[arg(long)]
        skip_enrichment: bool,
    },

    /// Ingest a channel's recent videos
    Channel {
        /// Channel id
        channel_id: String,

        /// Maximum number of videos to process this run
        #[arg(short, long)]
        limit: Option<usize>,

        /// Skip LLM enrichment for all videos
        #[arg(long)]
        skip_enrichment: bool,
    },

    /// Search the archive (tag + semantic + lexical)
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// List completed videos
    List {
        /// Maximum number of videos
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Offset into the listing
        #[arg(short, long, default_value = "0")]
        offset: usize,

        /// Filter by channel id
        #[arg(long)]
        channel: Option<String>,
    },

    /// Show one video with its transcript summary and tags
    Show {
        /// Video id
        video_id: String,
    },

    /// Submit a correction report for a video
    Report {
        /// Video id
        video_id: String,

        /// Report category (e.g. transcription, metadata)
        #[arg(short, long, default_value = "transcription")]
        category: String,

        /// Description of the problem
        description: String,

        /// Timestamp in seconds where the problem occurs
        #[arg(short, long)]
        timestamp: Option<f64>,
    },

    /// Re-embed a video's stored transcript (deletes and recreates chunks)
    Reembed {
        /// Video id
        video_id: String,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file
    Init,

    /// Show configuration file path
    Path,
}
