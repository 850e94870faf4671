//! Arkiv - Video Transcript Archive
//!
//! A CLI tool and library for turning video channels into a searchable
//! transcript archive.
//!
//! # Overview
//!
//! Arkiv lets you:
//! - Acquire transcripts for videos through an ordered provider fallback
//!   (published captions, subtitle extraction, Whisper transcription)
//! - Enrich them with LLM cleaning, bullet summaries, and topical tags
//! - Embed transcript chunks for semantic retrieval
//! - Search the archive with hybrid tag + semantic + lexical retrieval
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `youtube` - Video-listing provider client
//! - `acquire` - Transcript acquisition fallback chain
//! - `text` - Normalization and chunking
//! - `enrich` - LLM cleaning, summary, and tagging
//! - `embed` - Embedding generation and chunk persistence
//! - `store` - SQLite archive store
//! - `ingest` - Pipeline orchestration
//! - `search` - Hybrid retrieval engine
//!
//! # Example
//!
//! ```rust,no_run
//! use arkiv::config::Settings;
//! use arkiv::ingest::{IngestOptions, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let report = orchestrator
//!         .ingest_video("dQw4w9WgXcQ", IngestOptions::default())
//!         .await?;
//!     println!("Stored {} chunks", report.chunks_stored);
//!
//!     Ok(())
//! }
//! ```

pub mod acquire;
pub mod cli;
pub mod config;
pub mod embed;
pub mod enrich;
pub mod error;
pub mod ingest;
pub mod openai;
pub mod search;
pub mod store;
pub mod text;
pub mod youtube;

pub use error::{ArkivError, Result};
