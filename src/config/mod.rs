//! Configuration module for Arkiv.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{CleaningPrompts, Prompts, SummaryPrompts, TaggingPrompts};
pub use settings::{
    AcquisitionSettings, ChunkingSettings, EmbeddingSettings, EnrichmentSettings, GeneralSettings,
    IngestSettings, NormalizeSettings, PromptSettings, SearchSettings, Settings, StoreSettings,
    YoutubeSettings,
};
