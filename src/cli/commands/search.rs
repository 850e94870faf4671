//! Search command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::embed::OpenAIEmbedder;
use crate::search::HybridSearchEngine;
use crate::store::SqliteStore;
use anyhow::Result;
use std::sync::Arc;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    preflight::check(preflight::Operation::Search)?;

    let store = Arc::new(SqliteStore::new(&settings.sqlite_path())?);
    let embedder = Arc::new(OpenAIEmbedder::with_config(
        &settings.embedding.model,
        settings.embedding.dimensions as usize,
    ));
    let engine = HybridSearchEngine::new(store, embedder, &settings.search);

    let spinner = Output::spinner("Searching...");
    let result = engine.search(query, limit).await;
    spinner.finish_and_clear();

    match result {
        Ok(hits) if hits.is_empty() => {
            Output::warning("No results found matching your query.");
        }
        Ok(hits) => {
            Output::success(&format!("Found {} results", hits.len()));
            for hit in &hits {
                Output::search_result(
                    &hit.video.title,
                    &hit.video.external_id,
                    &hit.matched_by.to_string(),
                    hit.snippet.as_deref(),
                );
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
