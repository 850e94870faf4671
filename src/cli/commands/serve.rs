//! HTTP API server for the excluded web layer.
//!
//! Exposes search, listing, single-video lookup, and error-report
//! submission over REST.

use crate::cli::Output;
use crate::config::Settings;
use crate::embed::OpenAIEmbedder;
use crate::search::HybridSearchEngine;
use crate::store::SqliteStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    store: Arc<SqliteStore>,
    engine: HybridSearchEngine,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let store = Arc::new(SqliteStore::new(&settings.sqlite_path())?);
    let embedder = Arc::new(OpenAIEmbedder::with_config(
        &settings.embedding.model,
        settings.embedding.dimensions as usize,
    ));
    let engine = HybridSearchEngine::new(store.clone(), embedder, &settings.search);

    let state = Arc::new(AppState { store, engine });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/search", get(search))
        .route("/videos", get(list_videos))
        .route("/videos/{video_id}", get(get_video))
        .route("/reports", post(submit_report))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Arkiv API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Search", "GET  /search?q=...&limit=10");
    Output::kv("List Videos", "GET  /videos");
    Output::kv("Get Video", "GET  /videos/:video_id");
    Output::kv("Submit Report", "POST /reports");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SearchParams {
    q: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Serialize)]
struct SearchResult {
    video_id: String,
    title: String,
    matched_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f32>,
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
    channel: Option<String>,
}

#[derive(Serialize)]
struct VideoListResponse {
    videos: Vec<VideoInfo>,
    total: usize,
}

#[derive(Serialize)]
struct VideoInfo {
    video_id: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    view_count: Option<u64>,
}

#[derive(Serialize)]
struct VideoDetailResponse {
    video_id: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transcript_source: Option<String>,
}

#[derive(Deserialize)]
struct ReportRequest {
    video_id: String,
    category: String,
    description: String,
    #[serde(default)]
    timestamp_seconds: Option<f64>,
}

#[derive(Serialize)]
struct ReportResponse {
    id: i64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn internal_error(e: impl std::fmt::Display) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    match state.engine.search(&params.q, params.limit).await {
        Ok(hits) => Json(SearchResponse {
            results: hits
                .into_iter()
                .map(|h| SearchResult {
                    video_id: h.video.external_id,
                    title: h.video.title,
                    matched_by: h.matched_by.to_string(),
                    snippet: h.snippet,
                    score: h.score,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn list_videos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    match state
        .store
        .list_completed_videos(params.limit, params.offset, params.channel.as_deref())
    {
        Ok(videos) => Json(VideoListResponse {
            total: videos.len(),
            videos: videos
                .into_iter()
                .map(|v| VideoInfo {
                    video_id: v.external_id,
                    title: v.title,
                    published_at: v.published_at.map(|dt| dt.to_rfc3339()),
                    duration_seconds: v.duration_seconds,
                    view_count: v.view_count,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> impl IntoResponse {
    let video = match state.store.get_video(&video_id) {
        Ok(Some(video)) => video,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Video not found: {}", video_id),
                }),
            )
                .into_response()
        }
        Err(e) => return internal_error(e),
    };

    let tags = state.store.tags_for_video(&video_id).unwrap_or_default();
    let transcript = state.store.get_transcript(&video_id).ok().flatten();

    Json(VideoDetailResponse {
        video_id: video.external_id,
        title: video.title,
        description: video.description,
        published_at: video.published_at.map(|dt| dt.to_rfc3339()),
        summary: transcript.as_ref().and_then(|t| t.summary.clone()),
        tags,
        transcript_source: transcript
            .as_ref()
            .and_then(|t| t.source)
            .map(|s| s.as_str().to_string()),
    })
    .into_response()
}

async fn submit_report(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReportRequest>,
) -> impl IntoResponse {
    match state.store.insert_error_report(
        &req.video_id,
        &req.category,
        &req.description,
        req.timestamp_seconds,
    ) {
        Ok(id) => (StatusCode::CREATED, Json(ReportResponse { id })).into_response(),
        Err(e) => internal_error(e),
    }
}
