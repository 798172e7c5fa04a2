//! HTTP handler layer.
//!
//! Each request flows validate → cache check → (hit | upstream call →
//! normalize → cache write) → reply. The cache is owned by the state passed
//! into the router, never by a process-wide global, so handlers stay
//! testable in isolation. Concurrent misses for the same key are not
//! coalesced: each one calls upstream and the last cache write wins.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::cache::ResponseCache;
use crate::error::{ApiError, ApiResult};
use crate::library::{LibraryNode, build_tree};
use crate::normalize::{VideoRecord, normalize_videos};
use crate::upstream::UpstreamClient;

/// Longest accepted search query, in characters.
pub const MAX_QUERY_LEN: usize = 100;

const DEFAULT_QUALITY: &str = "high";
const TRENDING_CACHE_KEY: &str = "trending";

#[derive(Clone)]
pub struct AppState {
    cache: Arc<ResponseCache<FeedPayload>>,
    upstream: Arc<UpstreamClient>,
    library_root: Arc<PathBuf>,
    public_base_url: Arc<String>,
}

impl AppState {
    pub fn new(upstream: UpstreamClient, library_root: PathBuf, public_base_url: String) -> Self {
        Self {
            cache: Arc::new(ResponseCache::new()),
            upstream: Arc::new(upstream),
            library_root: Arc::new(library_root),
            public_base_url: Arc::new(public_base_url),
        }
    }
}

/// Response body shared by the search and trending endpoints. The stored
/// cache copy always carries `cached: false`; a hit overrides the flag on
/// the way out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPayload {
    pub videos: Vec<VideoRecord>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthPayload {
    pub status: &'static str,
    pub cache_size: usize,
    pub timestamp: i64,
    pub message: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub quality: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LibraryPayload {
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    pub items: Vec<LibraryNode>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/search", get(search))
        .route("/api/trending", get(trending))
        .route("/api/library", get(library))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthPayload> {
    Json(HealthPayload {
        status: "ok",
        cache_size: state.cache.len(),
        timestamp: Utc::now().timestamp_millis(),
        message: "tokview backend is running",
    })
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<FeedPayload>> {
    let query = match params.q {
        Some(q) if !q.is_empty() => q,
        _ => return Err(missing_query()),
    };
    if query.chars().count() > MAX_QUERY_LEN {
        return Err(ApiError::validation(format!(
            "Query too long (max {MAX_QUERY_LEN} characters)"
        )));
    }
    let quality = params
        .quality
        .unwrap_or_else(|| DEFAULT_QUALITY.to_string());

    // The key is case-sensitive and unnormalized on purpose; "Cats" and
    // "cats" are distinct entries.
    let key = format!("search:{query}:{quality}");
    if let Some(hit) = state.cache.get(&key) {
        return Ok(Json(FeedPayload {
            cached: true,
            ..hit
        }));
    }

    let payload = match state.upstream.search(&query, &quality).await? {
        Some(raws) => {
            let videos = normalize_videos(&raws);
            let payload = FeedPayload {
                count: videos.len(),
                videos,
                query: Some(query),
                message: None,
                cached: false,
            };
            state.cache.set(key, payload.clone());
            payload
        }
        // No recognizable video list: explicit empty result, not cached.
        None => FeedPayload {
            videos: Vec::new(),
            count: 0,
            query: Some(query),
            message: Some("No videos found for this query".to_string()),
            cached: false,
        },
    };

    Ok(Json(payload))
}

async fn trending(State(state): State<AppState>) -> ApiResult<Json<FeedPayload>> {
    if let Some(hit) = state.cache.get(TRENDING_CACHE_KEY) {
        return Ok(Json(FeedPayload {
            cached: true,
            ..hit
        }));
    }

    let payload = match state.upstream.trending().await? {
        Some(raws) => {
            let videos = normalize_videos(&raws);
            let payload = FeedPayload {
                count: videos.len(),
                videos,
                query: None,
                message: None,
                cached: false,
            };
            state.cache.set(TRENDING_CACHE_KEY, payload.clone());
            payload
        }
        None => FeedPayload {
            videos: Vec::new(),
            count: 0,
            query: None,
            message: Some("No trending videos available".to_string()),
            cached: false,
        },
    };

    Ok(Json(payload))
}

async fn library(State(state): State<AppState>) -> ApiResult<Json<LibraryPayload>> {
    let root = state.library_root.as_ref().clone();
    let base_url = state.public_base_url.as_ref().clone();

    let items = tokio::task::spawn_blocking({
        let base_url = base_url.clone();
        move || build_tree(&root, &base_url, "")
    })
    .await
    .map_err(|err| ApiError::internal(format!("task join error: {err}")))?;

    Ok(Json(LibraryPayload { base_url, items }))
}

fn missing_query() -> ApiError {
    ApiError::validation_with_example(
        "Missing required parameter: q",
        serde_json::json!("/api/search?q=funny+cats&quality=high"),
    )
}
