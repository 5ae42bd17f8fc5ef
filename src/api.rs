//! api.rs — the HTTP message surface consumed by the extension frontends.
//! Thin handlers over the owned components; every route mirrors one message
//! action and its response shape.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::content::{ContentRecord, StoredItem};
use crate::ingest::{normalize_record, validate_record};
use crate::settings::Settings;
use crate::storage::{ContentStore, Stats};
use crate::sync::{sync_pending, SyncClient};
use crate::tracker::{ModelStatus, Tracker};

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Tracker>,
    pub store: Arc<ContentStore>,
    pub sync: Arc<dyn SyncClient>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/track", post(track_content))
        .route("/time-spent", post(update_time_spent))
        .route("/content", get(get_tracked_content))
        .route("/stats", get(get_stats))
        .route("/settings", get(get_settings).post(save_settings))
        .route("/model-status", get(get_model_status))
        .route("/sync", post(sync_now))
        .route("/sync/test", get(test_sync_connection))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct ActionResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ActionResponse {
    fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            error: None,
        })
    }
    fn fail(error: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            error: Some(error.into()),
        })
    }
}

async fn track_content(
    State(state): State<AppState>,
    Json(record): Json<ContentRecord>,
) -> (StatusCode, Json<ActionResponse>) {
    let record = normalize_record(record);
    if let Err(e) = validate_record(&record) {
        return (StatusCode::BAD_REQUEST, ActionResponse::fail(e.to_string()));
    }
    match state.tracker.submit(record) {
        Ok(()) => (StatusCode::OK, ActionResponse::ok()),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ActionResponse::fail(e.to_string()),
        ),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeSpentUpdate {
    url: String,
    time_spent: u64,
}

async fn update_time_spent(
    State(state): State<AppState>,
    Json(update): Json<TimeSpentUpdate>,
) -> (StatusCode, Json<ActionResponse>) {
    // Unknown url is a no-op, still a success.
    match state.store.update_time_spent(&update.url, update.time_spent) {
        Ok(_found) => (StatusCode::OK, ActionResponse::ok()),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ActionResponse::fail(e.to_string()),
        ),
    }
}

#[derive(Deserialize)]
struct ListParams {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ContentList {
    content: Vec<StoredItem>,
}

async fn get_tracked_content(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<ContentList> {
    Json(ContentList {
        content: state.store.list(params.limit),
    })
}

#[derive(Serialize)]
struct StatsResponse {
    stats: Stats,
}

async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        stats: state.store.stats(),
    })
}

#[derive(Serialize)]
struct SettingsResponse {
    settings: Settings,
}

async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        settings: state.store.settings(),
    })
}

async fn save_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> (StatusCode, Json<ActionResponse>) {
    if let Err(e) = settings.validate() {
        return (StatusCode::BAD_REQUEST, ActionResponse::fail(e.to_string()));
    }
    match state.store.replace_settings(settings) {
        Ok(()) => (StatusCode::OK, ActionResponse::ok()),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ActionResponse::fail(e.to_string()),
        ),
    }
}

async fn get_model_status(State(state): State<AppState>) -> Json<ModelStatus> {
    Json(state.tracker.status())
}

#[derive(Serialize)]
struct SyncResult {
    success: bool,
    synced: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn sync_now(State(state): State<AppState>) -> (StatusCode, Json<SyncResult>) {
    match sync_pending(&state.store, &state.sync).await {
        Ok(synced) => (
            StatusCode::OK,
            Json(SyncResult {
                success: true,
                synced,
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(SyncResult {
                success: false,
                synced: 0,
                error: Some(e.to_string()),
            }),
        ),
    }
}

#[derive(Serialize)]
struct ConnectionStatus {
    connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn test_sync_connection(State(state): State<AppState>) -> Json<ConnectionStatus> {
    let settings = state.store.settings();
    match state
        .sync
        .test_connection(&settings.website_url, &settings.api_key)
        .await
    {
        Ok(()) => Json(ConnectionStatus {
            connected: true,
            error: None,
        }),
        Err(e) => Json(ConnectionStatus {
            connected: false,
            error: Some(e.to_string()),
        }),
    }
}
