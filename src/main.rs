//! Smart Content Tracker — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the store, scorer stack, ingest queue,
//! and sync client into one always-on worker process.

mod analysis;
mod analyze;
mod api;
mod content;
mod ingest;
mod metrics;
mod settings;
mod storage;
mod sync;
mod tracker;

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::analyze::{build_scorer_stack, load_ai_config};
use crate::api::AppState;
use crate::metrics::Metrics;
use crate::storage::ContentStore;
use crate::sync::{HttpSyncClient, SyncClient};
use crate::tracker::{Tracker, TrackerCfg};

const DEFAULT_STATE_PATH: &str = "state/tracker.json";
const ENV_STATE_PATH: &str = "TRACKER_STATE_PATH";

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - TRACKER_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("TRACKER_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tracker=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let metrics = Metrics::init();

    // --- Durable store (settings seed applies on first start only) ---
    let state_path =
        std::env::var(ENV_STATE_PATH).unwrap_or_else(|_| DEFAULT_STATE_PATH.to_string());
    let seed = match settings::load_seed_default() {
        Ok(seed) => seed,
        Err(e) => {
            tracing::warn!(error = %e, "settings seed unavailable, using defaults");
            None
        }
    };
    let store = Arc::new(ContentStore::open_seeded(state_path, seed));

    // --- Scorer stack (generative when configured, rules otherwise) ---
    let ai_cfg = load_ai_config();
    tracing::info!(
        enabled = ai_cfg.enabled,
        provider = ai_cfg.provider.as_deref().unwrap_or("none"),
        "AI config loaded"
    );
    let scorer = Arc::new(build_scorer_stack(&ai_cfg));

    let sync: Arc<dyn SyncClient> = Arc::new(HttpSyncClient::new());
    let tracker = Tracker::spawn(TrackerCfg::default(), store.clone(), scorer, sync.clone());

    let state = AppState {
        tracker,
        store,
        sync,
    };
    let router = api::create_router(state).merge(metrics.router());

    Ok(router.into())
}
