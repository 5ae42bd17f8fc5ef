// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod analysis;
pub mod api;
pub mod content;
pub mod ingest;
pub mod metrics;
pub mod settings;
pub mod storage;
pub mod sync;
pub mod tracker;

// Scoring pipeline (rule scorer, generative adapter, fallback composition)
pub mod analyze;

// ---- Re-exports for stable public API ----
pub use crate::analysis::{AnalysisResult, EngagementLevel, QualityLevel};
pub use crate::analyze::{
    build_scorer_stack, load_ai_config, HeuristicScorer, Scorer, ScorerStack, ScorerUnavailable,
};
pub use crate::api::{create_router, AppState};
pub use crate::content::{ContentRecord, ContentType, StoredItem};
pub use crate::settings::Settings;
pub use crate::storage::{ContentStore, Stats};
pub use crate::sync::{HttpSyncClient, SyncClient, SyncPayload};
pub use crate::tracker::{Tracker, TrackerCfg};
