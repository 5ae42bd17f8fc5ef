// src/analyze/mod.rs
//! Scoring strategies behind one seam: the deterministic rule scorer, the
//! optional generative scorer, and the fallback composition that always
//! produces a result.

pub mod ai_adapter;
pub mod heuristic;
pub mod summary;

use std::fmt;
use std::sync::Arc;

use metrics::counter;

use crate::analysis::AnalysisResult;
use crate::content::ContentRecord;

// Re-export convenient types.
pub use crate::analyze::ai_adapter::{
    build_scorer_stack, load_ai_config, AiConfig, GenerativeScorer, MockProvider, OpenAiProvider,
};
pub use crate::analyze::heuristic::HeuristicScorer;
pub use crate::analyze::summary::{extract_tags, summarize};

/// The single failure kind a scoring strategy may report. Callers treat every
/// instance the same way: fall back to the rule scorer.
#[derive(Debug, Clone)]
pub struct ScorerUnavailable {
    reason: String,
}

impl ScorerUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ScorerUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scorer unavailable: {}", self.reason)
    }
}

impl std::error::Error for ScorerUnavailable {}

/// One capability: analyze a record. Strategies that cannot deliver report
/// `ScorerUnavailable` and nothing else.
#[async_trait::async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, record: &ContentRecord) -> Result<AnalysisResult, ScorerUnavailable>;
    /// Strategy name for diagnostics.
    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
impl Scorer for HeuristicScorer {
    async fn score(&self, record: &ContentRecord) -> Result<AnalysisResult, ScorerUnavailable> {
        Ok(self.analyze(record))
    }
    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// Fallback composition: try the advanced strategy first, absorb any failure,
/// and delegate to the rule scorer. `analyze` itself can therefore never fail.
pub struct ScorerStack {
    advanced: Option<Arc<dyn Scorer>>,
    heuristic: HeuristicScorer,
}

impl ScorerStack {
    pub fn new(advanced: Option<Arc<dyn Scorer>>) -> Self {
        Self {
            advanced,
            heuristic: HeuristicScorer::new(),
        }
    }

    /// Rule scoring only; no model involved.
    pub fn heuristic_only() -> Self {
        Self::new(None)
    }

    /// Whether an advanced strategy is wired in (reported as `modelLoaded`).
    pub fn model_loaded(&self) -> bool {
        self.advanced.is_some()
    }

    pub async fn analyze(&self, record: &ContentRecord) -> AnalysisResult {
        if let Some(advanced) = &self.advanced {
            match advanced.score(record).await {
                Ok(result) => return result,
                Err(e) => {
                    tracing::warn!(strategy = advanced.name(), error = %e, "falling back to rule scorer");
                    counter!("scorer_fallback_total").increment(1);
                }
            }
        }
        self.heuristic.analyze(record)
    }
}
