//! Deterministic rule scorer: additive partial scores over content length,
//! reading time, domain reputation, and media type. Always available, never
//! fails.

use crate::analysis::{clamp_score, AnalysisResult, EngagementLevel, QualityLevel, SAVE_THRESHOLD};
use crate::analyze::summary::{extract_tags, summarize};
use crate::content::{ContentRecord, ContentType};

/// The rule scorer has no categorizer; everything lands here.
pub const DEFAULT_CATEGORY: &str = "general";

/// Domains whose presence (substring match) earns a reputation bonus.
const QUALITY_DOMAINS: [&str; 10] = [
    "medium.com",
    "dev.to",
    "stackoverflow.com",
    "github.com",
    "arxiv.org",
    "news.ycombinator.com",
    "reddit.com",
    "wikipedia.org",
    "bbc.com",
    "nytimes.com",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn new() -> Self {
        Self
    }

    /// Raw additive score. Every condition is checked independently; long
    /// content and long reading time stack.
    pub fn raw_score(record: &ContentRecord) -> u32 {
        let mut score = 0u32;

        let content_chars = record.content_chars();
        if content_chars > 500 {
            score += 20;
        }
        if content_chars > 1500 {
            score += 20;
        }

        if record.time_spent > 30 {
            score += 15;
        }
        if record.time_spent > 120 {
            score += 15;
        }
        if record.time_spent > 300 {
            score += 20;
        }

        if QUALITY_DOMAINS.iter().any(|d| record.domain.contains(d)) {
            score += 25;
        }

        if record.content_type == ContentType::Video {
            score += 15;
        }

        score
    }

    pub fn analyze(&self, record: &ContentRecord) -> AnalysisResult {
        let raw = Self::raw_score(record);
        let content = record.content.as_deref().unwrap_or("");

        AnalysisResult {
            score: clamp_score(raw),
            should_save: raw >= SAVE_THRESHOLD,
            summary: summarize(content),
            tags: extract_tags(content, &record.title),
            category: DEFAULT_CATEGORY.to_string(),
            content_quality: QualityLevel::from_rule_score(raw),
            engagement_level: EngagementLevel::from_time_spent(record.time_spent),
            generated_by_model: false,
        }
    }
}
