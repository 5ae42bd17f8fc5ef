//! analysis.rs — scorer output: save decision, derived metadata, quality labels.
//!
//! The score is an additive sum of partial signals and is not bounded by
//! construction; thresholds are evaluated on the raw sum, the stored value is
//! clamped to the documented 0–100 scale.

use serde::{Deserialize, Serialize};

/// Displayed scores are capped here; thresholds below operate on the raw sum.
pub const MAX_SCORE: u32 = 100;

/// Raw score at or above this is worth keeping.
pub const SAVE_THRESHOLD: u32 = 40;

/// Coarse quality label derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Low,
    Medium,
    High,
}

impl QualityLevel {
    /// Bands used by the deterministic rule scorer.
    pub fn from_rule_score(raw: u32) -> Self {
        if raw >= 60 {
            QualityLevel::High
        } else if raw >= 40 {
            QualityLevel::Medium
        } else {
            QualityLevel::Low
        }
    }

    /// Bands used for model-produced scores (the model path grades harder).
    pub fn from_model_score(raw: u32) -> Self {
        if raw >= 70 {
            QualityLevel::High
        } else if raw >= 50 {
            QualityLevel::Medium
        } else {
            QualityLevel::Low
        }
    }
}

/// How long the reader actually stayed on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    Low,
    Medium,
    High,
}

impl EngagementLevel {
    pub fn from_time_spent(secs: u64) -> Self {
        if secs > 300 {
            EngagementLevel::High
        } else if secs > 60 {
            EngagementLevel::Medium
        } else {
            EngagementLevel::Low
        }
    }
}

/// Full analysis of one submitted record. This is the shape persisted with the
/// item and returned to the frontends, hence camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Clamped to [0, MAX_SCORE].
    pub score: u32,
    pub should_save: bool,
    pub summary: String,
    /// At most 5, highest frequency first.
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: String,
    pub content_quality: QualityLevel,
    pub engagement_level: EngagementLevel,
    pub generated_by_model: bool,
}

pub fn clamp_score(raw: u32) -> u32 {
    raw.min(MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_analysis_shape_matches_frontend_contract() {
        let a = AnalysisResult {
            score: 85,
            should_save: true,
            summary: "A short summary".to_string(),
            tags: vec!["rust".into(), "async".into()],
            category: "general".to_string(),
            content_quality: QualityLevel::High,
            engagement_level: EngagementLevel::Medium,
            generated_by_model: false,
        };

        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["score"], serde_json::json!(85));
        assert_eq!(v["shouldSave"], serde_json::json!(true));
        assert_eq!(v["contentQuality"], serde_json::json!("high"));
        assert_eq!(v["engagementLevel"], serde_json::json!("medium"));
        assert_eq!(v["generatedByModel"], serde_json::json!(false));
        assert!(v["tags"].is_array());
    }

    #[test]
    fn rule_bands_switch_at_40_and_60() {
        assert_eq!(QualityLevel::from_rule_score(39), QualityLevel::Low);
        assert_eq!(QualityLevel::from_rule_score(40), QualityLevel::Medium);
        assert_eq!(QualityLevel::from_rule_score(59), QualityLevel::Medium);
        assert_eq!(QualityLevel::from_rule_score(60), QualityLevel::High);
    }

    #[test]
    fn engagement_bands_switch_at_60_and_300() {
        assert_eq!(EngagementLevel::from_time_spent(60), EngagementLevel::Low);
        assert_eq!(EngagementLevel::from_time_spent(61), EngagementLevel::Medium);
        assert_eq!(EngagementLevel::from_time_spent(300), EngagementLevel::Medium);
        assert_eq!(EngagementLevel::from_time_spent(301), EngagementLevel::High);
    }

    #[test]
    fn clamp_caps_overflowing_sums() {
        assert_eq!(clamp_score(130), MAX_SCORE);
        assert_eq!(clamp_score(99), 99);
    }
}
