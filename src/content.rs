//! content.rs — the records flowing through the pipeline: what the scraping
//! collaborator submits, and what the store keeps after analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::analysis::AnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Video,
}

/// Raw extracted page data, one per qualifying page visit. Field names are the
/// wire schema the content scripts already emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub title: String,
    /// Unique resource identifier; primary dedup key.
    pub url: String,
    /// Host component of the url.
    pub domain: String,
    /// Extracted body text, capped during ingestion.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// Seconds on the page so far; updated again on page unload.
    #[serde(default)]
    pub time_spent: u64,
    /// Epoch milliseconds at extraction time.
    pub timestamp: i64,
}

impl ContentRecord {
    /// Body length in characters; absent content counts as zero.
    pub fn content_chars(&self) -> usize {
        self.content
            .as_deref()
            .map(|c| c.chars().count())
            .unwrap_or(0)
    }
}

/// A persisted record: the submission, its analysis, and bookkeeping.
/// Append-only except `timeSpent` (unload updates) and `synced` (flip on
/// successful forward).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredItem {
    pub id: String,
    #[serde(flatten)]
    pub record: ContentRecord,
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub created_at: DateTime<Utc>,
    pub is_public: bool,
    pub synced: bool,
}

impl StoredItem {
    pub fn new(record: ContentRecord, analysis: AnalysisResult, is_public: bool) -> Self {
        let created_at = Utc::now();
        let id = item_id(&record.url, created_at);
        Self {
            id,
            record,
            analysis,
            created_at,
            is_public,
            synced: false,
        }
    }
}

/// Short hex token identifying a stored item.
fn item_id(url: &str, created_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(created_at.timestamp_millis().to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{EngagementLevel, QualityLevel};

    fn record() -> ContentRecord {
        ContentRecord {
            title: "A title".into(),
            url: "https://example.com/a".into(),
            domain: "example.com".into(),
            content: Some("body".into()),
            author: None,
            content_type: ContentType::Article,
            time_spent: 42,
            timestamp: 1_700_000_000_000,
        }
    }

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            score: 55,
            should_save: true,
            summary: String::new(),
            tags: vec![],
            category: "general".into(),
            content_quality: QualityLevel::Medium,
            engagement_level: EngagementLevel::Low,
            generated_by_model: false,
        }
    }

    #[test]
    fn stored_item_flattens_to_one_object() {
        let item = StoredItem::new(record(), analysis(), true);
        let v = serde_json::to_value(&item).unwrap();

        // Record, analysis, and bookkeeping all live at the top level.
        assert_eq!(v["url"], serde_json::json!("https://example.com/a"));
        assert_eq!(v["type"], serde_json::json!("article"));
        assert_eq!(v["timeSpent"], serde_json::json!(42));
        assert_eq!(v["score"], serde_json::json!(55));
        assert_eq!(v["isPublic"], serde_json::json!(true));
        assert_eq!(v["synced"], serde_json::json!(false));
        assert_eq!(item.id.len(), 16);
    }

    #[test]
    fn stored_item_roundtrips() {
        let item = StoredItem::new(record(), analysis(), false);
        let json = serde_json::to_string(&item).unwrap();
        let back: StoredItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn content_chars_handles_absent_body() {
        let mut r = record();
        r.content = None;
        assert_eq!(r.content_chars(), 0);
        r.content = Some("abcd".into());
        assert_eq!(r.content_chars(), 4);
    }
}
