//! sync.rs — forwarding saved items to the reading-list API.
//!
//! The core only decides eligibility and builds the payload; the network call
//! is one attempt, fire-and-forget. A failed forward is logged and dropped —
//! no retry, `synced` stays false.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisResult, QualityLevel};
use crate::content::{ContentType, StoredItem};
use crate::settings::Settings;
use crate::storage::ContentStore;

/// Auto-sync forwards only items scoring at or above this.
pub const SYNC_SCORE_THRESHOLD: u32 = 60;

/// Post-save trigger condition for the automatic forward.
pub fn should_auto_sync(settings: &Settings, analysis: &AnalysisResult) -> bool {
    settings.auto_sync && analysis.score >= SYNC_SCORE_THRESHOLD
}

/// The documented forward shape: `POST {websiteUrl}/api/content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    pub title: String,
    pub url: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(default)]
    pub author: Option<String>,
    pub summary: String,
    pub tags: Vec<String>,
    pub time_spent: u64,
    pub quality: QualityLevel,
    pub is_public: bool,
}

impl SyncPayload {
    pub fn from_item(item: &StoredItem) -> Self {
        Self {
            title: item.record.title.clone(),
            url: item.record.url.clone(),
            domain: item.record.domain.clone(),
            content_type: item.record.content_type,
            author: item.record.author.clone(),
            summary: item.analysis.summary.clone(),
            tags: item.analysis.tags.clone(),
            time_spent: item.record.time_spent,
            quality: item.analysis.content_quality,
            is_public: item.is_public,
        }
    }
}

/// Transport seam; tests substitute a recording client.
#[async_trait]
pub trait SyncClient: Send + Sync {
    async fn forward(&self, website_url: &str, api_key: &str, payload: &SyncPayload)
        -> Result<()>;
    /// Credential check against `GET {websiteUrl}/api/test`.
    async fn test_connection(&self, website_url: &str, api_key: &str) -> Result<()>;
}

pub struct HttpSyncClient {
    http: reqwest::Client,
}

impl HttpSyncClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent("smart-content-tracker/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self { http }
    }
}

impl Default for HttpSyncClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SyncClient for HttpSyncClient {
    async fn forward(
        &self,
        website_url: &str,
        api_key: &str,
        payload: &SyncPayload,
    ) -> Result<()> {
        if website_url.is_empty() {
            return Err(anyhow!("no sync endpoint configured"));
        }
        let url = format!("{}/api/content", website_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .await?;
        resp.error_for_status()?;
        Ok(())
    }

    async fn test_connection(&self, website_url: &str, api_key: &str) -> Result<()> {
        if website_url.is_empty() {
            return Err(anyhow!("no sync endpoint configured"));
        }
        let url = format!("{}/api/test", website_url.trim_end_matches('/'));
        let resp = self.http.get(&url).bearer_auth(api_key).send().await?;
        resp.error_for_status()?;
        Ok(())
    }
}

/// Manual sweep: forward every high-quality item that has not synced yet,
/// marking each success. Individual failures are logged and skipped.
pub async fn sync_pending(store: &Arc<ContentStore>, client: &Arc<dyn SyncClient>) -> Result<usize> {
    let settings = store.settings();
    if settings.website_url.is_empty() || settings.api_key.is_empty() {
        return Err(anyhow!("sync credentials are not configured"));
    }

    let pending = store.unsynced_high_quality();
    let mut synced = 0usize;
    for item in pending {
        let payload = SyncPayload::from_item(&item);
        match client
            .forward(&settings.website_url, &settings.api_key, &payload)
            .await
        {
            Ok(()) => {
                counter!("sync_forward_total", "outcome" => "ok").increment(1);
                store.mark_synced(&item.record.url)?;
                synced += 1;
            }
            Err(e) => {
                counter!("sync_forward_total", "outcome" => "error").increment(1);
                tracing::warn!(url = %item.record.url, error = %e, "manual sync forward failed");
            }
        }
    }
    Ok(synced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::EngagementLevel;
    use crate::content::ContentRecord;

    fn analysis(score: u32) -> AnalysisResult {
        AnalysisResult {
            score,
            should_save: true,
            summary: "s".into(),
            tags: vec!["t".into()],
            category: "general".into(),
            content_quality: QualityLevel::High,
            engagement_level: EngagementLevel::High,
            generated_by_model: false,
        }
    }

    #[test]
    fn auto_sync_needs_both_flag_and_score() {
        let mut settings = Settings::default();
        assert!(!should_auto_sync(&settings, &analysis(90)));

        settings.auto_sync = true;
        assert!(should_auto_sync(&settings, &analysis(60)));
        assert!(!should_auto_sync(&settings, &analysis(59)));
    }

    #[test]
    fn payload_carries_the_documented_shape() {
        let record = ContentRecord {
            title: "T".into(),
            url: "https://a.com/x".into(),
            domain: "a.com".into(),
            content: Some("body".into()),
            author: Some("Ada".into()),
            content_type: ContentType::Video,
            time_spent: 12,
            timestamp: 0,
        };
        let item = StoredItem::new(record, analysis(80), true);
        let v = serde_json::to_value(SyncPayload::from_item(&item)).unwrap();

        for key in [
            "title",
            "url",
            "domain",
            "type",
            "author",
            "summary",
            "tags",
            "timeSpent",
            "quality",
            "isPublic",
        ] {
            assert!(v.get(key).is_some(), "missing '{key}' in sync payload");
        }
        assert_eq!(v["type"], serde_json::json!("video"));
        assert_eq!(v["quality"], serde_json::json!("high"));
        // The payload never carries the full body text.
        assert!(v.get("content").is_none());
    }
}
