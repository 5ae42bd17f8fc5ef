//! storage.rs — the durable collection of tracked items plus the settings
//! object, persisted together as one JSON document.
//!
//! - Newest-first ordering; inserts prepend, the tail is evicted past the cap.
//! - Dedup by url, or by (title, domain) when the url differs.
//! - Writes are atomic (tmp + rename); loads are lenient (missing or corrupt
//!   state starts fresh).
//! - Every read-modify-write holds the state mutex for the whole call, so
//!   unload-time updates and stats reads interleave safely with the queue
//!   worker. No versioning/migration: schema changes are destructive.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::content::{ContentType, StoredItem};
use crate::settings::Settings;

/// Hard cap on the collection; the oldest entries fall off past it.
pub const MAX_ITEMS: usize = 1000;

pub const DEFAULT_LIST_LIMIT: usize = 50;

const TOP_DOMAINS: usize = 10;
const RECENT_ACTIVITY: usize = 10;

/// The persisted schema: two logical keys, as the frontends expect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageState {
    pub tracked_content: Vec<StoredItem>,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainCount {
    pub domain: String,
    pub count: usize,
}

/// Aggregates over the whole collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_items: usize,
    pub article_count: usize,
    pub video_count: usize,
    pub total_time_spent: u64,
    pub ai_analyzed_count: usize,
    pub top_domains: Vec<DomainCount>,
    pub recent_activity: Vec<StoredItem>,
}

#[derive(Debug)]
pub struct ContentStore {
    path: PathBuf,
    state: Mutex<StorageState>,
}

impl ContentStore {
    /// Open the store at `path`, reading prior state when present.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_seeded(path, None)
    }

    /// Like `open`, but when no state file exists yet, start from the given
    /// settings seed instead of the built-in defaults.
    pub fn open_seeded(path: impl Into<PathBuf>, seed: Option<Settings>) -> Self {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!(error = %e, path = %path.display(), "corrupt state file, starting fresh");
                StorageState::default()
            }),
            Err(_) => StorageState {
                settings: seed.unwrap_or_default(),
                ..StorageState::default()
            },
        };
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    /// Insert unless a duplicate exists. Returns whether the item was actually
    /// inserted; a duplicate is a silent no-op, not an error. A failed persist
    /// rolls the insert back so memory and disk stay consistent.
    pub fn upsert(&self, item: StoredItem) -> Result<bool> {
        let id = item.id.clone();
        let bytes = {
            let mut st = self.state.lock().expect("storage mutex poisoned");
            let duplicate = st.tracked_content.iter().any(|existing| {
                existing.record.url == item.record.url
                    || (existing.record.title == item.record.title
                        && existing.record.domain == item.record.domain)
            });
            if duplicate {
                return Ok(false);
            }
            st.tracked_content.insert(0, item);
            st.tracked_content.truncate(MAX_ITEMS);
            serialize_state(&st)?
        };
        if let Err(e) = self.write_atomic(&bytes) {
            let mut st = self.state.lock().expect("storage mutex poisoned");
            if st.tracked_content.first().map(|i| i.id == id).unwrap_or(false) {
                st.tracked_content.remove(0);
            }
            return Err(e);
        }
        Ok(true)
    }

    /// Most-recent-first listing, capped at `limit` (default 50).
    pub fn list(&self, limit: Option<usize>) -> Vec<StoredItem> {
        let st = self.state.lock().expect("storage mutex poisoned");
        let n = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        st.tracked_content.iter().take(n).cloned().collect()
    }

    /// Update the reading time of an item located by url. Returns whether the
    /// item was found; an unknown url is a no-op.
    pub fn update_time_spent(&self, url: &str, seconds: u64) -> Result<bool> {
        let bytes = {
            let mut st = self.state.lock().expect("storage mutex poisoned");
            let Some(item) = st.tracked_content.iter_mut().find(|i| i.record.url == url) else {
                return Ok(false);
            };
            item.record.time_spent = seconds;
            serialize_state(&st)?
        };
        self.write_atomic(&bytes)?;
        Ok(true)
    }

    /// Flip `synced` after a successful forward. Unknown url is a no-op.
    pub fn mark_synced(&self, url: &str) -> Result<bool> {
        let bytes = {
            let mut st = self.state.lock().expect("storage mutex poisoned");
            let Some(item) = st.tracked_content.iter_mut().find(|i| i.record.url == url) else {
                return Ok(false);
            };
            item.synced = true;
            serialize_state(&st)?
        };
        self.write_atomic(&bytes)?;
        Ok(true)
    }

    /// High-quality items not yet forwarded, store order.
    pub fn unsynced_high_quality(&self) -> Vec<StoredItem> {
        use crate::analysis::QualityLevel;
        let st = self.state.lock().expect("storage mutex poisoned");
        st.tracked_content
            .iter()
            .filter(|i| i.analysis.content_quality == QualityLevel::High && !i.synced)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> Stats {
        let st = self.state.lock().expect("storage mutex poisoned");
        let items = &st.tracked_content;

        let mut domain_counts: HashMap<&str, usize> = HashMap::new();
        let mut domain_order: Vec<&str> = Vec::new();
        for item in items {
            let d = item.record.domain.as_str();
            match domain_counts.get_mut(d) {
                Some(n) => *n += 1,
                None => {
                    domain_counts.insert(d, 1);
                    domain_order.push(d);
                }
            }
        }
        let mut top: Vec<DomainCount> = domain_order
            .into_iter()
            .map(|d| DomainCount {
                domain: d.to_string(),
                count: domain_counts[d],
            })
            .collect();
        // Stable sort: ties keep first-seen order.
        top.sort_by_key(|dc| std::cmp::Reverse(dc.count));
        top.truncate(TOP_DOMAINS);

        Stats {
            total_items: items.len(),
            article_count: items
                .iter()
                .filter(|i| i.record.content_type == ContentType::Article)
                .count(),
            video_count: items
                .iter()
                .filter(|i| i.record.content_type == ContentType::Video)
                .count(),
            total_time_spent: items.iter().map(|i| i.record.time_spent).sum(),
            ai_analyzed_count: items.iter().filter(|i| i.analysis.generated_by_model).count(),
            top_domains: top,
            recent_activity: items.iter().take(RECENT_ACTIVITY).cloned().collect(),
        }
    }

    pub fn settings(&self) -> Settings {
        self.state
            .lock()
            .expect("storage mutex poisoned")
            .settings
            .clone()
    }

    pub fn replace_settings(&self, settings: Settings) -> Result<()> {
        let bytes = {
            let mut st = self.state.lock().expect("storage mutex poisoned");
            st.settings = settings;
            serialize_state(&st)?
        };
        self.write_atomic(&bytes)
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .expect("storage mutex poisoned")
            .tracked_content
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating state dir {}", dir.display()))?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("committing {}", self.path.display()))?;
        Ok(())
    }
}

fn serialize_state(state: &StorageState) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(state).context("serializing tracker state")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResult, EngagementLevel, QualityLevel};
    use crate::content::ContentRecord;

    fn item(url: &str, title: &str, domain: &str) -> StoredItem {
        let record = ContentRecord {
            title: title.into(),
            url: url.into(),
            domain: domain.into(),
            content: None,
            author: None,
            content_type: ContentType::Article,
            time_spent: 10,
            timestamp: 0,
        };
        let analysis = AnalysisResult {
            score: 50,
            should_save: true,
            summary: String::new(),
            tags: vec![],
            category: "general".into(),
            content_quality: QualityLevel::Medium,
            engagement_level: EngagementLevel::Low,
            generated_by_model: false,
        };
        StoredItem::new(record, analysis, true)
    }

    fn temp_store() -> (tempfile::TempDir, ContentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path().join("tracker.json"));
        (dir, store)
    }

    #[test]
    fn same_url_is_inserted_once() {
        let (_dir, store) = temp_store();
        assert!(store.upsert(item("https://a.com/1", "One", "a.com")).unwrap());
        assert!(!store.upsert(item("https://a.com/1", "Other", "b.com")).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn same_title_and_domain_is_a_duplicate_too() {
        let (_dir, store) = temp_store();
        assert!(store.upsert(item("https://a.com/1", "One", "a.com")).unwrap());
        assert!(!store
            .upsert(item("https://a.com/1?utm=x", "One", "a.com"))
            .unwrap());
        // Same title on another domain is a different item.
        assert!(store.upsert(item("https://b.com/1", "One", "b.com")).unwrap());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn newest_items_come_first() {
        let (_dir, store) = temp_store();
        store.upsert(item("https://a.com/1", "One", "a.com")).unwrap();
        store.upsert(item("https://a.com/2", "Two", "a.com")).unwrap();
        let listed = store.list(None);
        assert_eq!(listed[0].record.url, "https://a.com/2");
        assert_eq!(listed[1].record.url, "https://a.com/1");
    }

    #[test]
    fn list_respects_limit_and_default() {
        let (_dir, store) = temp_store();
        for i in 0..60 {
            store
                .upsert(item(&format!("https://a.com/{i}"), &format!("t{i}"), "a.com"))
                .unwrap();
        }
        assert_eq!(store.list(None).len(), DEFAULT_LIST_LIMIT);
        assert_eq!(store.list(Some(7)).len(), 7);
    }

    #[test]
    fn time_spent_and_synced_mutate_in_place() {
        let (_dir, store) = temp_store();
        store.upsert(item("https://a.com/1", "One", "a.com")).unwrap();
        assert!(store.update_time_spent("https://a.com/1", 321).unwrap());
        assert!(store.mark_synced("https://a.com/1").unwrap());
        let listed = store.list(None);
        assert_eq!(listed[0].record.time_spent, 321);
        assert!(listed[0].synced);
        // Unknown url: no-op, not an error.
        assert!(!store.update_time_spent("https://a.com/nope", 1).unwrap());
        assert!(!store.mark_synced("https://a.com/nope").unwrap());
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        {
            let store = ContentStore::open(&path);
            store.upsert(item("https://a.com/1", "One", "a.com")).unwrap();
            let mut s = store.settings();
            s.username = "reader".into();
            store.replace_settings(s).unwrap();
        }
        let store = ContentStore::open(&path);
        assert_eq!(store.len(), 1);
        assert_eq!(store.settings().username, "reader");
    }

    #[test]
    fn corrupt_state_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        fs::write(&path, "{ not json").unwrap();
        let store = ContentStore::open(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn stats_aggregate_counts_and_domains() {
        let (_dir, store) = temp_store();
        store.upsert(item("https://a.com/1", "One", "a.com")).unwrap();
        store.upsert(item("https://a.com/2", "Two", "a.com")).unwrap();
        let mut video = item("https://v.com/1", "Vid", "v.com");
        video.record.content_type = ContentType::Video;
        video.analysis.generated_by_model = true;
        store.upsert(video).unwrap();

        let stats = store.stats();
        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.article_count, 2);
        assert_eq!(stats.video_count, 1);
        assert_eq!(stats.total_time_spent, 30);
        assert_eq!(stats.ai_analyzed_count, 1);
        assert_eq!(stats.top_domains[0].domain, "a.com");
        assert_eq!(stats.top_domains[0].count, 2);
        assert_eq!(stats.recent_activity.len(), 3);
    }
}
