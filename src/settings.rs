//! settings.rs — the user-facing configuration object. The core consults
//! `autoSync`, the sync threshold, and `shareByDefault`; the remaining fields
//! gate extraction upstream and are carried read-only for the frontends.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "TRACKER_SETTINGS_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Base URL of the reading-list API; also the sync target.
    pub website_url: String,
    pub username: String,
    pub api_key: String,
    pub auto_sync: bool,
    pub min_time_spent: u32,
    pub min_content_length: u32,
    pub track_videos: bool,
    pub track_articles: bool,
    /// New items are stored with `isPublic` set to this.
    pub share_by_default: bool,
    /// Newline-separated domain list, consumed by the extraction side.
    pub excluded_domains: String,
    /// Days. Currently inert: no time-based eviction is wired to it.
    pub data_retention: u32,
    pub quality_threshold: u32,
    pub generate_summaries: bool,
    pub extract_tags: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            website_url: String::new(),
            username: String::new(),
            api_key: String::new(),
            auto_sync: false,
            min_time_spent: 30,
            min_content_length: 500,
            track_videos: true,
            track_articles: true,
            share_by_default: true,
            excluded_domains: "gmail.com\ncalendar.google.com\ndrive.google.com\nfacebook.com\ntwitter.com"
                .to_string(),
            data_retention: 365,
            quality_threshold: 40,
            generate_summaries: true,
            extract_tags: true,
        }
    }
}

impl Settings {
    /// Save-time validation mirrored from the settings form: auto-sync needs
    /// working credentials, and the URL must be http(s) when present.
    pub fn validate(&self) -> Result<()> {
        if self.auto_sync
            && (self.website_url.trim().is_empty()
                || self.username.trim().is_empty()
                || self.api_key.trim().is_empty())
        {
            bail!("websiteUrl, username, and apiKey are required for auto-sync");
        }
        if !self.website_url.is_empty() && !is_http_url(&self.website_url) {
            bail!("websiteUrl must be a valid http(s) URL");
        }
        Ok(())
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a settings seed from an explicit path. Supports TOML or JSON formats.
pub fn load_seed_from(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading settings from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_settings(&content, ext.as_str())
}

/// Load a settings seed using env var + fallbacks:
/// 1) $TRACKER_SETTINGS_PATH
/// 2) config/settings.toml
/// 3) config/settings.json
/// Returns `None` when no seed file exists (defaults apply).
pub fn load_seed_default() -> Result<Option<Settings>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_seed_from(&pb).map(Some);
        } else {
            return Err(anyhow!("TRACKER_SETTINGS_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/settings.toml");
    if toml_p.exists() {
        return load_seed_from(&toml_p).map(Some);
    }
    let json_p = PathBuf::from("config/settings.json");
    if json_p.exists() {
        return load_seed_from(&json_p).map(Some);
    }
    Ok(None)
}

fn parse_settings(s: &str, hint_ext: &str) -> Result<Settings> {
    if hint_ext == "toml" {
        if let Ok(v) = toml::from_str::<Settings>(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = serde_json::from_str::<Settings>(s) {
        return Ok(v);
    }
    if hint_ext != "toml" {
        if let Ok(v) = toml::from_str::<Settings>(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported settings format"))
}
