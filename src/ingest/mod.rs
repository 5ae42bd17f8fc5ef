// src/ingest/mod.rs
//! Pre-queue hygiene for submitted records: text normalization and the
//! minimal validity check. Everything downstream (scoring, dedup, storage)
//! assumes records passed through here.

use anyhow::{bail, Result};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::content::ContentRecord;

/// Upper bound on body text; re-applied here even though the scraper caps at
/// the same value.
pub const MAX_CONTENT_CHARS: usize = 3000;

/// Normalize text: decode HTML entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

fn cap_chars(s: String, max: usize) -> String {
    if s.chars().count() > max {
        s.chars().take(max).collect()
    } else {
        s
    }
}

/// Normalize every textual field of a submission. Sentence punctuation is
/// left intact; the summarizer splits on it.
pub fn normalize_record(mut record: ContentRecord) -> ContentRecord {
    record.title = normalize_text(&record.title);
    record.domain = record.domain.trim().to_ascii_lowercase();

    if let Some(content) = record.content.take() {
        let content = cap_chars(normalize_text(&content), MAX_CONTENT_CHARS);
        if !content.is_empty() {
            record.content = Some(content);
        }
    }
    if let Some(author) = record.author.take() {
        let author = normalize_text(&author);
        if !author.is_empty() {
            record.author = Some(author);
        }
    }

    record
}

/// A record without a url or domain has no identity and cannot be deduped;
/// reject it before it reaches the queue.
pub fn validate_record(record: &ContentRecord) -> Result<()> {
    if record.url.trim().is_empty() {
        bail!("record has no url");
    }
    if record.domain.is_empty() {
        bail!("record has no domain");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentType;

    fn record_with(content: &str) -> ContentRecord {
        ContentRecord {
            title: " A&nbsp;Title ".into(),
            url: "https://example.com/a".into(),
            domain: " Example.COM ".into(),
            content: Some(content.into()),
            author: Some("  ".into()),
            content_type: ContentType::Article,
            time_spent: 0,
            timestamp: 0,
        }
    }

    #[test]
    fn normalize_decodes_strips_and_collapses() {
        let s = normalize_text("  Hello,&nbsp;&nbsp; <b>world</b>!  ");
        assert_eq!(s, "Hello, world!");
    }

    #[test]
    fn sentence_punctuation_survives_normalization() {
        let s = normalize_text("One sentence. Another one!");
        assert!(s.ends_with('!'));
        assert!(s.contains(". "));
    }

    #[test]
    fn record_fields_are_cleaned_and_capped() {
        let long = "y".repeat(MAX_CONTENT_CHARS + 500);
        let r = normalize_record(record_with(&long));
        assert_eq!(r.title, "A Title");
        assert_eq!(r.domain, "example.com");
        assert_eq!(r.content.as_ref().unwrap().chars().count(), MAX_CONTENT_CHARS);
        // Whitespace-only author collapses to absent.
        assert!(r.author.is_none());
    }

    #[test]
    fn empty_content_collapses_to_absent() {
        let r = normalize_record(record_with("   "));
        assert!(r.content.is_none());
    }

    #[test]
    fn records_without_identity_are_rejected() {
        let mut r = record_with("body");
        r = normalize_record(r);
        assert!(validate_record(&r).is_ok());
        r.url = "  ".into();
        assert!(validate_record(&r).is_err());
    }
}
