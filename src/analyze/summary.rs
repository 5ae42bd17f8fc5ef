//! Text-processing helpers for the rule scorer: sentence-based summaries and
//! frequency-based tag extraction. Both are pure and reproducible bit-for-bit
//! for identical input.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Summaries are cut at this many characters (ellipsis appended when cut).
pub const SUMMARY_MAX_CHARS: usize = 200;

/// Sentence fragments this short (after trimming) are discarded.
const MIN_FRAGMENT_CHARS: usize = 20;

/// Tags returned per item, highest frequency first.
pub const MAX_TAGS: usize = 5;

/// Word tokens shorter than 4 chars never become tags.
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w{4,}\b").unwrap());

const STOP_WORDS: [&str; 14] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// First three qualifying sentences, joined and capped at 200 chars.
/// Empty or absent content yields an empty string.
pub fn summarize(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let fragments: Vec<&str> = content
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_FRAGMENT_CHARS)
        .take(3)
        .collect();

    let summary = fragments.join(". ");
    if summary.chars().count() > SUMMARY_MAX_CHARS {
        let cut: String = summary.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{cut}...")
    } else {
        summary
    }
}

/// Top 5 most frequent word tokens (length >= 4, stop words removed) from the
/// lowercased title + content. Ties keep first-encountered order.
pub fn extract_tags(content: &str, title: &str) -> Vec<String> {
    let text = format!("{title} {content}").to_lowercase();

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();

    for m in WORD_RE.find_iter(&text) {
        let word = m.as_str();
        if STOP_WORDS.contains(&word) {
            continue;
        }
        match counts.get_mut(word) {
            Some(n) => *n += 1,
            None => {
                counts.insert(word.to_string(), 1);
                first_seen.push(word.to_string());
            }
        }
    }

    let mut ranked: Vec<(String, usize)> = first_seen
        .into_iter()
        .map(|w| {
            let n = counts[&w];
            (w, n)
        })
        .collect();
    // Stable sort: ties keep first-encountered order.
    ranked.sort_by_key(|(_, n)| std::cmp::Reverse(*n));

    ranked
        .into_iter()
        .take(MAX_TAGS)
        .map(|(w, _)| w)
        .collect()
}
