//! AI adapter: provider abstraction for the generative scorer, plus a daily
//! request budget. Any failure in here — transport, malformed output, budget —
//! surfaces as `ScorerUnavailable` and the caller falls back to the rule
//! scorer; partial or corrupt model output is never returned.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use std::{env, fs};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{clamp_score, AnalysisResult, EngagementLevel, QualityLevel};
use crate::analyze::heuristic::DEFAULT_CATEGORY;
use crate::analyze::summary::{extract_tags, summarize, MAX_TAGS, SUMMARY_MAX_CHARS};
use crate::analyze::{Scorer, ScorerStack, ScorerUnavailable};
use crate::content::ContentRecord;

/// Characters of body text embedded into the prompt.
const PROMPT_EXCERPT_CHARS: usize = 1000;

const DEFAULT_DAILY_LIMIT: u32 = 20;

// ------------------------------------------------------------
// Config
// ------------------------------------------------------------

/// Loaded from `config/ai.json`. Absent or unreadable config disables the
/// generative path entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    /// "openai" | "claude" (claude is stubbed for now)
    pub provider: Option<String>,
    /// Per-day real-call limit; defaults to 20 if absent.
    pub daily_limit: Option<u32>,
    /// "ENV" (or absent) reads OPENAI_API_KEY / CLAUDE_API_KEY by provider.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: None,
            daily_limit: Some(DEFAULT_DAILY_LIMIT),
            api_key: None,
        }
    }
}

/// Load config from `config/ai.json`. If reading/parsing fails, returns
/// `AiConfig::default()`.
pub fn load_ai_config() -> AiConfig {
    let path = Path::new("config/ai.json");
    match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
        Err(_) => AiConfig::default(),
    }
}

impl AiConfig {
    /// Resolve the effective API key: explicit value, or the provider's env
    /// var when set to "ENV"/absent. Empty means "not available".
    pub fn resolve_api_key(&self) -> String {
        match self.api_key.as_deref() {
            Some(k) if !k.trim().eq_ignore_ascii_case("env") => k.to_string(),
            _ => {
                let var = match self.provider.as_deref() {
                    Some("claude") => "CLAUDE_API_KEY",
                    _ => "OPENAI_API_KEY",
                };
                env::var(var).unwrap_or_default()
            }
        }
    }
}

// ------------------------------------------------------------
// Provider abstraction + concrete providers
// ------------------------------------------------------------

/// Low-level provider: does one remote completion call and returns the raw
/// model text. Separated from the scorer so tests can inject canned output.
pub trait Provider: Send + Sync + 'static {
    fn fetch<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

/// OpenAI provider (Chat Completions API).
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    /// `model_override`: pass Some("gpt-4o-mini") to override; defaults to gpt-4o-mini.
    pub fn new(api_key: String, model_override: Option<&str>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("smart-content-tracker/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        let model = model_override.unwrap_or("gpt-4o-mini").to_string();
        Self {
            http,
            api_key,
            model,
        }
    }
}

impl Provider for OpenAiProvider {
    fn fetch<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                return None;
            }

            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                messages: Vec<Msg<'a>>,
                temperature: f32,
                max_tokens: u32,
            }
            #[derive(Deserialize)]
            struct Resp {
                choices: Vec<Choice>,
            }
            #[derive(Deserialize)]
            struct Choice {
                message: ChoiceMsg,
            }
            #[derive(Deserialize)]
            struct ChoiceMsg {
                content: String,
            }

            let req = Req {
                model: &self.model,
                messages: vec![Msg {
                    role: "user",
                    content: prompt,
                }],
                temperature: 0.3,
                max_tokens: 300,
            };

            let resp = self
                .http
                .post("https://api.openai.com/v1/chat/completions")
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .ok()?;

            if !resp.status().is_success() {
                return None;
            }
            let body: Resp = resp.json().await.ok()?;
            let content = body.choices.first().map(|c| c.message.content.trim())?;
            if content.is_empty() {
                None
            } else {
                Some(content.to_string())
            }
        })
    }
    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Fixed-output provider for tests/local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl Provider for MockProvider {
    fn fetch<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { Some(out) })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Returns `None` always; used to exercise the unavailable path in tests.
pub struct FailingProvider;

impl Provider for FailingProvider {
    fn fetch<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async { None })
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

// ------------------------------------------------------------
// Daily budget
// ------------------------------------------------------------

/// Counts real provider calls per UTC day. Exhausted budget reads as
/// provider-unavailable, not as an error.
#[derive(Debug)]
struct DailyBudget {
    max: u32,
    state: Mutex<(NaiveDate, u32)>,
}

impl DailyBudget {
    fn new(max: u32) -> Self {
        Self {
            max,
            state: Mutex::new((Utc::now().date_naive(), 0)),
        }
    }

    fn exhausted(&self) -> bool {
        let mut g = self.state.lock().expect("budget mutex poisoned");
        let today = Utc::now().date_naive();
        if g.0 != today {
            *g = (today, 0);
        }
        g.1 >= self.max
    }

    /// Increment after a successful real call only.
    fn record_call(&self) {
        let mut g = self.state.lock().expect("budget mutex poisoned");
        g.1 = g.1.saturating_add(1);
    }
}

// ------------------------------------------------------------
// Generative scorer
// ------------------------------------------------------------

/// Expected model reply. `score` and `shouldSave` are mandatory — a reply
/// missing either counts as malformed. The rest falls back to rule-computed
/// values.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelReply {
    score: u32,
    should_save: bool,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    category: Option<String>,
}

pub struct GenerativeScorer {
    provider: Box<dyn Provider>,
    budget: DailyBudget,
}

impl GenerativeScorer {
    pub fn new(provider: Box<dyn Provider>, daily_limit: u32) -> Self {
        Self {
            provider,
            budget: DailyBudget::new(daily_limit),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}

#[async_trait::async_trait]
impl Scorer for GenerativeScorer {
    async fn score(&self, record: &ContentRecord) -> Result<AnalysisResult, ScorerUnavailable> {
        if self.budget.exhausted() {
            return Err(ScorerUnavailable::new("daily request budget exhausted"));
        }

        let prompt = build_prompt(record);
        let raw = self
            .provider
            .fetch(&prompt)
            .await
            .ok_or_else(|| ScorerUnavailable::new("provider returned no output"))?;
        self.budget.record_call();

        let reply = parse_model_reply(&raw)
            .ok_or_else(|| ScorerUnavailable::new("malformed model output"))?;
        Ok(compose_result(record, reply))
    }

    fn name(&self) -> &'static str {
        self.provider.name()
    }
}

/// Factory: build the full scorer stack according to config and environment.
///
/// * If `AI_TEST_MODE=mock`, wires a deterministic mock provider.
/// * Else if disabled, or no usable API key, rule scoring only.
/// * Else builds the real provider (OpenAI); claude is stubbed for now.
pub fn build_scorer_stack(config: &AiConfig) -> ScorerStack {
    let daily_limit = config.daily_limit.unwrap_or(DEFAULT_DAILY_LIMIT);

    if env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        let mock = MockProvider {
            fixed: r#"{"score": 50, "shouldSave": true, "summary": "Neutral hint (mock)", "tags": [], "category": "general"}"#
                .to_string(),
        };
        let scorer = GenerativeScorer::new(Box::new(mock), daily_limit);
        return ScorerStack::new(Some(Arc::new(scorer)));
    }

    if !config.enabled {
        return ScorerStack::heuristic_only();
    }

    match config.provider.as_deref() {
        Some("openai") => {
            let key = config.resolve_api_key();
            if key.is_empty() {
                tracing::warn!("generative scorer enabled but no API key available");
                return ScorerStack::heuristic_only();
            }
            let provider = OpenAiProvider::new(key, None);
            let scorer = GenerativeScorer::new(Box::new(provider), daily_limit);
            ScorerStack::new(Some(Arc::new(scorer)))
        }
        _ => ScorerStack::heuristic_only(),
    }
}

fn build_prompt(record: &ContentRecord) -> String {
    let excerpt: String = record
        .content
        .as_deref()
        .unwrap_or("No content")
        .chars()
        .take(PROMPT_EXCERPT_CHARS)
        .collect();

    format!(
        "Analyze this content and provide a JSON response:\n\
         Title: \"{}\"\n\
         Domain: \"{}\"\n\
         Content: \"{}\"\n\
         Time spent: {} seconds\n\n\
         Please provide:\n\
         1. Quality score (0-100)\n\
         2. Should save (true/false)\n\
         3. 2-3 sentence summary\n\
         4. 3-5 relevant tags\n\
         5. Content category\n\n\
         Response format: {{\"score\": number, \"shouldSave\": boolean, \
         \"summary\": \"text\", \"tags\": [\"tag1\", \"tag2\"], \"category\": \"category\"}}",
        record.title, record.domain, excerpt, record.time_spent
    )
}

/// Models wrap JSON in fences or prose at times; parse the outermost braces.
fn parse_model_reply(raw: &str) -> Option<ModelReply> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

fn compose_result(record: &ContentRecord, reply: ModelReply) -> AnalysisResult {
    let content = record.content.as_deref().unwrap_or("");

    let summary = match reply.summary {
        Some(s) if !s.trim().is_empty() => sanitize_summary(&s),
        _ => summarize(content),
    };
    let tags = match reply.tags {
        Some(t) if !t.is_empty() => sanitize_tags(t),
        _ => extract_tags(content, &record.title),
    };
    let category = reply
        .category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    AnalysisResult {
        score: clamp_score(reply.score),
        should_save: reply.should_save,
        summary,
        tags,
        category,
        content_quality: QualityLevel::from_model_score(reply.score),
        engagement_level: EngagementLevel::from_time_spent(record.time_spent),
        generated_by_model: true,
    }
}

/// Single line, collapsed whitespace, capped at the summary limit.
fn sanitize_summary(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(SUMMARY_MAX_CHARS));
    let mut count = 0usize;
    let mut prev_space = false;
    for ch in input.chars() {
        let c = if ch.is_whitespace() { ' ' } else { ch };
        if c == ' ' {
            if !prev_space && !out.is_empty() {
                out.push(' ');
                count += 1;
            }
            prev_space = true;
        } else {
            out.push(c);
            count += 1;
            prev_space = false;
        }
        if count >= SUMMARY_MAX_CHARS {
            break;
        }
    }
    out.trim_end().to_string()
}

fn sanitize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(MAX_TAGS);
    for t in tags {
        let t = t.trim().to_lowercase();
        if t.is_empty() || out.contains(&t) {
            continue;
        }
        out.push(t);
        if out.len() == MAX_TAGS {
            break;
        }
    }
    out
}
