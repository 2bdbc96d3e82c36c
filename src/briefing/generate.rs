// src/briefing/generate.rs
//! The `briefing` job: gather today's articles, prompt the model, parse the
//! labelled reply and write `<briefings_dir>/<YYYY-MM-DD>.md`.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::fields::{parse_fields, BriefingField};
use super::model::{BriefingModel, GeminiModel, ModelError};
use super::{aggregate, Briefing, BriefingMeta};
use crate::config::{BriefingCfg, SiteConfig};
use crate::corpus::{self, Article};
use crate::ingest::store::write_atomic;

pub const SYSTEM_PROMPT: &str = "You are an AI financial analyst for the Molt Street Journal. \
Synthesize today's articles into a structured daily market briefing.

Rules:
- Neutral, factual tone, no speculation or opinion
- Summarize trends, don't repeat individual articles
- Highlight cross-cutting themes and sector connections
- Be concise but comprehensive
";

const DEFAULT_HEADLINE: &str = "Daily Market Briefing";

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("briefing_attempts_total", "Model calls made by the briefing job.");
        describe_counter!(
            "briefing_rate_limited_total",
            "Model calls rejected with a rate-limit signal."
        );
    });
}

/// Prompt body: per-category article digest followed by the labelled layout.
pub fn build_prompt(articles: &[&Article], today: &str) -> String {
    let mut by_category: BTreeMap<&str, Vec<&Article>> = BTreeMap::new();
    for a in articles {
        by_category.entry(a.category.as_str()).or_default().push(a);
    }
    let (_, sentiments) = aggregate(articles);

    let mut out = String::new();
    let _ = writeln!(out, "Today's date: {today}");
    let _ = writeln!(out, "Total articles: {}", articles.len());
    let cats: Vec<String> = by_category
        .iter()
        .map(|(k, v)| format!("{k} ({})", v.len()))
        .collect();
    let _ = writeln!(out, "Categories: {}", cats.join(", "));
    let sents: Vec<String> = sentiments.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    let _ = writeln!(out, "Sentiment breakdown: {}", sents.join(", "));
    out.push_str("\nArticles by category:\n\n");

    for (category, list) in &by_category {
        let _ = writeln!(out, "### {}", category.to_uppercase());
        for a in list {
            let entities = if a.entities.is_empty() {
                "none".to_string()
            } else {
                a.entities
                    .iter()
                    .map(|e| e.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let _ = writeln!(out, "- [{}/{}] {}", a.sentiment, a.impact, a.title);
            let _ = writeln!(out, "  Summary: {}", a.summary);
            let _ = writeln!(out, "  Entities: {entities}");
        }
        out.push('\n');
    }

    out.push_str(
        "Generate a daily market briefing with these exact sections.
Each section label must appear on its own line followed by a colon and the value.
For multi-line sections, put the label:value on one line, then content below.

OVERALL_SENTIMENT: <bullish|bearish|neutral|mixed>
CONFIDENCE: <low|medium|high>
HEADLINE: <single-line headline summarizing today's market>

MARKET_OVERVIEW:
<2-3 paragraph overview of today's market activity>

KEY_MOVERS:
<bullet list of stocks/assets/sectors with notable movement>

SECTOR_HIGHLIGHTS:
<bullet list of sector-specific developments>

MACRO_SIGNALS:
<bullet list of macroeconomic indicators and policy signals>

WATCH_LIST:
<bullet list of things to watch tomorrow/this week>

AGENT_NOTES:
<structured notes useful for AI agents: key data points, thresholds, dates>",
    );
    out
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait after the n-th rate-limited attempt is `backoff * n`.
    pub backoff: Duration,
}

impl From<&BriefingCfg> for RetryPolicy {
    fn from(cfg: &BriefingCfg) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            backoff: Duration::from_secs(cfg.backoff_secs),
        }
    }
}

/// Call the model, retrying only on rate limiting. Any other error returns at once.
pub async fn generate_with_retry(
    model: &dyn BriefingModel,
    system: &str,
    prompt: &str,
    policy: RetryPolicy,
) -> Result<String, ModelError> {
    ensure_metrics_described();
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        counter!("briefing_attempts_total").increment(1);
        match model.generate(system, prompt).await {
            Ok(text) => return Ok(text),
            Err(e) if e.is_rate_limited() && attempt < policy.max_attempts => {
                counter!("briefing_rate_limited_total").increment(1);
                let wait = policy.backoff * attempt;
                tracing::warn!(
                    target: "briefing",
                    attempt,
                    max = policy.max_attempts,
                    wait_secs = wait.as_secs(),
                    "rate limited, backing off"
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => {
                if e.is_rate_limited() {
                    counter!("briefing_rate_limited_total").increment(1);
                }
                return Err(e);
            }
        }
    }
}

/// Turn a model reply into a briefing document. Fails when no label was found.
pub fn compose_briefing(
    text: &str,
    articles: &[&Article],
    now: DateTime<Utc>,
    generator: &str,
) -> Result<Briefing> {
    let fields = parse_fields(text);
    if fields.is_empty() {
        bail!("model reply contained none of the expected section labels");
    }
    let missing = fields.missing();
    let (category_breakdown, sentiment_breakdown) = aggregate(articles);

    let single = |f: BriefingField, default: &str| {
        fields.text(f).unwrap_or(default).to_string()
    };

    let meta = BriefingMeta {
        date: now.date_naive(),
        generated_at: now,
        article_count: articles.len(),
        overall_sentiment: single(BriefingField::OverallSentiment, "neutral").to_lowercase(),
        confidence: single(BriefingField::Confidence, "low").to_lowercase(),
        headline: single(BriefingField::Headline, DEFAULT_HEADLINE),
        category_breakdown,
        sentiment_breakdown,
        generator: generator.to_string(),
        partial: !missing.is_empty(),
        missing_sections: missing.iter().map(|f| f.label().to_string()).collect(),
    };

    let sections = BriefingField::SECTIONS
        .into_iter()
        .filter_map(|f| fields.text(f).map(|v| (f, v.to_string())))
        .collect();

    Ok(Briefing {
        meta,
        sections,
        source_path: None,
    })
}

pub fn save(dir: &Path, briefing: &Briefing) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(briefing.file_name());
    write_atomic(&path, briefing.to_markdown()?.as_bytes())?;
    Ok(path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BriefingOutcome {
    /// No articles dated today.
    Skipped,
    Saved(PathBuf),
    /// The model call or its reply failed; nothing was written.
    Failed(String),
}

/// Today's articles live under `<content_dir>/YYYY/MM/DD/`.
fn todays_articles(content_dir: &Path, now: DateTime<Utc>) -> Result<Vec<Article>> {
    let dir = content_dir.join(now.format("%Y/%m/%d").to_string());
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    corpus::load_articles(&dir).with_context(|| format!("loading articles from {}", dir.display()))
}

/// Run the daily briefing job.
///
/// `make_model` is only called once there is something to summarize, so a
/// day without articles never needs credentials. Its error (missing API key)
/// is returned as-is; model failures are logged and reported as
/// [`BriefingOutcome::Failed`].
pub async fn run<F>(cfg: &SiteConfig, now: DateTime<Utc>, make_model: F) -> Result<BriefingOutcome>
where
    F: FnOnce(&BriefingCfg) -> Result<Box<dyn BriefingModel>>,
{
    let articles = todays_articles(&cfg.paths.content_dir, now)?;
    if articles.is_empty() {
        tracing::info!(target: "briefing", "no articles today, skipping briefing");
        return Ok(BriefingOutcome::Skipped);
    }
    let refs: Vec<&Article> = articles.iter().collect();
    tracing::info!(target: "briefing", count = refs.len(), "generating briefing");

    let model = make_model(&cfg.briefing)?;
    let prompt = build_prompt(&refs, &now.format("%Y-%m-%d").to_string());

    let text = match generate_with_retry(
        model.as_ref(),
        SYSTEM_PROMPT,
        &prompt,
        RetryPolicy::from(&cfg.briefing),
    )
    .await
    {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(target: "briefing", error = %e, "briefing generation failed");
            return Ok(BriefingOutcome::Failed(e.to_string()));
        }
    };

    let briefing = match compose_briefing(&text, &refs, now, model.name()) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(target: "briefing", error = %e, "unusable model reply, nothing written");
            return Ok(BriefingOutcome::Failed(e.to_string()));
        }
    };
    if briefing.meta.partial {
        tracing::warn!(
            target: "briefing",
            missing = ?briefing.meta.missing_sections,
            "briefing is partial"
        );
    }

    let path = save(&cfg.paths.briefings_dir, &briefing)?;
    tracing::info!(target: "briefing", path = %path.display(), "saved briefing");
    Ok(BriefingOutcome::Saved(path))
}

/// Default model factory: Gemini with the key from the environment.
pub fn gemini_from_env(cfg: &BriefingCfg) -> Result<Box<dyn BriefingModel>> {
    Ok(Box::new(GeminiModel::from_env(&cfg.model, cfg.max_output_tokens)?))
}
