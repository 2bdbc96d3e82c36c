// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod store;
pub mod types;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::config::{IngestCfg, SiteConfig};
use crate::ingest::providers::rss::RssFeed;
use crate::ingest::store::IngestStore;
use crate::ingest::types::{FeedConfig, FeedEntry, FeedItem, FeedSource, FeedSummary};
use crate::relevance::NoiseFilter;

/// One-time metrics registration (so series show up in the exported text).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_entries_total", "Total entries parsed from feeds.");
        describe_counter!("ingest_new_items_total", "Entries accepted as new items.");
        describe_counter!(
            "ingest_seen_total",
            "Entries skipped because their id was already processed."
        );
        describe_counter!(
            "ingest_filtered_total",
            "Entries dropped by the noise blocklist."
        );
        describe_counter!("ingest_feed_errors_total", "Feed fetch/parse errors.");
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_histogram!("ingest_fetch_ms", "Feed HTTP fetch time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when the ingest pipeline last ran."
        );
    });
}

/// Stable item identifier: first 16 hex chars of sha256("<feed>:<id|link|title>").
pub fn item_id(feed_name: &str, entry: &FeedEntry) -> String {
    let key = entry
        .id
        .as_deref()
        .or(entry.link.as_deref())
        .or(entry.title.as_deref())
        .unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(feed_name.as_bytes());
    hasher.update(b":");
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

/// Normalize feed text: decode entities, strip tags, collapse whitespace, cap length.
pub fn clean_text(s: &str, max_chars: usize) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap (chars, not bytes)
    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect::<String>().trim_end().to_string();
    }
    out
}

/// Result of one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub new_items: Vec<FeedItem>,
    pub batch_path: Option<PathBuf>,
    pub feeds: Vec<FeedSummary>,
    pub processed_total: usize,
}

/// Fetch every source once, keep unseen and relevant entries, write one batch
/// file when anything is new, then rewrite the processed set.
///
/// Ids are marked processed in memory as soon as an item is accepted; the set
/// is persisted only after the batch file is on disk, so a failed batch write
/// leaves the previous set untouched.
pub async fn run_once(
    sources: &[Box<dyn FeedSource>],
    store: &IngestStore,
    filter: &NoiseFilter,
    cfg: &IngestCfg,
    now: DateTime<Utc>,
) -> Result<IngestReport> {
    ensure_metrics_described();

    let mut processed = store.load_processed()?;
    let mut new_items = Vec::new();
    let mut feeds = Vec::with_capacity(sources.len());

    for src in sources {
        let feed = src.feed();
        tracing::info!(target: "ingest", feed = %feed.name, "fetching");
        let mut summary = FeedSummary {
            feed: feed.name.clone(),
            ..FeedSummary::default()
        };

        let entries = match src.fetch_latest().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, feed = %feed.name, "feed error, skipped");
                counter!("ingest_feed_errors_total").increment(1);
                summary.error = Some(format!("{e:#}"));
                feeds.push(summary);
                continue;
            }
        };

        for entry in entries.into_iter().take(cfg.per_feed_cap) {
            let id = item_id(&feed.name, &entry);
            if processed.contains(&id) {
                summary.seen += 1;
                continue;
            }

            let title = clean_text(entry.title.as_deref().unwrap_or_default(), usize::MAX);
            let item_summary = clean_text(
                entry.summary.as_deref().unwrap_or_default(),
                cfg.summary_max_chars,
            );
            if let Some(term) = filter.blocked_term(&title, &item_summary, &feed.category) {
                tracing::debug!(target: "ingest", feed = %feed.name, %term, %title, "noise filtered");
                summary.filtered += 1;
                continue;
            }

            new_items.push(build_item(id.clone(), feed, entry, title, item_summary, now));
            processed.insert(id);
            summary.new += 1;
        }

        tracing::info!(
            target: "ingest",
            feed = %feed.name,
            new = summary.new,
            seen = summary.seen,
            filtered = summary.filtered,
            "feed done"
        );
        counter!("ingest_new_items_total").increment(summary.new as u64);
        counter!("ingest_seen_total").increment(summary.seen as u64);
        counter!("ingest_filtered_total").increment(summary.filtered as u64);
        feeds.push(summary);
    }

    let batch_path = if new_items.is_empty() {
        tracing::info!(target: "ingest", "no new items found");
        None
    } else {
        let p = store.write_batch(&new_items, now)?;
        tracing::info!(target: "ingest", count = new_items.len(), path = %p.display(), "batch saved");
        Some(p)
    };

    // Always rewritten, even with nothing new.
    store.save_processed(&processed)?;
    gauge!("ingest_pipeline_last_run_ts").set(now.timestamp() as f64);

    Ok(IngestReport {
        new_items,
        batch_path,
        feeds,
        processed_total: processed.len(),
    })
}

fn build_item(
    id: String,
    feed: &FeedConfig,
    entry: FeedEntry,
    title: String,
    summary: String,
    now: DateTime<Utc>,
) -> FeedItem {
    FeedItem {
        id,
        feed: feed.name.clone(),
        category: feed.category.clone(),
        title,
        link: entry.link.unwrap_or_default(),
        summary,
        published: entry.published,
        fetched_at: now,
    }
}

/// HTTP sources for every configured feed, sharing one client.
pub fn http_sources(feeds: Vec<FeedConfig>) -> Result<Vec<Box<dyn FeedSource>>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!(
            "molt-street-journal/",
            env!("CARGO_PKG_VERSION"),
            " (+https://moltstreetjournal.com)"
        ))
        .build()
        .context("building http client")?;
    Ok(feeds
        .into_iter()
        .map(|f| Box::new(RssFeed::from_url(f, client.clone())) as Box<dyn FeedSource>)
        .collect())
}

/// Feed list for the `fetch` job. An explicit `--feeds` path is used as-is;
/// otherwise `$MSJ_FEEDS_PATH`, then the configured path.
pub fn select_feeds(cfg: &SiteConfig, explicit: Option<&Path>) -> Result<Vec<FeedConfig>> {
    match explicit {
        Some(path) => config::load_feeds_from(path),
        None => config::load_feeds_default(&cfg.paths.feeds_file),
    }
}

/// The `fetch` job: load the feed list and run one ingestion pass over HTTP.
pub async fn run_from_config(cfg: &SiteConfig, feeds: Option<&Path>) -> Result<IngestReport> {
    let feeds = select_feeds(cfg, feeds)?;
    let sources = http_sources(feeds)?;
    let filter = NoiseFilter::from_patterns(&cfg.ingest.noise_patterns)?;
    let store = IngestStore::new(cfg.paths.processed_file(), cfg.paths.rss_raw_dir());
    run_once(&sources, &store, &filter, &cfg.ingest, Utc::now()).await
}
