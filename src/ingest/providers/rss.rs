// src/ingest/providers/rss.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::types::{FeedConfig, FeedEntry, FeedSource};

// ---- RSS 2.0 ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

// ---- Atom ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: Option<String>,
    title: Option<String>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    summary: Option<String>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// RSS 2.0 / Atom feed source. Fixture mode parses a stored document and
/// never touches the network.
pub struct RssFeed {
    feed: FeedConfig,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

impl RssFeed {
    pub fn from_fixture(feed: FeedConfig, xml: &str) -> Self {
        Self {
            feed,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(feed: FeedConfig, client: reqwest::Client) -> Self {
        Self {
            feed,
            mode: Mode::Http { client },
        }
    }

    /// Parse an RSS 2.0 or Atom document into entries, keeping document order.
    pub fn parse_entries(xml: &str) -> Result<Vec<FeedEntry>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(xml);

        let out = if xml_clean.contains("<rss") {
            let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
            rss.channel
                .item
                .into_iter()
                .map(|it| FeedEntry {
                    id: non_empty(it.guid),
                    link: non_empty(it.link),
                    title: non_empty(it.title),
                    summary: non_empty(it.description),
                    published: it.pub_date.as_deref().and_then(parse_rfc2822),
                })
                .collect::<Vec<_>>()
        } else if xml_clean.contains("<feed") {
            let atom: AtomFeed = from_str(&xml_clean).context("parsing atom xml")?;
            atom.entry
                .into_iter()
                .map(|e| {
                    let link = e
                        .link
                        .iter()
                        .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
                        .or_else(|| e.link.first())
                        .and_then(|l| l.href.clone());
                    FeedEntry {
                        id: non_empty(e.id),
                        link: non_empty(link),
                        title: non_empty(e.title),
                        summary: non_empty(e.summary),
                        published: e
                            .published
                            .as_deref()
                            .or(e.updated.as_deref())
                            .and_then(parse_rfc3339),
                    }
                })
                .collect::<Vec<_>>()
        } else {
            bail!("document is neither RSS nor Atom");
        };

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        counter!("ingest_entries_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for RssFeed {
    async fn fetch_latest(&self) -> Result<Vec<FeedEntry>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_entries(s),
            Mode::Http { client } => {
                let t0 = std::time::Instant::now();
                let body = client
                    .get(&self.feed.url)
                    .send()
                    .await
                    .with_context(|| format!("GET {}", self.feed.url))?
                    .error_for_status()
                    .with_context(|| format!("non-2xx from {}", self.feed.url))?
                    .text()
                    .await
                    .context("reading feed body")?;
                histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                Self::parse_entries(&body)
            }
        }
    }

    fn feed(&self) -> &FeedConfig {
        &self.feed
    }
}

/// HTML entities that feeds routinely emit but XML does not define.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
