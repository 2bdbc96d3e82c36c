// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry as parsed from a feed document, before identity and filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub id: Option<String>, // RSS guid / Atom id
    pub link: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

/// Accepted item written to a batch file. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub id: String,
    pub feed: String,
    pub category: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

/// A configured feed: where to fetch and how to label what comes back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_category")]
    pub category: String,
}

pub(crate) fn default_category() -> String {
    "general".to_string()
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Entries in document order (most recent first for well-behaved feeds).
    async fn fetch_latest(&self) -> Result<Vec<FeedEntry>>;
    fn feed(&self) -> &FeedConfig;

    fn name(&self) -> &str {
        &self.feed().name
    }
}

/// Per-feed outcome of one ingestion run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FeedSummary {
    pub feed: String,
    pub new: usize,
    pub seen: usize,
    pub filtered: usize,
    pub error: Option<String>,
}
