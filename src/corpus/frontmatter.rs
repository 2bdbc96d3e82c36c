// src/corpus/frontmatter.rs
//! Frontmatter splitting, the article header schema and date coercion.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DELIMITER: &str = "---";

/// Split `---\n<header>\n---\n<body>` once into header and body.
pub fn split(text: &str) -> FrontmatterSplit<'_> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = text.strip_prefix(DELIMITER) else {
        return FrontmatterSplit::Absent;
    };
    // The closing delimiter must start a line.
    match rest.find("\n---") {
        Some(idx) => {
            let header = &rest[..idx];
            let after = &rest[idx + 4..];
            // Drop the remainder of the delimiter line.
            let body = after.split_once('\n').map(|(_, b)| b).unwrap_or("");
            FrontmatterSplit::Found { header, body }
        }
        None => FrontmatterSplit::Unterminated,
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum FrontmatterSplit<'a> {
    Absent,
    Unterminated,
    Found { header: &'a str, body: &'a str },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    #[default]
    Neutral,
    Bullish,
    Bearish,
    Mixed,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Neutral => "neutral",
            Sentiment::Bullish => "bullish",
            Sentiment::Bearish => "bearish",
            Sentiment::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    #[default]
    Low,
    Medium,
    High,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named entity mentioned by an article. Accepts `{name, type}` or a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntityRepr")]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntityRepr {
    Full {
        name: String,
        #[serde(rename = "type", default)]
        kind: String,
    },
    Bare(String),
}

impl From<EntityRepr> for Entity {
    fn from(r: EntityRepr) -> Self {
        match r {
            EntityRepr::Full { name, kind } => Entity { name, kind },
            EntityRepr::Bare(name) => Entity {
                name,
                kind: String::new(),
            },
        }
    }
}

/// Source citation: a bare URL or a named link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceRef {
    Url(String),
    Link {
        #[serde(alias = "title", default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        url: String,
    },
}

impl SourceRef {
    pub fn url(&self) -> &str {
        match self {
            SourceRef::Url(u) => u,
            SourceRef::Link { url, .. } => url,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SourceRef::Url(u) => u,
            SourceRef::Link { name, url } => name.as_deref().unwrap_or(url),
        }
    }
}

fn default_category() -> String {
    "general".into()
}
fn default_reporter() -> String {
    "unknown".into()
}
fn default_content_type() -> String {
    "brief".into()
}

/// Article header. `title`, `slug` and `date` are required; every other
/// field has a documented default.
#[derive(Debug, Clone, Deserialize)]
pub struct FrontMatter {
    pub title: String,
    pub slug: String,
    /// ISO-8601 timestamp, optionally with a literal `Z`; date-only is midnight UTC.
    pub date: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_reporter")]
    pub reporter: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub sentiment: Sentiment,
    #[serde(default)]
    pub impact: Impact,
    #[serde(default)]
    pub subcategory: String,
}

/// Coerce a frontmatter date into a timestamp that keeps its UTC offset.
/// Naive timestamps and bare dates are taken as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    let utc = FixedOffset::east_opt(0)?;
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    let no_z = s.strip_suffix('Z').unwrap_or(s);
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(no_z, fmt) {
            return Some(Utc.from_utc_datetime(&naive).with_timezone(&utc));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(&utc))
}
