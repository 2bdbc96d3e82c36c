// src/briefing/mod.rs
//! Daily market briefings: one markdown file per day with a YAML header of
//! aggregates and a body of `## <Section>` blocks.

pub mod fields;
pub mod generate;
pub mod model;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::corpus::frontmatter::{self, FrontmatterSplit};
use crate::corpus::Article;
use fields::BriefingField;

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingMeta {
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub article_count: usize,
    pub overall_sentiment: String,
    pub confidence: String,
    pub headline: String,
    #[serde(default)]
    pub category_breakdown: BTreeMap<String, usize>,
    #[serde(default)]
    pub sentiment_breakdown: BTreeMap<String, usize>,
    #[serde(default)]
    pub generator: String,
    /// Set when the model skipped requested sections.
    #[serde(default, skip_serializing_if = "is_false")]
    pub partial: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Briefing {
    pub meta: BriefingMeta,
    /// Non-empty multi-line sections in body order.
    pub sections: Vec<(BriefingField, String)>,
    pub source_path: Option<PathBuf>,
}

impl Briefing {
    pub fn section(&self, field: BriefingField) -> Option<&str> {
        self.sections
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn body_md(&self) -> String {
        self.sections
            .iter()
            .map(|(f, v)| format!("## {}\n\n{}", f.title(), v))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn to_markdown(&self) -> Result<String> {
        let header = serde_yaml::to_string(&self.meta).context("serializing briefing header")?;
        Ok(format!("---\n{header}---\n\n{}\n", self.body_md()))
    }

    pub fn from_markdown(text: &str, path: &Path) -> Result<Self> {
        let (header, body) = match frontmatter::split(text) {
            FrontmatterSplit::Found { header, body } => (header, body),
            _ => bail!("{}: briefing without frontmatter", path.display()),
        };
        let meta: BriefingMeta = serde_yaml::from_str(header)
            .with_context(|| format!("{}: invalid briefing header", path.display()))?;
        Ok(Self {
            meta,
            sections: parse_body_sections(body),
            source_path: Some(path.to_path_buf()),
        })
    }

    /// `<dir>/<YYYY-MM-DD>.md`
    pub fn file_name(&self) -> String {
        format!("{}.md", self.meta.date.format("%Y-%m-%d"))
    }
}

/// Split a briefing body on `## ` headings that name a known section.
fn parse_body_sections(body: &str) -> Vec<(BriefingField, String)> {
    let mut out: Vec<(BriefingField, Vec<&str>)> = Vec::new();
    for line in body.lines() {
        if let Some(title) = line.strip_prefix("## ") {
            if let Some(field) = BriefingField::from_title(title) {
                out.push((field, Vec::new()));
                continue;
            }
        }
        if let Some((_, buf)) = out.last_mut() {
            buf.push(line);
        }
    }
    out.into_iter()
        .map(|(f, lines)| (f, lines.join("\n").trim().to_string()))
        .filter(|(_, v)| !v.is_empty())
        .collect()
}

/// Per-category and per-sentiment article counts.
pub fn aggregate(articles: &[&Article]) -> (BTreeMap<String, usize>, BTreeMap<String, usize>) {
    let mut by_category = BTreeMap::new();
    let mut by_sentiment = BTreeMap::new();
    for a in articles {
        *by_category.entry(a.category.clone()).or_insert(0) += 1;
        *by_sentiment.entry(a.sentiment.to_string()).or_insert(0) += 1;
    }
    (by_category, by_sentiment)
}

/// Most recent briefing by file-name date, if any.
pub fn load_latest(dir: &Path) -> Result<Option<Briefing>> {
    if !dir.exists() {
        return Ok(None);
    }
    let mut latest: Option<(NaiveDate, PathBuf)> = None;
    for e in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = e?.path();
        if path.extension().and_then(|x| x.to_str()) != Some("md") {
            continue;
        }
        let Some(day) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        else {
            continue;
        };
        if latest.as_ref().map_or(true, |(d, _)| day > *d) {
            latest = Some((day, path));
        }
    }
    let Some((_, path)) = latest else {
        return Ok(None);
    };
    let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    Briefing::from_markdown(&text, &path).map(Some)
}
