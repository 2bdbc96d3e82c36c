// src/corpus/mod.rs
//! Article corpus: markdown files with YAML frontmatter under the content directory.

pub mod frontmatter;
pub mod markdown;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub use frontmatter::{Entity, Impact, Sentiment, SourceRef};
pub use markdown::Takeaway;

use frontmatter::{FrontMatter, FrontmatterSplit};

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("walking content directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{0}: frontmatter opened but never closed")]
    Unterminated(PathBuf),
    #[error("{path}: invalid frontmatter: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{path}: unparseable date `{value}`")]
    Date { path: PathBuf, value: String },
    #[error("{path}: empty required field `{field}`")]
    EmptyField { path: PathBuf, field: &'static str },
    #[error("{path}: `{field}` value `{value}` is not a single path segment")]
    UnsafeSegment {
        path: PathBuf,
        field: &'static str,
        value: String,
    },
    #[error("slug `{slug}` on {date_path} is used by both {first} and {second}")]
    DuplicateSlug {
        slug: String,
        date_path: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// A parsed article with its derived views.
#[derive(Debug, Clone)]
pub struct Article {
    pub title: String,
    pub slug: String,
    pub date: DateTime<FixedOffset>,
    pub reporter: String,
    pub category: String,
    pub subcategory: String,
    pub tags: Vec<String>,
    pub entities: Vec<Entity>,
    pub sentiment: Sentiment,
    pub impact: Impact,
    pub content_type: String,
    pub summary: String,
    pub sources: Vec<SourceRef>,
    pub body_md: String,
    pub html_body: String,
    pub key_takeaways: Vec<Takeaway>,
    pub source_path: PathBuf,
}

impl Article {
    /// `YYYY/MM/DD` in the article's own offset.
    pub fn date_path(&self) -> String {
        self.date.format("%Y/%m/%d").to_string()
    }

    /// `YYYY-MM-DD` in the article's own offset.
    pub fn day(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn iso_date(&self) -> String {
        self.date.to_rfc3339_opts(SecondsFormat::AutoSi, false)
    }

    /// RFC-822 style timestamp for RSS.
    pub fn rfc822_date(&self) -> String {
        self.date.format("%a, %d %b %Y %H:%M:%S %z").to_string()
    }

    pub fn display_date(&self) -> String {
        self.date.format("%B %-d, %Y").to_string()
    }

    /// Site-relative path without extension: `articles/YYYY/MM/DD/<slug>`.
    pub fn rel_path(&self) -> String {
        format!("articles/{}/{}", self.date_path(), self.slug)
    }

    pub fn url_html(&self, base: &str) -> String {
        format!("{base}/{}.html", self.rel_path())
    }

    pub fn url_md(&self, base: &str) -> String {
        format!("{base}/{}.md", self.rel_path())
    }
}

/// Slugs and categories become file names in the output tree.
fn is_path_segment(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('.')
        && !s.chars().any(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
}

/// Parse one article file. `Ok(None)` when the file carries no frontmatter.
pub fn parse_article(path: &Path) -> Result<Option<Article>, CorpusError> {
    let text = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_article_str(&text, path)
}

pub fn parse_article_str(text: &str, path: &Path) -> Result<Option<Article>, CorpusError> {
    let (header, body) = match frontmatter::split(text) {
        FrontmatterSplit::Absent => return Ok(None),
        FrontmatterSplit::Unterminated => {
            return Err(CorpusError::Unterminated(path.to_path_buf()))
        }
        FrontmatterSplit::Found { header, body } => (header, body),
    };

    let fm: FrontMatter = serde_yaml::from_str(header).map_err(|source| CorpusError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    for (field, value) in [("title", &fm.title), ("slug", &fm.slug), ("date", &fm.date)] {
        if value.trim().is_empty() {
            return Err(CorpusError::EmptyField {
                path: path.to_path_buf(),
                field,
            });
        }
    }

    for (field, value) in [("slug", fm.slug.trim()), ("category", fm.category.as_str())] {
        if !is_path_segment(value) {
            return Err(CorpusError::UnsafeSegment {
                path: path.to_path_buf(),
                field,
                value: value.to_string(),
            });
        }
    }

    let date = frontmatter::parse_date(&fm.date).ok_or_else(|| CorpusError::Date {
        path: path.to_path_buf(),
        value: fm.date.clone(),
    })?;

    let body_md = body.trim().to_string();
    Ok(Some(Article {
        title: fm.title.trim().to_string(),
        slug: fm.slug.trim().to_string(),
        date,
        reporter: fm.reporter,
        category: fm.category,
        subcategory: fm.subcategory,
        tags: fm.tags,
        entities: fm.entities,
        sentiment: fm.sentiment,
        impact: fm.impact,
        content_type: fm.content_type,
        summary: fm.summary.trim().to_string(),
        sources: fm.sources,
        html_body: markdown::render_html(&body_md),
        key_takeaways: markdown::extract_key_takeaways(&body_md),
        body_md,
        source_path: path.to_path_buf(),
    }))
}

/// Load every `*.md` under `dir`, newest first.
///
/// Any malformed article aborts the load. Two articles resolving to the same
/// `articles/<date>/<slug>` path are rejected instead of overwriting each other.
pub fn load_articles(dir: &Path) -> Result<Vec<Article>, CorpusError> {
    let mut articles = Vec::new();
    if !dir.exists() {
        tracing::warn!(target: "site", dir = %dir.display(), "content directory missing");
        return Ok(articles);
    }

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("md")
        {
            continue;
        }
        match parse_article(path)? {
            Some(a) => articles.push(a),
            None => {
                tracing::warn!(target: "site", path = %path.display(), "no frontmatter, skipped")
            }
        }
    }

    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for a in &articles {
        if let Some(first) = seen.insert(a.rel_path(), a.source_path.clone()) {
            return Err(CorpusError::DuplicateSlug {
                slug: a.slug.clone(),
                date_path: a.date_path(),
                first,
                second: a.source_path.clone(),
            });
        }
    }

    // Stable: equal timestamps keep file-name order.
    articles.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(articles)
}

/// Articles whose calendar date (in their own offset) is `day` (`YYYY-MM-DD`).
pub fn articles_on<'a>(articles: &'a [Article], day: &str) -> Vec<&'a Article> {
    articles.iter().filter(|a| a.day() == day).collect()
}
