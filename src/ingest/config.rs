// src/ingest/config.rs
use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::FeedConfig;

const ENV_PATH: &str = "MSJ_FEEDS_PATH";

#[derive(serde::Deserialize)]
struct FeedsDoc {
    feeds: Vec<FeedConfig>,
}

/// Load the feed list from an explicit path. Supports YAML, TOML or JSON formats.
pub fn load_feeds_from(path: &Path) -> Result<Vec<FeedConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed list from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_feeds(&content, ext.as_str()).with_context(|| format!("in {}", path.display()))
}

/// Load the feed list using env var + fallbacks:
/// 1) $MSJ_FEEDS_PATH
/// 2) the configured path (usually `feeds.yml`)
pub fn load_feeds_default(configured: &Path) -> Result<Vec<FeedConfig>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_feeds_from(&pb);
        }
        return Err(anyhow!("{ENV_PATH} points to non-existent path"));
    }
    if configured.exists() {
        return load_feeds_from(configured);
    }
    Err(anyhow!("feed list not found at {}", configured.display()))
}

fn parse_feeds(s: &str, hint_ext: &str) -> Result<Vec<FeedConfig>> {
    let parsed = match hint_ext {
        "toml" => parse_toml(s),
        "json" => parse_json(s),
        "yml" | "yaml" => parse_yaml(s),
        _ => parse_yaml(s).or_else(|_| parse_toml(s)).or_else(|_| parse_json(s)),
    }?;
    clean_list(parsed)
}

fn parse_yaml(s: &str) -> Result<Vec<FeedConfig>> {
    let doc: FeedsDoc = serde_yaml::from_str(s).context("parsing yaml feed list")?;
    Ok(doc.feeds)
}

fn parse_toml(s: &str) -> Result<Vec<FeedConfig>> {
    let doc: FeedsDoc = toml::from_str(s).context("parsing toml feed list")?;
    Ok(doc.feeds)
}

fn parse_json(s: &str) -> Result<Vec<FeedConfig>> {
    // Accept either a bare array or `{"feeds": [...]}`.
    if let Ok(v) = serde_json::from_str::<Vec<FeedConfig>>(s) {
        return Ok(v);
    }
    let doc: FeedsDoc = serde_json::from_str(s).context("parsing json feed list")?;
    Ok(doc.feeds)
}

fn clean_list(items: Vec<FeedConfig>) -> Result<Vec<FeedConfig>> {
    let mut names = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for mut it in items {
        it.name = it.name.trim().to_string();
        it.url = it.url.trim().to_string();
        it.category = it.category.trim().to_string();
        if it.name.is_empty() || it.url.is_empty() {
            bail!("feed entry with empty name or url");
        }
        if it.category.is_empty() {
            it.category = crate::ingest::types::default_category();
        }
        if !names.insert(it.name.clone()) {
            bail!("duplicate feed name `{}`", it.name);
        }
        out.push(it);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_toml_json_all_parse() {
        let yaml = r#"
feeds:
  - name: " CNBC Top "
    url: https://example.com/cnbc.xml
    category: markets
  - name: Fed
    url: https://example.com/fed.xml
"#;
        let toml = r#"
[[feeds]]
name = "Fed"
url = "https://example.com/fed.xml"
category = "macro"
"#;
        let json = r#"[{"name": "Coindesk", "url": "https://example.com/cd.xml", "category": "crypto"}]"#;

        let y = parse_feeds(yaml, "yml").unwrap();
        assert_eq!(y.len(), 2);
        assert_eq!(y[0].name, "CNBC Top");
        assert_eq!(y[1].category, "general");

        let t = parse_feeds(toml, "toml").unwrap();
        assert_eq!(t[0].category, "macro");

        let j = parse_feeds(json, "").unwrap();
        assert_eq!(j[0].name, "Coindesk");
    }

    #[test]
    fn duplicate_and_blank_entries_are_rejected() {
        let dup = r#"[{"name":"A","url":"u1"},{"name":"A","url":"u2"}]"#;
        assert!(parse_feeds(dup, "json").is_err());
        let blank = r#"[{"name":"  ","url":"u1"}]"#;
        assert!(parse_feeds(blank, "json").is_err());
    }
}
