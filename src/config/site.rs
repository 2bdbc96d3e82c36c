// src/config/site.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const ENV_CONFIG_PATH: &str = "MSJ_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/site.toml";

/// Default noise blocklist: topics that never belong on a financial wire.
pub const DEFAULT_NOISE_PATTERNS: &[&str] = &[
    r"celebrit(?:y|ies)",
    r"kardashian",
    r"red carpet",
    r"oscars?",
    r"grammys?",
    r"emmys?",
    r"royal family",
    r"nfl",
    r"nba",
    r"mlb",
    r"nhl",
    r"super bowl",
    r"world cup",
    r"touchdowns?",
    r"playoffs?",
    r"final score",
    r"lottery",
    r"powerball",
    r"mega millions",
    r"horoscopes?",
    r"recipes?",
    r"murder(?:ed|s)?",
    r"homicide",
    r"stabbing",
    r"police (?:say|said)",
    r"arrested",
    r"dating app",
    r"wedding",
    r"fashion week",
    r"weight loss",
];

fn default_categories() -> Vec<String> {
    [
        "markets",
        "macro",
        "crypto",
        "personal-finance",
        "real-estate",
        "tech",
        "commodities",
        "international",
        "deals",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Whole-site configuration. Every job receives one of these explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site: SiteMeta,
    pub paths: Paths,
    pub build: BuildCfg,
    pub related: RelatedCfg,
    pub ingest: IngestCfg,
    pub briefing: BriefingCfg,
    pub categories: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: SiteMeta::default(),
            paths: Paths::default(),
            build: BuildCfg::default(),
            related: RelatedCfg::default(),
            ingest: IngestCfg::default(),
            briefing: BriefingCfg::default(),
            categories: default_categories(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteMeta {
    pub name: String,
    /// Absolute base URL without trailing slash.
    pub url: String,
    pub description: String,
    pub language: String,
    /// Identifier used as `name_for_model` in the plugin manifest.
    pub model_name: String,
    /// Custom domain for the CNAME file; derived from `url` when unset.
    pub cname: Option<String>,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            name: "Molt Street Journal".into(),
            url: "https://moltstreetjournal.com".into(),
            description: "Financial news for humans and agents".into(),
            language: "en".into(),
            model_name: "molt_street_journal".into(),
            cname: None,
        }
    }
}

impl SiteMeta {
    /// Host part of the configured URL, used when no explicit CNAME is set.
    /// Port and userinfo never appear in the result.
    pub fn domain(&self) -> Result<String> {
        if let Some(c) = self.cname.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            return Ok(c.to_string());
        }
        let url = Url::parse(&self.url).with_context(|| format!("site url `{}`", self.url))?;
        url.host_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("site url `{}` has no host", self.url))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub content_dir: PathBuf,
    pub briefings_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub static_dir: PathBuf,
    pub output_dir: PathBuf,
    pub data_dir: PathBuf,
    pub feeds_file: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content/articles"),
            briefings_dir: PathBuf::from("content/briefings"),
            pages_dir: PathBuf::from("pages"),
            static_dir: PathBuf::from("static"),
            output_dir: PathBuf::from("output"),
            data_dir: PathBuf::from("data"),
            feeds_file: PathBuf::from("feeds.yml"),
        }
    }
}

impl Paths {
    pub fn processed_file(&self) -> PathBuf {
        self.data_dir.join("processed.json")
    }

    pub fn rss_raw_dir(&self) -> PathBuf {
        self.data_dir.join("rss_raw")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildCfg {
    pub page_size: usize,
    pub rss_limit: usize,
    pub llms_recent: usize,
    pub llms_summary_chars: usize,
}

impl Default for BuildCfg {
    fn default() -> Self {
        Self {
            page_size: 20,
            rss_limit: 50,
            llms_recent: 20,
            llms_summary_chars: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelatedCfg {
    /// Scores must be strictly greater than this to qualify.
    pub threshold: f64,
    pub max_results: usize,
    pub entity_weight: f64,
    pub category_bonus: f64,
}

impl Default for RelatedCfg {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            max_results: 4,
            entity_weight: 1.5,
            category_bonus: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestCfg {
    pub per_feed_cap: usize,
    pub summary_max_chars: usize,
    pub noise_patterns: Vec<String>,
}

impl Default for IngestCfg {
    fn default() -> Self {
        Self {
            per_feed_cap: 10,
            summary_max_chars: 500,
            noise_patterns: DEFAULT_NOISE_PATTERNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefingCfg {
    pub model: String,
    pub max_output_tokens: u32,
    pub max_attempts: u32,
    /// Rate-limit wait is `backoff_secs * attempt`.
    pub backoff_secs: u64,
}

impl Default for BriefingCfg {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".into(),
            max_output_tokens: 2048,
            max_attempts: 3,
            backoff_secs: 45,
        }
    }
}

impl SiteConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: SiteConfig = toml::from_str(s).context("parsing site config")?;
        cfg.sanitize()?;
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading site config from {}", path.display()))?;
        Self::from_toml_str(&data).with_context(|| format!("in {}", path.display()))
    }

    /// Resolve the config file:
    /// 1) $MSJ_CONFIG_PATH (must exist)
    /// 2) config/site.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if p.exists() {
            return Self::load_from_file(&p);
        }
        Ok(Self::default())
    }

    fn sanitize(&mut self) -> Result<()> {
        while self.site.url.ends_with('/') {
            self.site.url.pop();
        }
        let url = Url::parse(&self.site.url)
            .with_context(|| format!("invalid [site].url `{}`", self.site.url))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(anyhow!("[site].url `{}` must be an http(s) URL with a host", self.site.url));
        }
        if self.build.page_size == 0 {
            self.build.page_size = BuildCfg::default().page_size;
        }
        if self.briefing.max_attempts == 0 {
            self.briefing.max_attempts = 1;
        }
        if !self.related.threshold.is_finite() {
            self.related.threshold = RelatedCfg::default().threshold;
        }
        let mut seen = std::collections::HashSet::new();
        self.categories.retain(|c| !c.trim().is_empty() && seen.insert(c.clone()));
        Ok(())
    }
}
