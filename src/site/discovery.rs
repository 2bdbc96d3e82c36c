// src/site/discovery.rs
//! Agent and crawler discovery files: `llms.txt`, `llms-full.txt`,
//! `robots.txt`, `.well-known/ai-plugin.json`, `.well-known/ai.json`, `CNAME`.
//! None of these embed a build timestamp.

use serde_json::{json, Value};
use std::fmt::Write as _;

use crate::config::SiteConfig;
use crate::corpus::Article;

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub fn llms_txt(cfg: &SiteConfig, articles: &[Article]) -> String {
    let base = &cfg.site.url;
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", cfg.site.name);
    let _ = writeln!(out, "> {}\n", cfg.site.description);
    out.push_str("## API\n\n");
    let links = [
        ("Article Index (JSON)", "index.json", "Structured index of all articles with metadata and summaries"),
        ("Today's Articles (JSON)", "api/today.json", "Articles published today (UTC)"),
        ("Category API", "api/category/", "Per-category JSON endpoints (markets, macro, crypto, etc.)"),
        ("Versioned API", "v1/articles.json", "Stable v1 endpoint for all articles"),
        ("Daily Briefing (JSON)", "api/briefing.json", "Latest AI-generated daily market briefing"),
        ("RSS Feed", "feed.xml", "Standard RSS 2.0 feed"),
        ("Full Content", "llms-full.txt", "Complete article text for LLM consumption"),
    ];
    for (label, path, what) in links {
        let _ = writeln!(out, "- [{label}]({base}/{path}): {what}");
    }
    out.push_str("\n## Recent Articles\n\n");
    for a in articles.iter().take(cfg.build.llms_recent) {
        let _ = writeln!(
            out,
            "- [{}]({}): {}",
            a.title,
            a.url_md(base),
            truncate_chars(&a.summary, cfg.build.llms_summary_chars)
        );
    }
    out
}

pub fn llms_full_txt(cfg: &SiteConfig, articles: &[Article]) -> String {
    let mut out = format!(
        "# {} - Full Content\n\n> {}\n\n",
        cfg.site.name, cfg.site.description
    );
    for a in articles {
        let _ = write!(
            out,
            "## {}\n\nDate: {}\nCategory: {}\nTags: {}\nReporter: {}\n\n{}\n\n---\n\n",
            a.title,
            a.day(),
            a.category,
            a.tags.join(", "),
            a.reporter,
            a.body_md
        );
    }
    out
}

pub fn robots_txt(cfg: &SiteConfig) -> String {
    format!(
        "User-agent: *\nAllow: /\n\nSitemap: {}/sitemap.xml\n",
        cfg.site.url
    )
}

pub fn cname(cfg: &SiteConfig) -> anyhow::Result<String> {
    Ok(format!("{}\n", cfg.site.domain()?))
}

fn endpoints(base: &str) -> Value {
    json!({
        "articles_json": format!("{base}/index.json"),
        "articles_v1": format!("{base}/v1/articles.json"),
        "today": format!("{base}/api/today.json"),
        "category": format!("{base}/api/category/{{category}}.json"),
        "briefing": format!("{base}/api/briefing.json"),
        "briefing_today": format!("{base}/api/briefing/today.json"),
        "articles_rss": format!("{base}/feed.xml"),
        "llms_txt": format!("{base}/llms.txt"),
        "llms_full_txt": format!("{base}/llms-full.txt"),
        "sitemap": format!("{base}/sitemap.xml"),
    })
}

pub fn ai_plugin(cfg: &SiteConfig) -> Value {
    let base = &cfg.site.url;
    json!({
        "schema_version": "v1",
        "name_for_human": cfg.site.name,
        "name_for_model": cfg.site.model_name,
        "description_for_human": cfg.site.description,
        "description_for_model": format!(
            "Financial news API providing articles about {}. Articles include structured metadata \
             (entities, sentiment, impact), tags, sources, and are available in HTML, JSON, and Markdown formats.",
            cfg.categories.join(", ")
        ),
        "api": { "type": "openapi", "url": format!("{base}/index.json") },
        "endpoints": endpoints(base),
    })
}

pub fn ai_manifest(cfg: &SiteConfig) -> Value {
    json!({
        "name": cfg.site.name,
        "url": cfg.site.url,
        "description": cfg.site.description,
        "language": cfg.site.language,
        "categories": cfg.categories,
        "formats": ["html", "json", "markdown", "rss"],
        "endpoints": endpoints(&cfg.site.url),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 120), "hi");
    }

    #[test]
    fn robots_and_cname() {
        let cfg = SiteConfig::default();
        assert_eq!(
            robots_txt(&cfg),
            "User-agent: *\nAllow: /\n\nSitemap: https://moltstreetjournal.com/sitemap.xml\n"
        );
        assert_eq!(cname(&cfg).unwrap(), "moltstreetjournal.com\n");

        let mut cfg = SiteConfig::default();
        cfg.site.url = "https://news.example.com:8443/wire".into();
        assert_eq!(cname(&cfg).unwrap(), "news.example.com\n");
    }

    #[test]
    fn manifests_carry_endpoints() {
        let cfg = SiteConfig::default();
        let p = ai_plugin(&cfg);
        assert_eq!(p["schema_version"], "v1");
        assert_eq!(p["name_for_model"], "molt_street_journal");
        assert_eq!(
            p["endpoints"]["category"],
            "https://moltstreetjournal.com/api/category/{category}.json"
        );
        let m = ai_manifest(&cfg);
        assert_eq!(m["categories"].as_array().unwrap().len(), cfg.categories.len());
    }
}
