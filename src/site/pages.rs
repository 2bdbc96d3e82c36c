// src/site/pages.rs
//! HTML pages rendered through askama templates under `templates/`.

use anyhow::{Context, Result};
use askama::Template;
use serde_json::json;

use crate::briefing::Briefing;
use crate::config::SiteConfig;
use crate::corpus::{markdown, Article, Takeaway};

/// Pre-escaped attribute value for `href="..."`.
fn href(url: &str) -> String {
    html_escape::encode_double_quoted_attribute(url).into_owned()
}

/// Root-relative article URL.
pub fn article_url(a: &Article) -> String {
    format!("/{}.html", a.rel_path())
}

/// Shared layout values used by `base.html`.
#[derive(Debug, Clone)]
pub struct Layout {
    pub site_name: String,
    pub language: String,
    pub description: String,
    pub page_title: String,
    pub canonical: String,
    pub categories: Vec<String>,
}

impl Layout {
    pub fn new(cfg: &SiteConfig, title: Option<&str>, path: &str) -> Self {
        let page_title = match title {
            Some(t) => format!("{t} | {}", cfg.site.name),
            None => cfg.site.name.clone(),
        };
        Self {
            site_name: cfg.site.name.clone(),
            language: cfg.site.language.clone(),
            description: cfg.site.description.clone(),
            page_title,
            canonical: href(&format!("{}{path}", cfg.site.url)),
            categories: cfg.categories.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Card {
    pub title: String,
    pub href: String,
    pub date: String,
    pub category: String,
    pub sentiment: String,
    pub impact: String,
    pub summary: String,
}

impl Card {
    pub fn of(a: &Article) -> Self {
        Self {
            title: a.title.clone(),
            href: href(&article_url(a)),
            date: a.display_date(),
            category: a.category.clone(),
            sentiment: a.sentiment.to_string(),
            impact: a.impact.to_string(),
            summary: a.summary.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BriefingCard {
    pub date: String,
    pub headline: String,
    pub sentiment: String,
    pub confidence: String,
    pub article_count: usize,
}

impl BriefingCard {
    pub fn of(b: &Briefing) -> Self {
        Self {
            date: b.meta.date.format("%B %-d, %Y").to_string(),
            headline: b.meta.headline.clone(),
            sentiment: b.meta.overall_sentiment.clone(),
            confidence: b.meta.confidence.clone(),
            article_count: b.meta.article_count,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage<'a> {
    pub layout: &'a Layout,
    pub briefing: Option<BriefingCard>,
    pub cards: Vec<Card>,
    pub page: usize,
    pub total: usize,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

#[derive(Template)]
#[template(path = "category.html")]
pub struct CategoryPage<'a> {
    pub layout: &'a Layout,
    pub category: &'a str,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone)]
pub struct SourceLink {
    pub label: String,
    pub href: String,
}

#[derive(Template)]
#[template(path = "article.html")]
pub struct ArticlePage<'a> {
    pub layout: &'a Layout,
    pub title: &'a str,
    pub iso_date: String,
    pub display_date: String,
    pub reporter: &'a str,
    pub category: &'a str,
    pub sentiment: String,
    pub impact: String,
    pub summary: &'a str,
    pub html_body: &'a str,
    pub tags: &'a [String],
    pub sources: Vec<SourceLink>,
    pub md_href: String,
    pub json_ld: Vec<String>,
    /// Related articles.
    pub cards: Vec<Card>,
}

#[derive(Template)]
#[template(path = "page.html")]
pub struct StaticPage<'a> {
    pub layout: &'a Layout,
    pub html: String,
}

/// Serialize for an inline `<script>`; `</` cannot close the element early.
fn script_json(v: &serde_json::Value) -> String {
    v.to_string().replace("</", "<\\/")
}

/// `NewsArticle`, plus `FAQPage` built from the key takeaways when present.
pub fn json_ld(a: &Article, cfg: &SiteConfig) -> Vec<String> {
    let url = a.url_html(&cfg.site.url);
    let mut out = vec![script_json(&json!({
        "@context": "https://schema.org",
        "@type": "NewsArticle",
        "headline": a.title,
        "description": a.summary,
        "datePublished": a.iso_date(),
        "dateModified": a.iso_date(),
        "url": url,
        "mainEntityOfPage": url,
        "articleSection": a.category,
        "keywords": a.tags.join(", "),
        "inLanguage": cfg.site.language,
        "author": { "@type": "Person", "name": a.reporter },
        "publisher": { "@type": "Organization", "name": cfg.site.name, "url": cfg.site.url },
        "about": a.entities.iter().map(|e| json!({ "@type": "Thing", "name": e.name })).collect::<Vec<_>>(),
    }))];
    if !a.key_takeaways.is_empty() {
        out.push(script_json(&faq(&a.key_takeaways)));
    }
    out
}

fn faq(takeaways: &[Takeaway]) -> serde_json::Value {
    json!({
        "@context": "https://schema.org",
        "@type": "FAQPage",
        "mainEntity": takeaways.iter().map(|t| json!({
            "@type": "Question",
            "name": t.name,
            "acceptedAnswer": { "@type": "Answer", "text": t.text },
        })).collect::<Vec<_>>(),
    })
}

pub fn render_index(
    layout: &Layout,
    briefing: Option<&Briefing>,
    cards: Vec<Card>,
    page: &super::paginate::Page,
) -> Result<String> {
    use super::paginate::page_url;
    IndexPage {
        layout,
        briefing: briefing.map(BriefingCard::of),
        cards,
        page: page.number,
        total: page.total,
        prev_href: page.prev().map(|n| href(&page_url(n))),
        next_href: page.next().map(|n| href(&page_url(n))),
    }
    .render()
    .with_context(|| format!("rendering {}", page.path()))
}

pub fn render_article(
    cfg: &SiteConfig,
    a: &Article,
    related: &[(&Article, f64)],
) -> Result<String> {
    let layout = Layout::new(cfg, Some(&a.title), &article_url(a));
    ArticlePage {
        layout: &layout,
        title: &a.title,
        iso_date: a.iso_date(),
        display_date: a.display_date(),
        reporter: &a.reporter,
        category: &a.category,
        sentiment: a.sentiment.to_string(),
        impact: a.impact.to_string(),
        summary: &a.summary,
        html_body: &a.html_body,
        tags: &a.tags,
        sources: a
            .sources
            .iter()
            .map(|s| SourceLink {
                label: s.label().to_string(),
                href: href(s.url()),
            })
            .collect(),
        md_href: href(&format!("/{}.md", a.rel_path())),
        json_ld: json_ld(a, cfg),
        cards: related.iter().map(|(r, _)| Card::of(r)).collect(),
    }
    .render()
    .with_context(|| format!("rendering {}", a.rel_path()))
}

pub fn render_category(cfg: &SiteConfig, category: &str, articles: &[&Article]) -> Result<String> {
    let layout = Layout::new(cfg, Some(category), &format!("/category/{category}.html"));
    CategoryPage {
        layout: &layout,
        category,
        cards: articles.iter().map(|a| Card::of(a)).collect(),
    }
    .render()
    .with_context(|| format!("rendering category {category}"))
}

/// Render a markdown page source (about, 404) inside the shared layout.
/// The first `# ` heading, if any, becomes the page title.
pub fn render_markdown_page(cfg: &SiteConfig, source: &str, path: &str) -> Result<String> {
    let title = source
        .lines()
        .find_map(|l| l.strip_prefix("# "))
        .map(str::trim);
    let layout = Layout::new(cfg, title, path);
    StaticPage {
        layout: &layout,
        html: markdown::render_html(source),
    }
    .render()
    .with_context(|| format!("rendering {path}"))
}
