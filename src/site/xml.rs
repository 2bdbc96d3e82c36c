// src/site/xml.rs
//! `feed.xml` (RSS 2.0) and `sitemap.xml`, serialized with quick-xml's serde
//! support, mirroring the deserialize structs used by the ingest provider.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::SiteConfig;
use crate::corpus::Article;

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

#[derive(Serialize)]
#[serde(rename = "rss")]
struct Rss<'a> {
    #[serde(rename = "@version")]
    version: &'static str,
    #[serde(rename = "@xmlns:atom")]
    xmlns_atom: &'static str,
    channel: Channel<'a>,
}

#[derive(Serialize)]
struct Channel<'a> {
    title: &'a str,
    link: &'a str,
    description: &'a str,
    language: &'a str,
    #[serde(rename = "lastBuildDate")]
    last_build_date: String,
    #[serde(rename = "atom:link")]
    atom_link: AtomLink,
    #[serde(rename = "item")]
    items: Vec<Item<'a>>,
}

#[derive(Serialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel")]
    rel: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Item<'a> {
    title: &'a str,
    link: String,
    guid: Guid,
    #[serde(rename = "pubDate")]
    pub_date: String,
    description: &'a str,
    category: &'a str,
}

#[derive(Serialize)]
struct Guid {
    #[serde(rename = "@isPermaLink")]
    is_perma_link: &'static str,
    #[serde(rename = "$text")]
    value: String,
}

fn to_xml<T: Serialize>(value: &T) -> Result<String> {
    let mut out = String::from(XML_DECL);
    let mut ser = quick_xml::se::Serializer::new(&mut out);
    ser.indent(' ', 2);
    value.serialize(ser).context("serializing xml")?;
    out.push('\n');
    Ok(out)
}

/// RSS 2.0 over the first `cfg.build.rss_limit` articles (already newest first).
pub fn rss_feed(cfg: &SiteConfig, articles: &[Article], generated_at: DateTime<Utc>) -> Result<String> {
    let base = &cfg.site.url;
    let items = articles
        .iter()
        .take(cfg.build.rss_limit)
        .map(|a| {
            let link = a.url_html(base);
            Item {
                title: &a.title,
                guid: Guid {
                    is_perma_link: "true",
                    value: link.clone(),
                },
                link,
                pub_date: a.rfc822_date(),
                description: &a.summary,
                category: &a.category,
            }
        })
        .collect();

    to_xml(&Rss {
        version: "2.0",
        xmlns_atom: "http://www.w3.org/2005/Atom",
        channel: Channel {
            title: &cfg.site.name,
            link: base,
            description: &cfg.site.description,
            language: &cfg.site.language,
            last_build_date: generated_at.format("%a, %d %b %Y %H:%M:%S %z").to_string(),
            atom_link: AtomLink {
                href: format!("{base}/feed.xml"),
                rel: "self",
                kind: "application/rss+xml",
            },
            items,
        },
    })
}

#[derive(Serialize)]
#[serde(rename = "urlset")]
struct UrlSet {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "url")]
    urls: Vec<SitemapUrl>,
}

#[derive(Serialize)]
struct SitemapUrl {
    loc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    lastmod: Option<String>,
    changefreq: &'static str,
    priority: &'static str,
}

/// Home, category pages, the about page when built, then every article.
/// `categories` are the category pages actually written by this build.
pub fn sitemap(
    cfg: &SiteConfig,
    articles: &[Article],
    categories: &[String],
    with_about: bool,
) -> Result<String> {
    let base = &cfg.site.url;
    let mut urls = vec![SitemapUrl {
        loc: format!("{base}/"),
        lastmod: None,
        changefreq: "hourly",
        priority: "1.0",
    }];
    urls.extend(categories.iter().map(|c| SitemapUrl {
        loc: format!("{base}/category/{c}.html"),
        lastmod: None,
        changefreq: "daily",
        priority: "0.6",
    }));
    if with_about {
        urls.push(SitemapUrl {
            loc: format!("{base}/about.html"),
            lastmod: None,
            changefreq: "monthly",
            priority: "0.3",
        });
    }
    urls.extend(articles.iter().map(|a| SitemapUrl {
        loc: a.url_html(base),
        lastmod: Some(a.day()),
        changefreq: "monthly",
        priority: "0.8",
    }));

    to_xml(&UrlSet {
        xmlns: "http://www.sitemaps.org/schemas/sitemap/0.9",
        urls,
    })
}
