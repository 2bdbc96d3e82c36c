// src/site/api.rs
//! JSON documents served next to the HTML: `index.json`, `v1/articles.json`,
//! `api/category/<cat>.json`, `api/today.json` and the briefing endpoints.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::briefing::{Briefing, BriefingMeta};
use crate::config::SiteMeta;
use crate::corpus::{Article, Entity, Impact, Sentiment, SourceRef, Takeaway};

#[derive(Debug, Serialize)]
pub struct ArticleDoc<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub date: String,
    pub category: &'a str,
    pub tags: &'a [String],
    pub reporter: &'a str,
    pub summary: &'a str,
    pub content_type: &'a str,
    pub entities: &'a [Entity],
    pub sentiment: Sentiment,
    pub impact: Impact,
    pub subcategory: &'a str,
    pub sources: &'a [SourceRef],
    pub url_html: String,
    pub url_md: String,
    pub key_takeaways: &'a [Takeaway],
}

impl<'a> ArticleDoc<'a> {
    pub fn of(a: &'a Article, base: &str) -> Self {
        Self {
            title: &a.title,
            slug: &a.slug,
            date: a.iso_date(),
            category: &a.category,
            tags: &a.tags,
            reporter: &a.reporter,
            summary: &a.summary,
            content_type: &a.content_type,
            entities: &a.entities,
            sentiment: a.sentiment,
            impact: a.impact,
            subcategory: &a.subcategory,
            sources: &a.sources,
            url_html: a.url_html(base),
            url_md: a.url_md(base),
            key_takeaways: &a.key_takeaways,
        }
    }
}

fn docs<'a, I>(articles: I, base: &str) -> Vec<ArticleDoc<'a>>
where
    I: IntoIterator<Item = &'a Article>,
{
    articles.into_iter().map(|a| ArticleDoc::of(a, base)).collect()
}

#[derive(Debug, Serialize)]
pub struct DateRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub total_articles: usize,
    pub categories: Vec<String>,
    pub date_range: DateRange,
}

#[derive(Debug, Serialize)]
pub struct IndexDoc<'a> {
    pub name: &'a str,
    pub url: &'a str,
    pub description: &'a str,
    pub updated: &'a str,
    pub stats: Stats,
    pub articles: Vec<ArticleDoc<'a>>,
}

pub fn index_doc<'a>(site: &'a SiteMeta, articles: &'a [Article], updated: &'a str) -> IndexDoc<'a> {
    let mut categories: Vec<String> = articles.iter().map(|a| a.category.clone()).collect();
    categories.sort();
    categories.dedup();
    let days: Vec<String> = articles.iter().map(Article::day).collect();
    IndexDoc {
        name: &site.name,
        url: &site.url,
        description: &site.description,
        updated,
        stats: Stats {
            total_articles: articles.len(),
            categories,
            date_range: DateRange {
                earliest: days.iter().min().cloned(),
                latest: days.iter().max().cloned(),
            },
        },
        articles: docs(articles, &site.url),
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryDoc<'a> {
    pub category: &'a str,
    pub count: usize,
    pub updated: &'a str,
    pub articles: Vec<ArticleDoc<'a>>,
}

pub fn category_doc<'a>(
    site: &SiteMeta,
    category: &'a str,
    articles: &[&'a Article],
    updated: &'a str,
) -> CategoryDoc<'a> {
    CategoryDoc {
        category,
        count: articles.len(),
        updated,
        articles: docs(articles.iter().copied(), &site.url),
    }
}

#[derive(Debug, Serialize)]
pub struct TodayDoc<'a> {
    pub date: &'a str,
    pub count: usize,
    pub updated: &'a str,
    pub articles: Vec<ArticleDoc<'a>>,
}

pub fn today_doc<'a>(
    site: &SiteMeta,
    today: &'a str,
    articles: &[&'a Article],
    updated: &'a str,
) -> TodayDoc<'a> {
    TodayDoc {
        date: today,
        count: articles.len(),
        updated,
        articles: docs(articles.iter().copied(), &site.url),
    }
}

#[derive(Debug, Serialize)]
pub struct BriefingBody<'a> {
    #[serde(flatten)]
    pub meta: &'a BriefingMeta,
    /// `market_overview`, `key_movers`, ... for the sections present.
    pub sections: BTreeMap<&'static str, &'a str>,
}

/// `available: false` alone when there is nothing to serve.
#[derive(Debug, Serialize)]
pub struct BriefingDoc<'a> {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_date: Option<&'a str>,
    pub updated: &'a str,
    #[serde(flatten)]
    pub briefing: Option<BriefingBody<'a>>,
}

fn body(b: &Briefing) -> BriefingBody<'_> {
    BriefingBody {
        meta: &b.meta,
        sections: b.sections.iter().map(|(f, v)| (f.key(), v.as_str())).collect(),
    }
}

/// `api/briefing.json`: the latest briefing, whatever its date.
pub fn briefing_doc<'a>(latest: Option<&'a Briefing>, updated: &'a str) -> BriefingDoc<'a> {
    BriefingDoc {
        available: latest.is_some(),
        requested_date: None,
        updated,
        briefing: latest.map(body),
    }
}

/// `api/briefing/today.json`: the latest briefing only when it is dated `today`.
pub fn briefing_today_doc<'a>(
    latest: Option<&'a Briefing>,
    today: &'a str,
    updated: &'a str,
) -> BriefingDoc<'a> {
    let todays = latest.filter(|b| b.meta.date.format("%Y-%m-%d").to_string() == today);
    BriefingDoc {
        available: todays.is_some(),
        requested_date: Some(today),
        updated,
        briefing: todays.map(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::parse_article_str;
    use std::path::Path;

    fn art(slug: &str, date: &str, category: &str) -> Article {
        let text = format!("---\ntitle: {slug}\nslug: {slug}\ndate: {date}\ncategory: {category}\n---\nbody\n");
        parse_article_str(&text, Path::new("t.md")).unwrap().unwrap()
    }

    #[test]
    fn index_stats_and_article_shape() {
        let site = SiteMeta::default();
        let articles = vec![
            art("b", "2025-01-08T09:00:00Z", "markets"),
            art("a", "2025-01-07T09:00:00Z", "macro"),
            art("c", "2025-01-06T09:00:00Z", "markets"),
        ];
        let v = serde_json::to_value(index_doc(&site, &articles, "T")).unwrap();
        assert_eq!(v["stats"]["total_articles"], 3);
        assert_eq!(v["stats"]["categories"], serde_json::json!(["macro", "markets"]));
        assert_eq!(v["stats"]["date_range"]["earliest"], "2025-01-06");
        assert_eq!(v["stats"]["date_range"]["latest"], "2025-01-08");
        let first = &v["articles"][0];
        assert_eq!(first["date"], "2025-01-08T09:00:00+00:00");
        assert_eq!(first["sentiment"], "neutral");
        assert_eq!(first["url_html"], "https://moltstreetjournal.com/articles/2025/01/08/b.html");
        assert_eq!(first["url_md"], "https://moltstreetjournal.com/articles/2025/01/08/b.md");
        assert!(first["key_takeaways"].as_array().unwrap().is_empty());
    }

    #[test]
    fn empty_index_has_null_range() {
        let v = serde_json::to_value(index_doc(&SiteMeta::default(), &[], "T")).unwrap();
        assert!(v["stats"]["date_range"]["earliest"].is_null());
        assert_eq!(v["articles"], serde_json::json!([]));
    }

    #[test]
    fn unavailable_briefing_is_flag_only() {
        let v = serde_json::to_value(briefing_doc(None, "T")).unwrap();
        assert_eq!(v, serde_json::json!({ "available": false, "updated": "T" }));
    }
}
