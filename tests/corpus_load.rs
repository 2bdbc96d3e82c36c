// tests/corpus_load.rs
use molt_street_journal::corpus::{load_articles, CorpusError, Impact, Sentiment};
use std::fs;
use std::path::Path;

fn write(root: &Path, rel: &str, text: &str) {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, text).unwrap();
}

fn article(slug: &str, date: &str) -> String {
    format!("---\ntitle: Title {slug}\nslug: {slug}\ndate: {date}\n---\n\nBody of {slug}.\n")
}

#[test]
fn recursive_scan_sorted_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "2025/01/06/a.md", &article("a", "2025-01-06T09:00:00Z"));
    write(root, "2025/01/07/b.md", &article("b", "2025-01-07T09:00:00Z"));
    write(root, "2025/01/07/c.md", &article("c", "2025-01-07T18:00:00+00:00"));
    write(root, "2025/01/07/notes.txt", "not markdown");
    write(root, "drafts/idea.md", "# Just an idea, no frontmatter\n");

    let articles = load_articles(root).unwrap();
    let slugs: Vec<&str> = articles.iter().map(|a| a.slug.as_str()).collect();
    assert_eq!(slugs, vec!["c", "b", "a"]);

    let c = &articles[0];
    assert_eq!(c.category, "general");
    assert_eq!(c.reporter, "unknown");
    assert_eq!(c.content_type, "brief");
    assert_eq!(c.sentiment, Sentiment::Neutral);
    assert_eq!(c.impact, Impact::Low);
    assert_eq!(c.body_md, "Body of c.");
    assert_eq!(c.html_body.trim(), "<p>Body of c.</p>");
}

#[test]
fn full_frontmatter_is_typed() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "x.md",
        r#"---
title: "Nvidia beats estimates"
slug: nvidia-beats
date: 2025-01-07T21:05:00-05:00
reporter: Ada Lovelace
category: tech
subcategory: semiconductors
tags: [nvidia, earnings]
summary: "  Revenue topped forecasts.  "
content_type: analysis
sentiment: bullish
impact: high
entities:
  - {name: Nvidia, type: company}
  - Jensen Huang
sources:
  - {name: Company filing, url: "https://example.com/10q"}
---

Revenue rose.

## Key Takeaways

- **Revenue:** $35bn, above consensus
- Guidance raised

## Analysis

More text.
"#,
    );
    let articles = load_articles(dir.path()).unwrap();
    let a = &articles[0];
    assert_eq!(a.summary, "Revenue topped forecasts.");
    assert_eq!(a.sentiment, Sentiment::Bullish);
    assert_eq!(a.impact, Impact::High);
    assert_eq!(a.entities[1].name, "Jensen Huang");
    assert_eq!(a.sources[0].label(), "Company filing");
    // date path follows the article's own offset
    assert_eq!(a.date_path(), "2025/01/07");
    assert_eq!(a.iso_date(), "2025-01-07T21:05:00-05:00");
    assert_eq!(a.rfc822_date(), "Tue, 07 Jan 2025 21:05:00 -0500");

    assert_eq!(a.key_takeaways.len(), 2);
    assert_eq!(a.key_takeaways[0].name, "Revenue");
    assert_eq!(a.key_takeaways[0].text, "$35bn, above consensus");
    assert_eq!(a.key_takeaways[1].name, "Key point");
}

#[test]
fn duplicate_slug_on_same_day_fails_loudly() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "one/first.md", &article("same", "2025-01-07T09:00:00Z"));
    write(dir.path(), "two/second.md", &article("same", "2025-01-07T17:00:00Z"));
    // same slug on another day is fine
    write(dir.path(), "three/third.md", &article("same", "2025-01-08T09:00:00Z"));

    match load_articles(dir.path()) {
        Err(CorpusError::DuplicateSlug { slug, date_path, .. }) => {
            assert_eq!(slug, "same");
            assert_eq!(date_path, "2025/01/07");
        }
        other => panic!("expected duplicate slug error, got {other:?}"),
    }
}

#[test]
fn malformed_article_aborts_the_load() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ok.md", &article("ok", "2025-01-07"));
    write(dir.path(), "bad.md", "---\ntitle: Missing slug\ndate: 2025-01-07\n---\nbody\n");
    let err = load_articles(dir.path()).unwrap_err();
    assert!(err.to_string().contains("bad.md"), "{err}");

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "enum.md", "---\ntitle: t\nslug: s\ndate: 2025-01-07\nsentiment: euphoric\n---\n");
    assert!(matches!(load_articles(dir.path()), Err(CorpusError::Yaml { .. })));

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "date.md", "---\ntitle: t\nslug: s\ndate: someday\n---\n");
    assert!(matches!(load_articles(dir.path()), Err(CorpusError::Date { .. })));
}

#[test]
fn missing_content_dir_is_an_empty_corpus() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_articles(&dir.path().join("nope")).unwrap().is_empty());
}

#[test]
fn path_escaping_slug_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ok.md", &article("ok", "2025-01-07"));
    write(dir.path(), "evil.md", &article("../../../../escape", "2025-01-07"));
    match load_articles(dir.path()) {
        Err(CorpusError::UnsafeSegment { field, value, .. }) => {
            assert_eq!(field, "slug");
            assert_eq!(value, "../../../../escape");
        }
        other => panic!("expected unsafe slug error, got {other:?}"),
    }
}
