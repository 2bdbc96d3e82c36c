// tests/briefing_generate.rs
use chrono::{NaiveDate, TimeZone, Utc};
use molt_street_journal::briefing::fields::BriefingField;
use molt_street_journal::briefing::generate::{self, BriefingOutcome};
use molt_street_journal::briefing::model::{BriefingModel, MockModel, ModelError};
use molt_street_journal::briefing::{self, Briefing};
use molt_street_journal::config::SiteConfig;
use std::fs;
use std::path::Path;

const REPLY: &str = "\
OVERALL_SENTIMENT: Bullish
CONFIDENCE: High
HEADLINE: Soft CPI lifts stocks
MARKET_OVERVIEW:
Stocks rallied after inflation cooled.

Yields fell across the curve.
KEY_MOVERS:
- ACME +4% on guidance
SECTOR_HIGHLIGHTS:
Tech led.
MACRO_SIGNALS:
CPI 2.9% y/y.
WATCH_LIST:
- Fed minutes Wednesday
AGENT_NOTES:
Risk-on bias while 10y stays under 4.5%.
";

fn write(root: &Path, rel: &str, text: &str) {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, text).unwrap();
}

fn setup() -> (tempfile::TempDir, SiteConfig) {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content/articles");
    write(
        &content,
        "2025/01/07/cpi.md",
        "---\ntitle: CPI cools\nslug: cpi-cools\ndate: 2025-01-07T13:30:00Z\ncategory: macro\nsentiment: bullish\nimpact: high\n---\nbody\n",
    );
    write(
        &content,
        "2025/01/07/acme.md",
        "---\ntitle: Acme guides up\nslug: acme\ndate: 2025-01-07T15:00:00Z\ncategory: markets\nsentiment: bullish\n---\nbody\n",
    );
    // yesterday's article is not part of today's briefing
    write(
        &content,
        "2025/01/06/old.md",
        "---\ntitle: Old news\nslug: old\ndate: 2025-01-06T15:00:00Z\ncategory: markets\nsentiment: bearish\n---\nbody\n",
    );

    let mut cfg = SiteConfig::default();
    cfg.paths.content_dir = content;
    cfg.paths.briefings_dir = dir.path().join("content/briefings");
    cfg.briefing.max_attempts = 3;
    cfg.briefing.backoff_secs = 0;
    (dir, cfg)
}

fn scripted(
    script: Vec<Result<String, ModelError>>,
) -> impl FnOnce(&molt_street_journal::config::BriefingCfg) -> anyhow::Result<Box<dyn BriefingModel>> {
    move |_| Ok(Box::new(MockModel::new(script)) as Box<dyn BriefingModel>)
}

#[tokio::test]
async fn saves_todays_briefing() {
    let (_dir, cfg) = setup();
    let now = Utc.with_ymd_and_hms(2025, 1, 7, 21, 0, 0).unwrap();
    let outcome = generate::run(&cfg, now, scripted(vec![Ok(REPLY.into())])).await.unwrap();

    let path = match outcome {
        BriefingOutcome::Saved(p) => p,
        other => panic!("expected saved briefing, got {other:?}"),
    };
    assert_eq!(path, cfg.paths.briefings_dir.join("2025-01-07.md"));

    let b = Briefing::from_markdown(&fs::read_to_string(&path).unwrap(), &path).unwrap();
    assert_eq!(b.meta.date, NaiveDate::from_ymd_opt(2025, 1, 7).unwrap());
    assert_eq!(b.meta.article_count, 2);
    assert_eq!(b.meta.overall_sentiment, "bullish");
    assert_eq!(b.meta.confidence, "high");
    assert_eq!(b.meta.headline, "Soft CPI lifts stocks");
    assert_eq!(b.meta.generator, "mock");
    assert!(!b.meta.partial);
    assert_eq!(b.meta.sentiment_breakdown.get("bullish"), Some(&2));
    assert_eq!(b.meta.category_breakdown.get("markets"), Some(&1));
    assert_eq!(
        b.section(BriefingField::MarketOverview),
        Some("Stocks rallied after inflation cooled.\n\nYields fell across the curve.")
    );
    assert_eq!(b.sections.len(), BriefingField::SECTIONS.len());

    // the site build picks it up as the latest
    let latest = briefing::load_latest(&cfg.paths.briefings_dir).unwrap().unwrap();
    assert_eq!(latest.meta.headline, "Soft CPI lifts stocks");
}

#[tokio::test]
async fn rate_limits_are_retried() {
    let (_dir, cfg) = setup();
    let now = Utc.with_ymd_and_hms(2025, 1, 7, 21, 0, 0).unwrap();
    let script = vec![
        Err(ModelError::RateLimited("quota".into())),
        Err(ModelError::RateLimited("quota".into())),
        Ok(REPLY.into()),
    ];
    let outcome = generate::run(&cfg, now, scripted(script)).await.unwrap();
    assert!(matches!(outcome, BriefingOutcome::Saved(_)), "{outcome:?}");
}

#[tokio::test]
async fn no_articles_today_skips_without_credentials() {
    let (_dir, cfg) = setup();
    let now = Utc.with_ymd_and_hms(2025, 1, 9, 21, 0, 0).unwrap();
    let outcome = generate::run(&cfg, now, |_: &molt_street_journal::config::BriefingCfg| {
        anyhow::bail!("model must not be built")
    })
    .await
    .unwrap();
    assert_eq!(outcome, BriefingOutcome::Skipped);
    assert!(!cfg.paths.briefings_dir.exists());
}

#[serial_test::serial]
#[tokio::test]
async fn missing_api_key_is_an_error() {
    let (_dir, cfg) = setup();
    let now = Utc.with_ymd_and_hms(2025, 1, 7, 21, 0, 0).unwrap();
    std::env::remove_var("GOOGLE_API_KEY");
    std::env::set_var("GEMINI_API_KEY", "   ");

    let err = generate::run(&cfg, now, generate::gemini_from_env).await.unwrap_err();
    assert!(err.to_string().contains("GOOGLE_API_KEY"), "{err}");
    assert!(!cfg.paths.briefings_dir.exists());
    std::env::remove_var("GEMINI_API_KEY");
}

#[tokio::test]
async fn failures_write_nothing() {
    let now = Utc.with_ymd_and_hms(2025, 1, 7, 21, 0, 0).unwrap();

    let (_dir, cfg) = setup();
    let outcome = generate::run(&cfg, now, scripted(vec![Ok("I cannot help with that.".into())]))
        .await
        .unwrap();
    assert!(matches!(outcome, BriefingOutcome::Failed(_)), "{outcome:?}");
    assert!(!cfg.paths.briefings_dir.join("2025-01-07.md").exists());

    let (_dir, cfg) = setup();
    let script = vec![Err(ModelError::Api { status: 500, body: "internal".into() })];
    let outcome = generate::run(&cfg, now, scripted(script)).await.unwrap();
    match outcome {
        BriefingOutcome::Failed(reason) => assert!(reason.contains("500"), "{reason}"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(!cfg.paths.briefings_dir.join("2025-01-07.md").exists());

    let (_dir, cfg) = setup();
    let script = vec![Err(ModelError::RateLimited("quota".into())); 3];
    let outcome = generate::run(&cfg, now, scripted(script)).await.unwrap();
    assert!(matches!(outcome, BriefingOutcome::Failed(_)));
}
