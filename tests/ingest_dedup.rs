// tests/ingest_dedup.rs
use chrono::{TimeZone, Utc};
use molt_street_journal::config::IngestCfg;
use molt_street_journal::ingest::providers::rss::RssFeed;
use molt_street_journal::ingest::store::{read_batch, IngestStore};
use molt_street_journal::ingest::types::{FeedConfig, FeedEntry, FeedSource};
use molt_street_journal::ingest::run_once;
use molt_street_journal::relevance::NoiseFilter;

const RSS_XML: &str = include_str!("fixtures/sample_rss.xml");

fn wire() -> Box<dyn FeedSource> {
    Box::new(RssFeed::from_fixture(
        FeedConfig {
            name: "Wire".into(),
            url: "https://wire.example.com/rss.xml".into(),
            category: "markets".into(),
        },
        RSS_XML,
    ))
}

/// Always fails, like a feed that is down.
struct DownFeed(FeedConfig);

#[async_trait::async_trait]
impl FeedSource for DownFeed {
    async fn fetch_latest(&self) -> anyhow::Result<Vec<FeedEntry>> {
        anyhow::bail!("connection refused")
    }
    fn feed(&self) -> &FeedConfig {
        &self.0
    }
}

fn store(dir: &std::path::Path) -> IngestStore {
    IngestStore::new(dir.join("processed.json"), dir.join("rss_raw"))
}

#[tokio::test]
async fn second_run_over_same_feed_finds_nothing_new() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let filter = NoiseFilter::default();
    let cfg = IngestCfg::default();
    let sources = vec![wire()];

    let t1 = Utc.with_ymd_and_hms(2025, 1, 7, 15, 0, 0).unwrap();
    let first = run_once(&sources, &store, &filter, &cfg, t1).await.unwrap();
    // lottery item is noise
    assert_eq!(first.new_items.len(), 3);
    assert_eq!(first.feeds[0].filtered, 1);
    let batch = first.batch_path.clone().expect("batch written");
    assert_eq!(
        batch.file_name().unwrap().to_str().unwrap(),
        "batch_20250107T150000.json"
    );
    let items = read_batch(&batch).unwrap();
    assert_eq!(items, first.new_items);
    assert!(items.iter().all(|i| i.category == "markets" && i.fetched_at == t1));
    assert_eq!(items[0].summary, "The Federal Reserve held rates at 4.5% as expected.");

    let t2 = Utc.with_ymd_and_hms(2025, 1, 7, 16, 0, 0).unwrap();
    let second = run_once(&sources, &store, &filter, &cfg, t2).await.unwrap();
    assert!(second.new_items.is_empty());
    assert!(second.batch_path.is_none());
    assert_eq!(second.feeds[0].seen, 3);
    assert_eq!(second.processed_total, 3);
    assert_eq!(store.list_batches().unwrap().len(), 1);
}

#[tokio::test]
async fn failing_feed_is_skipped_and_processed_set_still_saved() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let sources: Vec<Box<dyn FeedSource>> = vec![
        Box::new(DownFeed(FeedConfig {
            name: "Down".into(),
            url: "https://down.example.com".into(),
            category: "macro".into(),
        })),
        wire(),
    ];
    let now = Utc.with_ymd_and_hms(2025, 1, 7, 15, 0, 0).unwrap();
    let report = run_once(&sources, &store, &NoiseFilter::default(), &IngestCfg::default(), now)
        .await
        .unwrap();

    assert!(report.feeds[0].error.as_deref().unwrap().contains("connection refused"));
    assert_eq!(report.feeds[1].new, 3);
    assert_eq!(store.load_processed().unwrap().len(), 3);
}

#[tokio::test]
async fn per_feed_cap_limits_entries_considered() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let cfg = IngestCfg {
        per_feed_cap: 1,
        ..IngestCfg::default()
    };
    let now = Utc.with_ymd_and_hms(2025, 1, 7, 15, 0, 0).unwrap();
    let report = run_once(&[wire()], &store, &NoiseFilter::default(), &cfg, now)
        .await
        .unwrap();
    assert_eq!(report.new_items.len(), 1);
    assert_eq!(report.new_items[0].title, "Fed holds interest rates steady");
}

#[tokio::test]
async fn empty_run_still_writes_processed_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let now = Utc.with_ymd_and_hms(2025, 1, 7, 15, 0, 0).unwrap();
    let report = run_once(&[], &store, &NoiseFilter::default(), &IngestCfg::default(), now)
        .await
        .unwrap();
    assert!(report.batch_path.is_none());
    let raw = std::fs::read_to_string(dir.path().join("processed.json")).unwrap();
    assert_eq!(raw.trim(), "[]");
}
