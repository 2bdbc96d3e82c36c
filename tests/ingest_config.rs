// tests/ingest_config.rs
use molt_street_journal::ingest::config::{load_feeds_default, load_feeds_from};
use molt_street_journal::config::SiteConfig;
use molt_street_journal::ingest::select_feeds;
use std::{env, fs, path::Path};

#[test]
fn feed_files_parse_by_extension() {
    let dir = tempfile::tempdir().unwrap();

    let p_yaml = dir.path().join("feeds.yml");
    fs::write(
        &p_yaml,
        "feeds:\n  - name: Fed\n    url: https://example.com/fed.xml\n    category: macro\n  - name: Wire\n    url: https://example.com/wire.xml\n",
    )
    .unwrap();
    let y = load_feeds_from(&p_yaml).unwrap();
    assert_eq!(y.len(), 2);
    assert_eq!(y[0].category, "macro");
    assert_eq!(y[1].category, "general");

    let p_toml = dir.path().join("feeds.toml");
    fs::write(
        &p_toml,
        "[[feeds]]\nname = \" Fed \"\nurl = \"https://example.com/fed.xml\"\n",
    )
    .unwrap();
    let t = load_feeds_from(&p_toml).unwrap();
    assert_eq!(t[0].name, "Fed");

    let p_json = dir.path().join("feeds.json");
    fs::write(&p_json, r#"{"feeds": [{"name": "X", "url": "https://x.test/rss"}]}"#).unwrap();
    assert_eq!(load_feeds_from(&p_json).unwrap()[0].name, "X");

    let p_bad = dir.path().join("bad.yml");
    fs::write(&p_bad, "feeds: [{name: A, url: u}, {name: A, url: v}]").unwrap();
    let err = load_feeds_from(&p_bad).unwrap_err();
    assert!(format!("{err:#}").contains("duplicate feed name"));
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_configured_path() {
    let tmp = tempfile::tempdir().unwrap();
    env::remove_var("MSJ_FEEDS_PATH");

    // 1) Nothing there: the fetch job cannot run without feeds
    let configured = tmp.path().join("feeds.yml");
    assert!(load_feeds_default(&configured).is_err());

    // 2) Configured path
    fs::write(&configured, "feeds:\n  - name: Fed\n    url: https://example.com/fed.xml\n").unwrap();
    assert_eq!(load_feeds_default(&configured).unwrap()[0].name, "Fed");

    // 3) Env wins
    let p_env = tmp.path().join("other.json");
    fs::write(&p_env, r#"[{"name": "EnvFeed", "url": "https://e.test/rss"}]"#).unwrap();
    env::set_var("MSJ_FEEDS_PATH", p_env.display().to_string());
    assert_eq!(load_feeds_default(&configured).unwrap()[0].name, "EnvFeed");

    // 4) Env pointing nowhere is an error, not a silent fallback
    env::set_var("MSJ_FEEDS_PATH", "/definitely/not/here.yml");
    assert!(load_feeds_default(Path::new(&configured)).is_err());
    env::remove_var("MSJ_FEEDS_PATH");
}

#[serial_test::serial]
#[test]
fn explicit_feeds_path_beats_env() {
    let tmp = tempfile::tempdir().unwrap();
    let from_env = tmp.path().join("env.yml");
    fs::write(&from_env, "feeds:\n  - name: EnvFeed\n    url: https://e.test/rss\n").unwrap();
    let explicit = tmp.path().join("cli.yml");
    fs::write(&explicit, "feeds:\n  - name: CliFeed\n    url: https://c.test/rss\n").unwrap();
    env::set_var("MSJ_FEEDS_PATH", from_env.display().to_string());

    let cfg = SiteConfig::default();
    assert_eq!(select_feeds(&cfg, Some(&explicit)).unwrap()[0].name, "CliFeed");
    assert_eq!(select_feeds(&cfg, None).unwrap()[0].name, "EnvFeed");

    // a missing explicit file is an error, never a fallback to the env list
    assert!(select_feeds(&cfg, Some(&tmp.path().join("missing.yml"))).is_err());
    env::remove_var("MSJ_FEEDS_PATH");
}
