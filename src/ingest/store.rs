// src/ingest/store.rs
//! On-disk ingestion state: the processed-identifier set and raw batch files.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::ingest::types::FeedItem;

/// Every item identifier ever ingested. Only grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedSet {
    ids: BTreeSet<String>,
}

impl ProcessedSet {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns `true` when the id was not present before.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

/// Paths owned by the ingestion job.
#[derive(Debug, Clone)]
pub struct IngestStore {
    processed_path: PathBuf,
    batch_dir: PathBuf,
}

impl IngestStore {
    pub fn new(processed_path: impl Into<PathBuf>, batch_dir: impl Into<PathBuf>) -> Self {
        Self {
            processed_path: processed_path.into(),
            batch_dir: batch_dir.into(),
        }
    }

    pub fn processed_path(&self) -> &Path {
        &self.processed_path
    }

    pub fn batch_dir(&self) -> &Path {
        &self.batch_dir
    }

    /// Missing file means a fresh start; a corrupt file is an error, never an empty set.
    pub fn load_processed(&self) -> Result<ProcessedSet> {
        if !self.processed_path.exists() {
            return Ok(ProcessedSet::default());
        }
        let s = fs::read_to_string(&self.processed_path)
            .with_context(|| format!("reading {}", self.processed_path.display()))?;
        let ids: Vec<String> = serde_json::from_str(&s)
            .with_context(|| format!("parsing {}", self.processed_path.display()))?;
        Ok(ProcessedSet {
            ids: ids.into_iter().collect(),
        })
    }

    /// Rewrite the processed file as a sorted JSON list (atomic replace).
    pub fn save_processed(&self, set: &ProcessedSet) -> Result<()> {
        let ids: Vec<&str> = set.iter().collect();
        let json = serde_json::to_string(&ids)?;
        write_atomic(&self.processed_path, json.as_bytes())
    }

    /// Write one `batch_<YYYYMMDDTHHMMSS>.json` file and return its path.
    pub fn write_batch(&self, items: &[FeedItem], now: DateTime<Utc>) -> Result<PathBuf> {
        let name = format!("batch_{}.json", now.format("%Y%m%dT%H%M%S"));
        let path = self.batch_dir.join(name);
        let json = serde_json::to_string_pretty(items)?;
        write_atomic(&path, json.as_bytes())?;
        Ok(path)
    }

    /// All batch files, oldest first.
    pub fn list_batches(&self) -> Result<Vec<PathBuf>> {
        if !self.batch_dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for e in fs::read_dir(&self.batch_dir)
            .with_context(|| format!("listing {}", self.batch_dir.display()))?
        {
            let path = e?.path();
            let is_batch = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("batch_") && n.ends_with(".json"));
            if is_batch {
                out.push(path);
            }
        }
        out.sort();
        Ok(out)
    }
}

pub fn read_batch(path: &Path) -> Result<Vec<FeedItem>> {
    let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parsing {}", path.display()))
}

/// Write to `<path>.tmp`, then rename over the target.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    {
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn processed_roundtrip_is_sorted_and_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = IngestStore::new(dir.path().join("data/processed.json"), dir.path().join("raw"));
        assert!(store.load_processed().unwrap().is_empty());

        let mut set = ProcessedSet::default();
        set.insert("b");
        set.insert("a");
        assert!(!set.insert("a"));
        store.save_processed(&set).unwrap();

        let raw = fs::read_to_string(store.processed_path()).unwrap();
        assert_eq!(raw, r#"["a","b"]"#);
        assert_eq!(store.load_processed().unwrap(), set);
    }

    #[test]
    fn corrupt_processed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("processed.json");
        fs::write(&p, "not json").unwrap();
        let store = IngestStore::new(&p, dir.path());
        assert!(store.load_processed().is_err());
    }

    #[test]
    fn batch_file_name_uses_utc_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = IngestStore::new(dir.path().join("p.json"), dir.path().join("raw"));
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let path = store.write_batch(&[], now).unwrap();
        assert!(path.ends_with("batch_20250304T050607.json"));
        assert_eq!(store.list_batches().unwrap(), vec![path.clone()]);
        assert!(read_batch(&path).unwrap().is_empty());
    }
}
