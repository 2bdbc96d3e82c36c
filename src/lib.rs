// src/lib.rs
// Public library surface for the `msj` binary and integration tests.

pub mod config;
pub mod relevance;
pub mod telemetry;

// Ingestion job: feeds -> processed set + raw batches
pub mod ingest;

// Build job: corpus -> related articles -> static site
pub mod corpus;
pub mod related;
pub mod site;

// Daily briefing job
pub mod briefing;

// ---- Re-exports for stable public API ----
pub use crate::config::SiteConfig;
pub use crate::corpus::{load_articles, Article};
pub use crate::site::{BuildReport, SiteBuilder};
