//! `msj`: Molt Street Journal batch jobs.
//!
//!   msj fetch      pull configured feeds into a new raw batch
//!   msj build      render the static site into the output directory
//!   msj briefing   write today's market briefing from today's articles

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use molt_street_journal::briefing::generate::{self, BriefingOutcome};
use molt_street_journal::config::SiteConfig;
use molt_street_journal::telemetry::{self, Metrics};
use molt_street_journal::{ingest, site};

#[derive(Parser, Debug)]
#[command(name = "msj")]
#[command(version, about = "Molt Street Journal: feed ingestion, daily briefing and static site build")]
struct Cli {
    /// Site config (TOML). Falls back to $MSJ_CONFIG_PATH, then config/site.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Write Prometheus exposition text here when the job ends
    #[arg(long, global = true, env = "MSJ_METRICS_FILE")]
    metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch RSS/Atom feeds and store unseen, relevant items as a batch
    Fetch(FetchArgs),
    /// Build the static site from the article corpus
    Build(BuildArgs),
    /// Generate today's market briefing with the LLM
    Briefing,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Feed list (YAML, TOML or JSON); overrides $MSJ_FEEDS_PATH and the configured path
    #[arg(long)]
    feeds: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Output directory; overrides the configured path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env in local/dev; API keys and overrides come from the environment.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    telemetry::init_tracing(cli.json_logs);

    let mut cfg = match &cli.config {
        Some(p) => SiteConfig::load_from_file(p)?,
        None => SiteConfig::load_default()?,
    };
    let metrics = match &cli.metrics_file {
        Some(_) => Some(Metrics::init()?),
        None => None,
    };

    let result = run(cli.command, &mut cfg).await;

    if let (Some(m), Some(path)) = (&metrics, &cli.metrics_file) {
        if let Err(e) = m.write_textfile(path) {
            tracing::warn!(error = ?e, "metrics textfile not written");
        }
    }
    result
}

async fn run(command: Commands, cfg: &mut SiteConfig) -> Result<()> {
    match command {
        Commands::Fetch(args) => {
            let report = ingest::run_from_config(cfg, args.feeds.as_deref()).await?;
            let failed = report.feeds.iter().filter(|f| f.error.is_some()).count();
            tracing::info!(
                new = report.new_items.len(),
                feeds = report.feeds.len(),
                failed,
                processed_total = report.processed_total,
                "fetch finished"
            );
        }
        Commands::Build(args) => {
            if let Some(output) = args.output {
                cfg.paths.output_dir = output;
            }
            site::run_from_config(cfg, Utc::now())?;
        }
        Commands::Briefing => {
            match generate::run(cfg, Utc::now(), generate::gemini_from_env).await? {
                BriefingOutcome::Saved(path) => {
                    tracing::info!(path = %path.display(), "briefing saved")
                }
                BriefingOutcome::Skipped => tracing::info!("no briefing today"),
                BriefingOutcome::Failed(reason) => {
                    tracing::error!(%reason, "briefing generation failed")
                }
            }
        }
    }
    Ok(())
}
