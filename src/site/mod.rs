// src/site/mod.rs
//! Static site materializer: (corpus, latest briefing, config) -> output tree.
//!
//! The output directory is deleted and rebuilt on every run. Apart from the
//! `updated` fields in the JSON documents and `lastBuildDate` in the feed,
//! the tree depends only on the inputs, so two builds of an unchanged corpus
//! are byte-identical once `generated_at` is pinned.

pub mod api;
pub mod discovery;
pub mod pages;
pub mod paginate;
pub mod xml;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::briefing::{self, Briefing};
use crate::config::SiteConfig;
use crate::corpus::{self, Article};
use crate::related::RelatedIndex;
use pages::{Card, Layout};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("site_files_written_total", "Files written into the output tree.");
        describe_gauge!("site_articles", "Articles in the last built corpus.");
        describe_histogram!("site_build_ms", "Full site build time in milliseconds.");
    });
}

/// Summary of one build, logged at the end of the job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub articles: usize,
    pub index_pages: usize,
    pub categories: usize,
    pub files_written: usize,
    /// Optional artifacts that were not produced, with the reason.
    pub skipped: Vec<String>,
}

/// Writes files below the output root and counts them.
struct Output {
    root: PathBuf,
    files: usize,
}

impl Output {
    fn write(&mut self, rel: &str, bytes: impl AsRef<[u8]>) -> Result<()> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        self.files += 1;
        counter!("site_files_written_total").increment(1);
        Ok(())
    }

    fn write_json<T: Serialize>(&mut self, rel: &str, value: &T) -> Result<()> {
        let s = serde_json::to_string_pretty(value).with_context(|| format!("serializing {rel}"))?;
        self.write(rel, s)
    }

    fn copy(&mut self, from: &Path, rel: &str) -> Result<()> {
        let to = self.root.join(rel);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::copy(from, &to)
            .with_context(|| format!("copying {} to {}", from.display(), to.display()))?;
        self.files += 1;
        counter!("site_files_written_total").increment(1);
        Ok(())
    }
}

pub struct SiteBuilder<'a> {
    cfg: &'a SiteConfig,
    generated_at: DateTime<Utc>,
}

impl<'a> SiteBuilder<'a> {
    pub fn new(cfg: &'a SiteConfig, generated_at: DateTime<Utc>) -> Self {
        Self { cfg, generated_at }
    }

    /// Configured categories first, then any other category the corpus uses.
    fn categories(&self, articles: &[Article]) -> Vec<String> {
        let mut out = self.cfg.categories.clone();
        let mut extra: Vec<String> = articles
            .iter()
            .map(|a| a.category.clone())
            .filter(|c| !out.contains(c))
            .collect();
        extra.sort();
        extra.dedup();
        out.extend(extra);
        out
    }

    /// Wipe the output directory and write the whole tree.
    pub fn build(&self, articles: &[Article], latest: Option<&Briefing>) -> Result<BuildReport> {
        ensure_metrics_described();
        let t0 = std::time::Instant::now();
        let cfg = self.cfg;
        let root = cfg.paths.output_dir.clone();
        reset_output_dir(&root, cfg)?;

        let mut out = Output { root, files: 0 };
        let mut report = BuildReport {
            articles: articles.len(),
            ..BuildReport::default()
        };

        copy_static(&cfg.paths.static_dir, &mut out)?;

        let updated = self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, false);
        let today = self.generated_at.format("%Y-%m-%d").to_string();
        let categories = self.categories(articles);

        // Index pages.
        let home = Layout::new(cfg, None, "/");
        for page in paginate::paginate(articles.len(), cfg.build.page_size) {
            let cards = articles[page.items.clone()].iter().map(Card::of).collect();
            let html = pages::render_index(&home, latest, cards, &page)?;
            out.write(&page.path(), html)?;
            report.index_pages += 1;
        }

        // Articles, each with its raw markdown alongside.
        let related = RelatedIndex::new(articles, &cfg.related);
        for (i, a) in articles.iter().enumerate() {
            let html = pages::render_article(cfg, a, &related.related_to(i))?;
            let rel = a.rel_path();
            out.write(&format!("{rel}.html"), html)?;
            out.copy(&a.source_path, &format!("{rel}.md"))?;
        }

        // Category pages and documents.
        let mut category_pages = Vec::with_capacity(categories.len());
        for category in &categories {
            let members: Vec<&Article> = articles.iter().filter(|a| &a.category == category).collect();
            match pages::render_category(cfg, category, &members) {
                Ok(html) => {
                    out.write(&format!("category/{category}.html"), html)?;
                    category_pages.push(category.clone());
                }
                Err(e) => {
                    tracing::warn!(target: "site", %category, error = ?e, "category page skipped");
                    report.skipped.push(format!("category/{category}.html: {e:#}"));
                }
            }
            out.write_json(
                &format!("api/category/{category}.json"),
                &api::category_doc(&cfg.site, category, &members, &updated),
            )?;
        }

        // Optional pages.
        let mut with_about = false;
        for (name, src) in [("about", "about.md"), ("404", "404.md")] {
            let src_path = cfg.paths.pages_dir.join(src);
            let rendered = fs::read_to_string(&src_path)
                .with_context(|| format!("reading {}", src_path.display()))
                .and_then(|text| pages::render_markdown_page(cfg, &text, &format!("/{name}.html")));
            match rendered {
                Ok(html) => {
                    out.write(&format!("{name}.html"), html)?;
                    with_about |= name == "about";
                }
                Err(e) => {
                    tracing::warn!(target: "site", page = name, error = %e, "optional page skipped");
                    report.skipped.push(format!("{name}.html: {e:#}"));
                }
            }
        }

        // JSON API. v1 is the same document, byte for byte.
        let index = serde_json::to_string_pretty(&api::index_doc(&cfg.site, articles, &updated))
            .context("serializing index.json")?;
        out.write("index.json", &index)?;
        out.write("v1/articles.json", &index)?;
        let todays = corpus::articles_on(articles, &today);
        out.write_json("api/today.json", &api::today_doc(&cfg.site, &today, &todays, &updated))?;
        out.write_json("api/briefing.json", &api::briefing_doc(latest, &updated))?;
        out.write_json(
            "api/briefing/today.json",
            &api::briefing_today_doc(latest, &today, &updated),
        )?;

        // Feeds and discovery.
        out.write("llms.txt", discovery::llms_txt(cfg, articles))?;
        out.write("llms-full.txt", discovery::llms_full_txt(cfg, articles))?;
        out.write("feed.xml", xml::rss_feed(cfg, articles, self.generated_at)?)?;
        out.write(
            "sitemap.xml",
            xml::sitemap(cfg, articles, &category_pages, with_about)?,
        )?;
        out.write_json(".well-known/ai-plugin.json", &discovery::ai_plugin(cfg))?;
        out.write_json(".well-known/ai.json", &discovery::ai_manifest(cfg))?;
        out.write("robots.txt", discovery::robots_txt(cfg))?;
        out.write("CNAME", discovery::cname(cfg)?)?;

        report.categories = category_pages.len();
        report.files_written = out.files;
        gauge!("site_articles").set(articles.len() as f64);
        histogram!("site_build_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(report)
    }
}

/// Absolute form of `path` with `.`/`..` applied and symlinks resolved for
/// every prefix that exists. Missing components are appended as written.
fn resolve(path: &Path) -> Result<PathBuf> {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("reading current directory")?
            .join(path)
    };
    let mut out = PathBuf::new();
    for comp in abs.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => {
                out.push(other.as_os_str());
                if out.exists() {
                    out = fs::canonicalize(&out)
                        .with_context(|| format!("resolving {}", out.display()))?;
                }
            }
        }
    }
    Ok(out)
}

/// Remove and recreate the output directory. Refuses the filesystem root,
/// the working directory or its ancestors, and any directory that contains
/// (or sits inside) one of the build or ingest inputs.
fn reset_output_dir(root: &Path, cfg: &SiteConfig) -> Result<()> {
    if root.as_os_str().is_empty() {
        bail!("output directory is empty");
    }
    let out = resolve(root)?;
    let cwd = resolve(Path::new("."))?;
    if out.parent().is_none() || cwd.starts_with(&out) {
        bail!("refusing to use {} as output directory", root.display());
    }
    let p = &cfg.paths;
    let dirs = [
        &p.content_dir,
        &p.briefings_dir,
        &p.static_dir,
        &p.pages_dir,
        &p.data_dir,
    ];
    for input in dirs {
        let resolved = resolve(input)?;
        if resolved.starts_with(&out) || out.starts_with(&resolved) {
            bail!(
                "output directory {} overlaps input {}",
                root.display(),
                input.display()
            );
        }
    }
    if resolve(&p.feeds_file)?.starts_with(&out) {
        bail!(
            "output directory {} contains input {}",
            root.display(),
            p.feeds_file.display()
        );
    }
    if out.exists() {
        fs::remove_dir_all(&out).with_context(|| format!("removing {}", out.display()))?;
    }
    fs::create_dir_all(&out).with_context(|| format!("creating {}", out.display()))
}

fn copy_static(dir: &Path, out: &mut Output) -> Result<()> {
    if !dir.is_dir() {
        tracing::debug!(target: "site", dir = %dir.display(), "no static directory");
        return Ok(());
    }
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .with_context(|| format!("{} outside {}", entry.path().display(), dir.display()))?;
        out.copy(entry.path(), &rel.to_string_lossy())?;
    }
    Ok(())
}

/// The `build` job: load corpus and latest briefing, then write the site.
pub fn run_from_config(cfg: &SiteConfig, generated_at: DateTime<Utc>) -> Result<BuildReport> {
    let articles = corpus::load_articles(&cfg.paths.content_dir)?;
    tracing::info!(target: "site", count = articles.len(), "loaded articles");

    let latest = match briefing::load_latest(&cfg.paths.briefings_dir) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(target: "site", error = ?e, "latest briefing unreadable, building without it");
            None
        }
    };

    let report = SiteBuilder::new(cfg, generated_at).build(&articles, latest.as_ref())?;
    tracing::info!(
        target: "site",
        articles = report.articles,
        index_pages = report.index_pages,
        categories = report.categories,
        files = report.files_written,
        skipped = report.skipped.len(),
        output = %cfg.paths.output_dir.display(),
        "site built"
    );
    Ok(report)
}
