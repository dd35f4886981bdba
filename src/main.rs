//! # Business News Digest
//!
//! A news ingestion pipeline that pulls headlines from Indian business
//! news sites, keeps the ones about companies, industries and the economy
//! (dropping stock tips and off-topic stories), asks Gemini for a short
//! fundamentals-only summary of each, and records them in a CSV store.
//!
//! ## Usage
//!
//! ```sh
//! GOOGLE_API_KEY=... business_news_digest
//! ```
//!
//! ## Architecture
//!
//! Each invocation performs exactly one run:
//! 1. **Fetching**: Download every source's listing page and extract stories
//! 2. **Filtering**: Keep stories matching the keyword policy
//! 3. **Summarizing**: One Gemini call per story, paced by a fixed delay
//! 4. **Output**: Merge into `business_news_summary.csv` (first headline wins)
//!    and write a timestamped snapshot of this run's batch

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod models;
mod outputs;
mod pipeline;
mod relevance;
mod scrapers;
mod summarize;
mod utils;

use api::GeminiClient;
use cli::Cli;
use config::PipelineConfig;
use scrapers::HttpPageFetcher;
use summarize::Summarizer;
use utils::ensure_writable_dir;

/// Resolve the effective configuration: file (if any), then CLI overrides.
async fn load_config(args: &Cli) -> Result<PipelineConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path).await?,
        None => PipelineConfig::default(),
    };
    if let Some(store) = &args.store {
        config.output.store_path = store.clone();
    }
    if let Some(dir) = &args.archive_dir {
        config.output.archive_dir = dir.clone();
    }
    if let Some(model) = &args.model {
        config.summary.model = model.clone();
    }
    Ok(config)
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let started_at = Local::now();
    info!("business_news_digest starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.store, ?args.archive_dir, "Parsed CLI arguments");

    let config = load_config(&args).await?;
    info!(
        sources = config.sources.len(),
        store = %config.output.store_path.display(),
        archive_dir = %config.output.archive_dir.display(),
        model = %config.summary.model,
        "Configuration ready"
    );

    // Missing directories are created up front; a failure here only means
    // the corresponding write will fail and be reported later.
    if let Some(parent) = config.output.store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = ensure_writable_dir(parent).await {
            warn!(path = %parent.display(), error = %e, "Store directory is not writable");
        }
    }
    if let Err(e) = ensure_writable_dir(&config.output.archive_dir).await {
        warn!(path = %config.output.archive_dir.display(), error = %e, "Archive directory is not writable");
    }

    let fetcher = HttpPageFetcher::new(&config.fetch)?;
    let client = GeminiClient::new(&args.google_api_key, &config.summary)?;
    let summarizer = Summarizer::new(client, config.summary.delay());

    let report = pipeline::run(&config, &fetcher, &summarizer, started_at).await;

    let failed_sources: Vec<&str> = report
        .sources
        .iter()
        .filter(|s| s.result.is_err())
        .map(|s| s.source.as_str())
        .collect();
    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        fetched = report.fetched,
        relevant = report.relevant,
        summarized = report.articles.len(),
        summary_failures = report.summary_failures,
        ?failed_sources,
        store = %report.store_path.display(),
        store_ok = report.store.is_ok(),
        archive = %report.archive_path.display(),
        archive_ok = report.archive.is_ok(),
        "News extraction and summarization completed"
    );

    Ok(())
}
