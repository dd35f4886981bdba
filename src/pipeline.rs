//! One end-to-end ingestion run.
//!
//! The run is a straight sequence of stages, each producing a fresh vector
//! for the next:
//! 1. **Fetching**: every configured source, concurrently, failures isolated
//! 2. **Filtering**: keep stories the [`KeywordPolicy`] accepts
//! 3. **Summarizing**: one model call per story, strictly in sequence
//! 4. **Persisting**: merge into the canonical store, then write the run archive
//!
//! No stage aborts the run. Failures are logged here and collected in the
//! returned [`RunReport`].

use crate::api::{AskAsync, SummaryError};
use crate::config::{FetchSettings, PipelineConfig};
use crate::models::{EnrichedArticle, RawArticle, SourceDescriptor};
use crate::outputs::store::{self, PersistError};
use crate::relevance::KeywordPolicy;
use crate::scrapers::{FetchError, PageFetcher, fetch_source};
use crate::summarize::{SUMMARY_FAILED, Summarizer};
use crate::utils::archive_path;
use chrono::{DateTime, Local};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

/// What one source contributed to the run.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: String,
    pub result: Result<usize, FetchError>,
}

/// Everything observable about a finished run.
#[derive(Debug)]
pub struct RunReport {
    pub sources: Vec<SourceOutcome>,
    pub fetched: usize,
    pub relevant: usize,
    pub summary_failures: usize,
    pub articles: Vec<EnrichedArticle>,
    pub store_path: PathBuf,
    pub store: Result<usize, PersistError>,
    pub archive_path: PathBuf,
    pub archive: Result<usize, PersistError>,
}

/// Fetch every source concurrently and concatenate the results in registry order.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn fetch_all<F: PageFetcher>(
    fetcher: &F,
    sources: &[SourceDescriptor],
    settings: &FetchSettings,
) -> (Vec<RawArticle>, Vec<SourceOutcome>) {
    let results = join_all(sources.iter().map(|source| async move {
        info!(source = %source.name, "Fetching news from {}", source.name);
        (source, fetch_source(fetcher, source, settings).await)
    }))
    .await;

    let mut articles = Vec::new();
    let mut outcomes = Vec::with_capacity(results.len());
    for (source, result) in results {
        let result = match result {
            Ok(found) => {
                info!(source = %source.name, count = found.len(), "Found {} articles", found.len());
                let count = found.len();
                articles.extend(found);
                Ok(count)
            }
            Err(e) => {
                error!(source = %source.name, url = %source.url, error = %e, "Error fetching source");
                Err(e)
            }
        };
        outcomes.push(SourceOutcome {
            source: source.name.clone(),
            result,
        });
    }
    (articles, outcomes)
}

/// Keep the articles `policy` considers relevant, preserving order.
pub fn filter_relevant(policy: &KeywordPolicy, articles: Vec<RawArticle>) -> Vec<RawArticle> {
    articles
        .into_iter()
        .filter(|article| {
            let verdict = policy.verdict(article);
            debug!(headline = %article.headline, ?verdict, "Relevance verdict");
            verdict.is_relevant()
        })
        .collect()
}

/// Summarize each article in turn. Failed calls keep the article with
/// [`SUMMARY_FAILED`] as its summary.
///
/// # Returns
///
/// The enriched articles (one per input, same order) and the number of
/// failed summary calls.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn summarize_all<A: AskAsync>(
    summarizer: &Summarizer<A>,
    articles: Vec<RawArticle>,
) -> (Vec<EnrichedArticle>, usize) {
    let mut failures = 0usize;
    let mut enriched = Vec::with_capacity(articles.len());

    for (index, article) in articles.into_iter().enumerate() {
        let ai_summary = match summarizer.summarize(&article).await {
            Ok(text) => text,
            Err(e) => {
                failures += 1;
                log_summary_failure(index, &article, &e);
                SUMMARY_FAILED.to_string()
            }
        };
        enriched.push(EnrichedArticle::new(article, ai_summary));
    }
    (enriched, failures)
}

fn log_summary_failure(index: usize, article: &RawArticle, e: &SummaryError) {
    error!(
        index,
        source = %article.source,
        headline = %article.headline,
        error = %e,
        "Error summarizing article"
    );
}

async fn persist(batch: &[EnrichedArticle], path: &Path) -> Result<usize, PersistError> {
    let result = store::merge_and_save(batch, path).await;
    match &result {
        Ok(_) => info!(path = %path.display(), "Saved {} articles to {}", batch.len(), path.display()),
        Err(e) => error!(path = %path.display(), error = %e, "Error saving articles"),
    }
    result
}

/// Perform one full run.
///
/// # Arguments
///
/// * `config` - Sources, keyword lists and output locations
/// * `fetcher` - Transport for listing pages
/// * `summarizer` - Model client with its rate-limit pause
/// * `started_at` - Run start time, used to name the archive file
#[instrument(level = "info", skip_all)]
pub async fn run<F: PageFetcher, A: AskAsync>(
    config: &PipelineConfig,
    fetcher: &F,
    summarizer: &Summarizer<A>,
    started_at: DateTime<Local>,
) -> RunReport {
    let (articles, sources) = fetch_all(fetcher, &config.sources, &config.fetch).await;
    let fetched = articles.len();

    info!("Filtering for relevant business news");
    let relevant_articles = filter_relevant(&config.keywords, articles);
    let relevant = relevant_articles.len();
    info!(relevant, fetched, "Found {} relevant articles out of {}", relevant, fetched);

    info!("Summarizing articles");
    let (enriched, summary_failures) = summarize_all(summarizer, relevant_articles).await;
    info!(
        total = enriched.len(),
        failed = summary_failures,
        "Completed article summaries"
    );

    let store_path = config.output.store_path.clone();
    let store = persist(&enriched, &store_path).await;

    let archive_path = archive_path(
        &config.output.archive_dir,
        &config.output.archive_prefix,
        &started_at,
    );
    let archive = persist(&enriched, &archive_path).await;

    RunReport {
        sources,
        fetched,
        relevant,
        summary_failures,
        articles: enriched,
        store_path,
        store,
        archive_path,
        archive,
    }
}
