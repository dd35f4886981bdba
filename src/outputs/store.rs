//! CSV article store with first-seen-wins deduplication by headline.
//!
//! The store is one row per article with the columns
//! `source, headline, url, summary, datetime, ai_summary`.
//!
//! Updating a store is always the same path: load it (or start empty when
//! the file is absent), append the batch after the existing rows, keep the
//! first row for each headline, and rewrite the whole file.

use crate::models::EnrichedArticle;
use csv::{ReaderBuilder, WriterBuilder};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Column order of every store file.
pub const COLUMNS: [&str; 6] = ["source", "headline", "url", "summary", "datetime", "ai_summary"];

/// Why a store write was skipped.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("store has no {0:?} column")]
    MissingColumn(&'static str),
}

/// One row of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArticleRecord {
    pub source: String,
    pub headline: String,
    pub url: String,
    pub summary: String,
    pub datetime: String,
    pub ai_summary: String,
}

impl From<&EnrichedArticle> for ArticleRecord {
    fn from(enriched: &EnrichedArticle) -> Self {
        Self {
            source: enriched.article.source.clone(),
            headline: enriched.article.headline.clone(),
            url: enriched.article.url.clone(),
            summary: enriched.article.summary.clone(),
            datetime: enriched.captured_at_string(),
            ai_summary: enriched.ai_summary.clone(),
        }
    }
}

/// Decode store rows from CSV bytes.
fn decode(bytes: &[u8]) -> Result<Vec<ArticleRecord>, PersistError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let mut reader = ReaderBuilder::new().from_reader(bytes);
    if !reader.headers()?.iter().any(|h| h == "headline") {
        return Err(PersistError::MissingColumn("headline"));
    }
    let rows = reader
        .deserialize::<ArticleRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Encode rows as CSV, header first, so an empty table still has columns.
fn encode(rows: &[ArticleRecord]) -> Result<Vec<u8>, PersistError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.into_inner().map_err(|e| PersistError::Io(e.into_error()))
}

/// Read the store at `path`, treating a missing file as an empty table.
pub async fn load_or_empty(path: &Path) -> Result<Vec<ArticleRecord>, PersistError> {
    match fs::read(path).await {
        Ok(bytes) => decode(&bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Append `batch` after `existing` and keep the first row for every headline.
///
/// Existing rows therefore win over incoming rows with the same headline.
pub fn merge(existing: Vec<ArticleRecord>, batch: Vec<ArticleRecord>) -> Vec<ArticleRecord> {
    existing
        .into_iter()
        .chain(batch)
        .unique_by(|row| row.headline.clone())
        .collect()
}

/// Sibling of `path` the new contents are staged in before the rename.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace the store at `path` with `rows`.
///
/// The file is written next to the target and renamed over it, so a failed
/// write leaves the previous store intact.
pub async fn save(path: &Path, rows: &[ArticleRecord]) -> Result<(), PersistError> {
    let bytes = encode(rows)?;
    let staging = staging_path(path);
    if let Err(e) = fs::write(&staging, bytes).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }
    fs::rename(&staging, path).await?;
    Ok(())
}

/// Merge `batch` into the store at `path` and write it back.
///
/// # Returns
///
/// The number of rows in the store after the merge.
#[instrument(level = "info", skip_all, fields(path = %path.display(), batch = batch.len()))]
pub async fn merge_and_save(batch: &[EnrichedArticle], path: &Path) -> Result<usize, PersistError> {
    let existing = load_or_empty(path).await?;
    let existing_len = existing.len();
    let incoming = batch.iter().map(ArticleRecord::from).collect();
    let merged = merge(existing, incoming);
    debug!(
        existing = existing_len,
        added = merged.len().saturating_sub(existing_len),
        "Merged batch into store"
    );
    save(path, &merged).await?;
    info!(rows = merged.len(), "Store written");
    Ok(merged.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawArticle;
    use chrono::{Local, TimeZone};

    fn row(headline: &str, summary: &str) -> ArticleRecord {
        ArticleRecord {
            source: "X".to_string(),
            headline: headline.to_string(),
            url: format!("https://example.com/{headline}"),
            summary: summary.to_string(),
            datetime: "2025-05-06 08:00:00".to_string(),
            ai_summary: "ok".to_string(),
        }
    }

    fn enriched(headline: &str, summary: &str) -> EnrichedArticle {
        EnrichedArticle::new(
            RawArticle {
                source: "Livemint".to_string(),
                headline: headline.to_string(),
                url: "https://www.livemint.com/a".to_string(),
                summary: summary.to_string(),
                captured_at: Local.with_ymd_and_hms(2025, 5, 6, 9, 15, 0).unwrap(),
            },
            "AI, with \"quotes\"\nand a newline".to_string(),
        )
    }

    #[test]
    fn test_merge_keeps_existing_row_on_conflict() {
        let merged = merge(vec![row("A", "old")], vec![row("A", "new")]);
        assert_eq!(merged, vec![row("A", "old")]);
    }

    #[test]
    fn test_merge_appends_new_headlines_in_order() {
        let merged = merge(vec![row("A", "")], vec![row("B", ""), row("C", ""), row("B", "dup")]);
        let headlines: Vec<_> = merged.iter().map(|r| r.headline.as_str()).collect();
        assert_eq!(headlines, ["A", "B", "C"]);
    }

    #[test]
    fn test_merge_into_empty_store() {
        assert_eq!(merge(vec![], vec![row("A", "")]), vec![row("A", "")]);
    }

    #[test]
    fn test_record_from_enriched() {
        let record = ArticleRecord::from(&enriched("GDP beats estimates", "q4"));
        assert_eq!(record.source, "Livemint");
        assert_eq!(record.datetime, "2025-05-06 09:15:00");
        assert_eq!(record.ai_summary, "AI, with \"quotes\"\nand a newline");
    }

    #[test]
    fn test_encode_empty_table_has_header() {
        let bytes = encode(&[]).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "source,headline,url,summary,datetime,ai_summary\n"
        );
    }

    #[test]
    fn test_decode_tolerates_missing_and_reordered_columns() {
        let csv = "headline,source\nA,Mint\n";
        let rows = decode(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].headline, "A");
        assert_eq!(rows[0].source, "Mint");
        assert_eq!(rows[0].ai_summary, "");
    }

    #[test]
    fn test_decode_rejects_store_without_headline_column() {
        let csv = "title,source\nA,Mint\n";
        assert!(matches!(
            decode(csv.as_bytes()),
            Err(PersistError::MissingColumn("headline"))
        ));
    }

    #[test]
    fn test_decode_empty_file_is_empty_table() {
        assert!(decode(b"").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let rows = load_or_empty(&tmp.path().join("absent.csv")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_merge_and_save_creates_then_merges() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.csv");

        let count = merge_and_save(&[enriched("A", "old")], &path).await.unwrap();
        assert_eq!(count, 1);

        let count = merge_and_save(&[enriched("A", "new"), enriched("B", "b")], &path)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let rows = load_or_empty(&path).await.unwrap();
        assert_eq!(rows[0].headline, "A");
        assert_eq!(rows[0].summary, "old");
        assert_eq!(rows[1].headline, "B");
        assert_eq!(rows[0].ai_summary, "AI, with \"quotes\"\nand a newline");
    }

    #[tokio::test]
    async fn test_merge_and_save_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.csv");
        let batch = [enriched("A", ""), enriched("B", "")];

        merge_and_save(&batch, &path).await.unwrap();
        let once = load_or_empty(&path).await.unwrap();
        merge_and_save(&batch, &path).await.unwrap();
        let twice = load_or_empty(&path).await.unwrap();

        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_empty_batch_still_writes_header() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("archive.csv");
        assert_eq!(merge_and_save(&[], &path).await.unwrap(), 0);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("source,headline"));
    }

    #[tokio::test]
    async fn test_unreadable_store_is_not_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.csv");
        std::fs::write(&path, "title\nsomething\n").unwrap();

        assert!(merge_and_save(&[enriched("A", "")], &path).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "title\nsomething\n");
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing").join("store.csv");
        assert!(matches!(save(&path, &[]).await, Err(PersistError::Io(_))));
    }

    #[test]
    fn test_staging_path_is_a_sibling() {
        assert_eq!(
            staging_path(Path::new("/data/business_news_summary.csv")),
            PathBuf::from("/data/business_news_summary.csv.tmp")
        );
    }

    #[tokio::test]
    async fn test_save_replaces_store_without_leftovers() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.csv");
        save(&path, &[row("A", "")]).await.unwrap();
        save(&path, &[row("A", ""), row("B", "")]).await.unwrap();

        assert_eq!(load_or_empty(&path).await.unwrap().len(), 2);
        assert!(!staging_path(&path).exists());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_store() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.csv");
        save(&path, &[row("A", "old")]).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        // A directory squatting on the staging path makes the write fail.
        std::fs::create_dir(staging_path(&path)).unwrap();
        assert!(matches!(
            merge_and_save(&[enriched("B", "")], &path).await,
            Err(PersistError::Io(_))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }
}
