//! Data models for news sources and the articles that flow through a run.
//!
//! This module defines the value types shared by every pipeline stage:
//! - [`SourceDescriptor`]: A news site listing page and how to find stories on it
//! - [`RawArticle`]: One story as extracted from a listing page
//! - [`EnrichedArticle`]: A relevant story plus its model-written summary
//!
//! Everything here is run-local data. The only state that outlives a run is
//! the CSV store in [`crate::outputs::store`].

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp layout used for `datetime` values in the CSV store.
pub const CAPTURED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A news site listing page to pull candidate stories from.
///
/// # Fields
///
/// * `name` - Display name, also written to the `source` column
/// * `url` - Listing page endpoint
/// * `selector` - CSS selector matching one node per story
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceDescriptor {
    /// Unique display name of the source.
    pub name: String,
    /// The listing page to GET.
    pub url: String,
    /// CSS selector that matches each story container on the page.
    pub selector: String,
}

impl SourceDescriptor {
    pub fn new(name: &str, url: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            selector: selector.to_string(),
        }
    }
}

/// A story as scraped from a listing page, before any filtering.
///
/// Extraction never emits a record without both a headline and a url.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArticle {
    /// Name of the [`SourceDescriptor`] this came from.
    pub source: String,
    /// Normalised headline text.
    pub headline: String,
    /// Absolute link to the story.
    pub url: String,
    /// Teaser paragraph, empty when the listing has none.
    pub summary: String,
    /// Wall-clock time the listing page was parsed.
    pub captured_at: DateTime<Local>,
}

impl RawArticle {
    /// Lowercased `headline + " " + summary`, the text keyword policies look at.
    pub fn match_text(&self) -> String {
        format!("{} {}", self.headline, self.summary).to_lowercase()
    }
}

/// A relevant story carrying its AI summary (or the failure sentinel).
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedArticle {
    pub article: RawArticle,
    pub ai_summary: String,
}

impl EnrichedArticle {
    pub fn new(article: RawArticle, ai_summary: String) -> Self {
        Self {
            article,
            ai_summary,
        }
    }

    /// `captured_at` rendered with [`CAPTURED_AT_FORMAT`].
    pub fn captured_at_string(&self) -> String {
        self.article.captured_at.format(CAPTURED_AT_FORMAT).to_string()
    }
}
