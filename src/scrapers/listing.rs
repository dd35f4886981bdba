//! Selector-driven extraction of stories from a listing page.
//!
//! Each node matched by the source's selector is one candidate story. Within
//! it the headline is the first element of the first configured heading tag
//! present in the node, the link is the first `<a>`, and the teaser is the
//! first `<p>`. Nodes without a headline or link are skipped; a heading that
//! exists but is blank counts as no headline.

use super::FetchError;
use crate::models::{RawArticle, SourceDescriptor};
use crate::utils::normalize_whitespace;
use chrono::{DateTime, Local};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

fn parse_selector(selector: &str) -> Result<Selector, FetchError> {
    Selector::parse(selector).map_err(|e| FetchError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Normalised text of the first descendant of `node` matching `selector`.
fn first_text(node: &ElementRef, selector: &Selector) -> Option<String> {
    node.select(selector)
        .next()
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
}

/// Make `href` absolute using the origin of the listing page.
///
/// Links already starting with `http` are returned untouched; anything else
/// is resolved against `scheme://host/` of `base`.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    if href.starts_with("http") {
        return Some(href.to_string());
    }
    let origin = base.join("/").ok()?;
    origin.join(href).ok().map(|u| u.to_string())
}

/// Extract every story from a listing page.
///
/// # Arguments
///
/// * `html` - The listing page body
/// * `source` - Descriptor supplying the story selector, endpoint and name
/// * `heading_tags` - Heading selectors tried in order for the headline
/// * `captured_at` - Timestamp stamped on every record
///
/// # Returns
///
/// The stories in page order. A selector matching nothing yields an empty
/// vector; only an unparseable selector or endpoint is an error.
pub fn extract_articles(
    html: &str,
    source: &SourceDescriptor,
    heading_tags: &[String],
    captured_at: DateTime<Local>,
) -> Result<Vec<RawArticle>, FetchError> {
    let base = Url::parse(&source.url).map_err(|e| FetchError::Url {
        url: source.url.clone(),
        source: e,
    })?;
    let story_selector = parse_selector(&source.selector)?;
    let headings = heading_tags
        .iter()
        .map(|tag| parse_selector(tag))
        .collect::<Result<Vec<_>, _>>()?;
    let link = parse_selector("a")?;
    let paragraph = parse_selector("p")?;

    let document = Html::parse_document(html);
    let mut articles = Vec::new();
    let mut skipped = 0usize;

    for node in document.select(&story_selector) {
        let headline = headings
            .iter()
            .find_map(|h| first_text(&node, h))
            .unwrap_or_default();

        let url = node
            .select(&link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .and_then(|href| resolve_link(&base, href))
            .unwrap_or_default();

        if headline.is_empty() || url.is_empty() {
            skipped += 1;
            continue;
        }

        let summary = first_text(&node, &paragraph).unwrap_or_default();

        articles.push(RawArticle {
            source: source.name.clone(),
            headline,
            url,
            summary,
            captured_at,
        });
    }

    debug!(
        source = %source.name,
        kept = articles.len(),
        skipped,
        "Parsed listing page"
    );
    Ok(articles)
}
