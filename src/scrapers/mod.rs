//! Listing page scrapers for the configured news sources.
//!
//! Every source is handled the same way, driven by its [`SourceDescriptor`]:
//!
//! 1. **Fetching**: GET the listing page through a [`PageFetcher`]
//! 2. **Extracting**: select story nodes with the source's CSS selector and
//!    pull headline, link and teaser out of each (see [`listing`])
//!
//! Failures come back as a typed [`FetchError`]; the caller decides how to
//! log them and carries on with the other sources.

use crate::config::FetchSettings;
use crate::models::{RawArticle, SourceDescriptor};
use chrono::Local;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub mod listing;

/// Why a source produced no articles.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid source url {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Transport used to download a listing page.
pub trait PageFetcher {
    /// Return the body of `url` as text.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// [`PageFetcher`] backed by a `reqwest` client with a browser user agent
/// and a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout())
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpPageFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        debug!(bytes = body.len(), "Downloaded listing page");
        Ok(body)
    }
}

/// Fetch one source's listing page and extract its stories.
///
/// Every returned record is stamped with the time the page was parsed.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn fetch_source<F: PageFetcher>(
    fetcher: &F,
    source: &SourceDescriptor,
    settings: &FetchSettings,
) -> Result<Vec<RawArticle>, FetchError> {
    let html = fetcher.fetch_page(&source.url).await?;
    let articles = listing::extract_articles(&html, source, &settings.heading_tags, Local::now())?;
    info!(count = articles.len(), "Extracted articles");
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StaticPages(HashMap<String, String>);

    impl PageFetcher for StaticPages {
        async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
            self.0.get(url).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn source() -> SourceDescriptor {
        SourceDescriptor::new("Livemint", "https://www.livemint.com/market", ".headline")
    }

    #[tokio::test]
    async fn test_fetch_source_extracts_from_page() {
        let html = r#"<div class="headline"><h2>Tata Steel expands</h2><a href="/a/1">x</a></div>"#;
        let pages = StaticPages(HashMap::from([(source().url, html.to_string())]));

        let articles = fetch_source(&pages, &source(), &FetchSettings::default())
            .await
            .unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "Livemint");
        assert_eq!(articles[0].url, "https://www.livemint.com/a/1");
    }

    #[tokio::test]
    async fn test_fetch_source_propagates_transport_error() {
        let pages = StaticPages(HashMap::new());
        let err = fetch_source(&pages, &source(), &FetchSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[test]
    fn test_http_fetcher_builds_from_defaults() {
        assert!(HttpPageFetcher::new(&FetchSettings::default()).is_ok());
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_non_success_status() {
        let base = crate::utils::serve_once("403 Forbidden", "denied").await;
        let url = format!("{base}/markets");
        let fetcher = HttpPageFetcher::new(&FetchSettings::default()).unwrap();

        let err = fetcher.fetch_page(&url).await.unwrap_err();
        match err {
            FetchError::Status { url: failed, status } => {
                assert_eq!(status, 403);
                assert_eq!(failed, url);
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_fetcher_returns_body() {
        let base = crate::utils::serve_once("200 OK", "<html>listing</html>").await;
        let fetcher = HttpPageFetcher::new(&FetchSettings::default()).unwrap();
        assert_eq!(fetcher.fetch_page(&base).await.unwrap(), "<html>listing</html>");
    }
}
