//! Pipeline configuration: sources, keyword lists, transport and output settings.
//!
//! [`PipelineConfig::default`] is the compiled-in configuration the binary
//! runs with. An optional YAML file may override any top-level section;
//! sections it leaves out keep their defaults.
//!
//! ```yaml
//! keywords:
//!   companies: [reliance, tata, wipro]
//! summary:
//!   model: gemini-1.5-flash
//! output:
//!   archive_dir: ./archive
//! ```

use crate::models::SourceDescriptor;
use crate::relevance::KeywordPolicy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Everything one run needs, passed explicitly into the pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sources: Vec<SourceDescriptor>,
    pub keywords: KeywordPolicy,
    pub fetch: FetchSettings,
    pub summary: SummarySettings,
    pub output: OutputSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            keywords: KeywordPolicy::default(),
            fetch: FetchSettings::default(),
            summary: SummarySettings::default(),
            output: OutputSettings::default(),
        }
    }
}

/// Business and markets listing pages of the Indian financial press.
pub fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::new(
            "Economic Times",
            "https://economictimes.indiatimes.com/markets/stocks/news",
            ".eachStory",
        ),
        SourceDescriptor::new(
            "Business Standard",
            "https://www.business-standard.com/markets",
            ".article",
        ),
        SourceDescriptor::new("Livemint", "https://www.livemint.com/market", ".headline"),
        SourceDescriptor::new(
            "Financial Express",
            "https://www.financialexpress.com/market/",
            ".ie-story",
        ),
    ]
}

/// Listing page transport and extraction settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchSettings {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Heading tags tried in order for a story's headline.
    pub heading_tags: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            timeout_secs: 10,
            heading_tags: vec!["h2".to_string(), "h3".to_string()],
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Gemini text generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SummarySettings {
    pub model: String,
    /// Base URL of the Generative Language REST API.
    pub endpoint: String,
    /// Pause after every model call, in milliseconds.
    pub delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            model: "gemini-pro".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            delay_ms: 1000,
            timeout_secs: 60,
        }
    }
}

impl SummarySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where the canonical store and the per-run archives are written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    pub store_path: PathBuf,
    pub archive_dir: PathBuf,
    pub archive_prefix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("business_news_summary.csv"),
            archive_dir: PathBuf::from("."),
            archive_prefix: "business_news_".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document over the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load and parse a YAML config file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml(&text)?;
        info!(sources = config.sources.len(), "Loaded configuration");
        Ok(config)
    }
}
