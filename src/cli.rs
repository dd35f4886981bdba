//! Command-line interface definitions for Business News Digest.
//!
//! Every flag is optional except the API key, which is normally supplied
//! through the `GOOGLE_API_KEY` environment variable, so a bare invocation
//! performs one run with the built-in configuration.

use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use std::path::PathBuf;

/// Command-line arguments for a single ingestion run.
///
/// # Examples
///
/// ```sh
/// # One run with the built-in sources and keyword lists
/// GOOGLE_API_KEY=... business_news_digest
///
/// # Custom keyword lists and a separate archive directory
/// business_news_digest --config digest.yaml --archive-dir ./archive
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional YAML file overriding the built-in configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Canonical CSV store (overrides the config file)
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// Directory for per-run archive files (overrides the config file)
    #[arg(short, long)]
    pub archive_dir: Option<PathBuf>,

    /// Gemini model name (overrides the config file)
    #[arg(long)]
    pub model: Option<String>,

    /// Google Generative Language API key
    #[arg(
        long,
        env = "GOOGLE_API_KEY",
        hide_env_values = true,
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub google_api_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};

    /// Parse with the key's env fallback pointed at a variable nobody sets.
    fn try_parse_isolated(args: &[&str]) -> Result<Cli, clap::Error> {
        let matches = Cli::command()
            .mut_arg("google_api_key", |arg| {
                arg.env("BUSINESS_NEWS_DIGEST_TEST_UNSET_KEY")
            })
            .try_get_matches_from(args)?;
        Cli::from_arg_matches(&matches)
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "business_news_digest",
            "--google-api-key",
            "k",
            "--store",
            "./news.csv",
            "--archive-dir",
            "./archive",
            "--model",
            "gemini-1.5-flash",
        ]);

        assert_eq!(cli.google_api_key, "k");
        assert_eq!(cli.store, Some(PathBuf::from("./news.csv")));
        assert_eq!(cli.archive_dir, Some(PathBuf::from("./archive")));
        assert_eq!(cli.model.as_deref(), Some("gemini-1.5-flash"));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "business_news_digest",
            "--google-api-key",
            "k",
            "-c",
            "/tmp/digest.yaml",
            "-a",
            "/tmp/archive",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/digest.yaml")));
        assert_eq!(cli.archive_dir, Some(PathBuf::from("/tmp/archive")));
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        assert!(try_parse_isolated(&["business_news_digest"]).is_err());
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        assert!(try_parse_isolated(&["business_news_digest", "--google-api-key", ""]).is_err());
        assert!(try_parse_isolated(&["business_news_digest", "--google-api-key="]).is_err());
    }

    #[test]
    fn test_api_key_from_flag_is_accepted() {
        let cli = try_parse_isolated(&["business_news_digest", "--google-api-key", "k"]).unwrap();
        assert_eq!(cli.google_api_key, "k");
    }
}
