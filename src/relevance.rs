//! Keyword policy deciding which stories count as business/economy news.
//!
//! Matching is literal, case-insensitive substring containment over
//! `headline + " " + summary`. Exclusion terms are checked first and always
//! win; otherwise a story is kept when it mentions any company, industry or
//! economy term.

use crate::models::RawArticle;
use serde::{Deserialize, Serialize};

/// Outcome of running a [`KeywordPolicy`] over one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// An exclusion term was found.
    Excluded(String),
    /// No exclusion term, and this inclusion term was found.
    Matched(String),
    /// Nothing in any list matched.
    NoMatch,
}

impl Verdict {
    pub fn is_relevant(&self) -> bool {
        matches!(self, Verdict::Matched(_))
    }
}

/// The four keyword lists behind the relevance filter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct KeywordPolicy {
    /// Named companies.
    pub companies: Vec<String>,
    /// Named industries.
    pub industries: Vec<String>,
    /// Macroeconomic vocabulary.
    pub economy: Vec<String>,
    /// Price, recommendation and off-topic vocabulary.
    pub exclusions: Vec<String>,
}

impl Default for KeywordPolicy {
    fn default() -> Self {
        Self {
            companies: to_strings(&["reliance", "tata", "infosys", "hdfc", "icici", "adani"]),
            industries: to_strings(&[
                "manufacturing",
                "it",
                "banking",
                "pharma",
                "telecom",
                "energy",
                "automobile",
            ]),
            economy: to_strings(&[
                "gdp",
                "inflation",
                "fiscal",
                "rbi",
                "monetary policy",
                "budget",
                "tax",
                "deficit",
            ]),
            exclusions: to_strings(&[
                "stock price",
                "share price",
                "stocks to buy",
                "buy",
                "sell",
                "target price",
                "recommendation",
                "political",
                "election",
                "cricket",
                "bollywood",
                "movie",
            ]),
        }
    }
}

fn to_strings(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

/// First term in `terms` contained in `text` (already lowercased).
fn first_hit<'a>(text: &str, terms: &'a [String]) -> Option<&'a String> {
    terms
        .iter()
        .find(|term| !term.is_empty() && text.contains(&term.to_lowercase()))
}

impl KeywordPolicy {
    /// Classify an article. Exclusion always dominates inclusion.
    pub fn verdict(&self, article: &RawArticle) -> Verdict {
        let text = article.match_text();

        if let Some(term) = first_hit(&text, &self.exclusions) {
            return Verdict::Excluded(term.clone());
        }

        [&self.companies, &self.industries, &self.economy]
            .into_iter()
            .find_map(|terms| first_hit(&text, terms))
            .map(|term| Verdict::Matched(term.clone()))
            .unwrap_or(Verdict::NoMatch)
    }
}
