//! Data models shared across the pipeline.
//!
//! - [`Article`]: a normalised search result, and the payload published to the broker
//! - [`FetchPublishResult`]: the outcome of one fetch-and-publish run
//!
//! `Article` keeps the Guardian field names on the wire (`webTitle`, ...)
//! so downstream consumers see the same shape the API uses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Guardian article reduced to the fields we republish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Publication timestamp as returned by the API (ISO 8601).
    #[serde(rename = "webPublicationDate")]
    pub publication_date: String,
    /// Headline.
    #[serde(rename = "webTitle")]
    pub title: String,
    /// Canonical article URL.
    #[serde(rename = "webUrl")]
    pub url: String,
    /// First 1000 characters of the body text, with `"..."` if truncated.
    #[serde(
        rename = "content_preview",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_preview: Option<String>,
}

impl Article {
    /// Title for log lines, falling back to a placeholder when the API omitted it.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Unknown"
        } else {
            &self.title
        }
    }
}

/// Summary of a single fetch-and-publish invocation.
///
/// `articles_published` never exceeds `articles_found`; `errors` is only
/// populated when publishing fell short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPublishResult {
    pub success: bool,
    pub articles_found: usize,
    pub articles_published: usize,
    pub search_term: String,
    pub date_from: Option<String>,
    pub errors: Vec<String>,
}

impl FetchPublishResult {
    /// A result with nothing found or published yet.
    pub fn new(search_term: &str, date_from: Option<&str>) -> Self {
        Self {
            success: false,
            articles_found: 0,
            articles_published: 0,
            search_term: search_term.to_string(),
            date_from: date_from.map(str::to_string),
            errors: Vec::new(),
        }
    }
}

impl fmt::Display for FetchPublishResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Guardian Content Fetcher Results")?;
        writeln!(f, "================================")?;
        writeln!(f, "Search term: {}", self.search_term)?;
        writeln!(f, "Date filter: {}", self.date_from.as_deref().unwrap_or("None"))?;
        writeln!(f, "Articles found: {}", self.articles_found)?;
        writeln!(f, "Articles published: {}", self.articles_published)?;
        write!(f, "Success: {}", if self.success { "Yes" } else { "No" })?;
        if !self.errors.is_empty() {
            write!(f, "\nErrors:")?;
            for error in &self.errors {
                write!(f, "\n  - {}", error)?;
            }
        }
        Ok(())
    }
}
