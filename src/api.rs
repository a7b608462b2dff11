//! Guardian Open Platform content search client.
//!
//! [`GuardianClient::search`] issues one `GET /search` per call and maps the
//! results into [`Article`]s. A [`RateLimiter`] spaces consecutive calls so we
//! stay inside the free-tier quota.
//!
//! # Request
//!
//! ```text
//! GET {base}/search?q=..&page-size=..&order-by=newest
//!     &show-fields=webPublicationDate,webTitle,webUrl,bodyText
//!     [&from-date=YYYY-MM-DD]&api-key=..
//! ```
//!
//! There are no retries here; a failed call is reported to the caller as-is.

use crate::error::ApiError;
use crate::models::Article;
use crate::utils::{truncate_for_log, truncate_with_marker};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Public Guardian API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://content.guardianapis.com";

/// Two seconds between calls keeps us within the free developer key limits.
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(2);

/// Largest page the coordinator and the API will accept.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Number of body-text characters kept in [`Article::content_preview`].
pub const PREVIEW_CHARS: usize = 1000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SHOW_FIELDS: &str = "webPublicationDate,webTitle,webUrl,bodyText";

/// Enforces a minimum delay between consecutive calls.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_call: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep for whatever is left of the delay since the previous call, then mark a new call.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                let remaining = self.delay - elapsed;
                debug!(?remaining, "Rate limiting: waiting before next request");
                sleep(remaining).await;
            }
        }
        self.last_call = Some(Instant::now());
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    response: SearchResponse,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Vec<RawResult>,
}

#[allow(non_snake_case)]
#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    webPublicationDate: String,
    #[serde(default)]
    webTitle: String,
    #[serde(default)]
    webUrl: String,
    #[serde(default)]
    fields: Option<RawFields>,
}

#[allow(non_snake_case)]
#[derive(Debug, Default, Deserialize)]
struct RawFields {
    #[serde(default)]
    bodyText: Option<String>,
}

impl From<RawResult> for Article {
    fn from(raw: RawResult) -> Self {
        let content_preview = raw
            .fields
            .and_then(|f| f.bodyText)
            .filter(|body| !body.is_empty())
            .map(|body| truncate_with_marker(&body, PREVIEW_CHARS));

        Article {
            publication_date: raw.webPublicationDate,
            title: raw.webTitle,
            url: raw.webUrl,
            content_preview,
        }
    }
}

/// Client for the Guardian content search endpoint.
pub struct GuardianClient {
    http: reqwest::Client,
    api_key: String,
    search_url: Url,
    limiter: RateLimiter,
}

impl fmt::Debug for GuardianClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardianClient")
            .field("search_url", &self.search_url.as_str())
            .field("rate_limit_delay", &self.limiter.delay())
            .finish_non_exhaustive()
    }
}

impl GuardianClient {
    /// Create a client against the public API with the default two second delay.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidArgument`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_options(api_key, DEFAULT_RATE_LIMIT_DELAY, DEFAULT_BASE_URL)
    }

    /// Create a client with an explicit rate-limit delay and base URL.
    pub fn with_options(
        api_key: impl Into<String>,
        rate_limit_delay: Duration,
        base_url: &str,
    ) -> Result<Self, ApiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ApiError::invalid_argument("API key cannot be empty"));
        }

        let search_url = search_endpoint(base_url)?;
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        info!(url = %search_url, ?rate_limit_delay, "Guardian API client initialized");
        Ok(Self {
            http,
            api_key,
            search_url,
            limiter: RateLimiter::new(rate_limit_delay),
        })
    }

    /// Search for the newest articles matching `search_term`.
    ///
    /// # Arguments
    ///
    /// * `search_term` - Free-text query; surrounding whitespace is trimmed
    /// * `date_from` - Optional `YYYY-MM-DD` lower bound on publication date
    /// * `page_size` - Number of results to request, `1..=50`
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidArgument`] for bad input (no request is made)
    /// - [`ApiError::Transport`] when the request fails or returns a non-2xx status
    /// - [`ApiError::InvalidResponse`] when the body is not JSON
    /// - [`ApiError::Api`] when the embedded status is not `"ok"`
    #[instrument(level = "info", skip(self), fields(url = %self.search_url))]
    pub async fn search(
        &mut self,
        search_term: &str,
        date_from: Option<&str>,
        page_size: u32,
    ) -> Result<Vec<Article>, ApiError> {
        let term = search_term.trim();
        if term.is_empty() {
            return Err(ApiError::invalid_argument("Search term cannot be empty"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ApiError::invalid_argument(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let mut query: Vec<(&str, String)> = vec![
            ("q", term.to_string()),
            ("page-size", page_size.to_string()),
            ("order-by", "newest".to_string()),
            ("show-fields", SHOW_FIELDS.to_string()),
        ];

        if let Some(date) = date_from.filter(|d| !d.is_empty()) {
            validate_date(date)?;
            info!(date_from = date, "Filtering articles from date");
            query.push(("from-date", date.to_string()));
        }
        query.push(("api-key", self.api_key.clone()));

        info!(term, "Searching for articles");
        self.limiter.wait().await;

        let response = self
            .http
            .get(self.search_url.clone())
            .query(&query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .inspect_err(|e| warn!(error = %e, "HTTP request failed"))?;
        let body = response.text().await?;

        let envelope: SearchEnvelope = serde_json::from_str(&body).map_err(|e| {
            warn!(
                error = %e,
                body_preview = %truncate_for_log(&body, 300),
                "Failed to parse JSON response"
            );
            ApiError::InvalidResponse(e)
        })?;

        let response = envelope.response;
        if response.status != "ok" {
            let message = response
                .message
                .unwrap_or_else(|| "Unknown API error".to_string());
            warn!(status = %response.status, %message, "Guardian API returned an error");
            return Err(ApiError::Api(message));
        }

        let articles: Vec<Article> = response.results.into_iter().map(Article::from).collect();
        info!(count = articles.len(), "Successfully retrieved articles");
        Ok(articles)
    }
}

/// Parse a `YYYY-MM-DD` date, rejecting anything else.
pub fn validate_date(date: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ApiError::invalid_argument("date_from must be in YYYY-MM-DD format"))
}

fn search_endpoint(base_url: &str) -> Result<Url, ApiError> {
    let mut base = Url::parse(base_url)
        .map_err(|e| ApiError::invalid_argument(format!("invalid base URL '{base_url}': {e}")))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("search")
        .map_err(|e| ApiError::invalid_argument(format!("invalid base URL '{base_url}': {e}")))
}
