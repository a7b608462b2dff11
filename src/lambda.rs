//! Event handler for serverless invocations.
//!
//! [`handle_event`] takes a JSON event such as
//!
//! ```json
//! { "search_term": "machine learning", "date_from": "2024-01-01", "max_articles": 10 }
//! ```
//!
//! runs one fetch-and-publish, and answers with an HTTP-style
//! [`HandlerResponse`]. Configuration comes from the environment.
//!
//! | Status | When |
//! |--------|------|
//! | 200 | the run completed, whatever its `success` flag |
//! | 400 | bad event, missing configuration, or invalid arguments |
//! | 500 | the fetcher could not be built, or the search or publish failed |

use crate::config::AppConfig;
use crate::error::FetcherError;
use crate::fetcher::{DEFAULT_MAX_ARTICLES, FetcherFactory};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info, instrument};

/// Response returned to the invoking runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON-encoded result or `{"error": ...}` object.
    pub body: String,
}

impl HandlerResponse {
    fn ok(body: String) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            body: json!({ "error": message.into() }).to_string(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(error = %message, "Configuration or parameter error");
        Self::error(400, message)
    }

    fn application_error(err: impl std::fmt::Display) -> Self {
        error!(error = %err, "Application error during fetch and publish");
        Self::error(500, format!("An application error occurred: {err}"))
    }
}

#[derive(Debug, PartialEq, Eq)]
struct EventRequest {
    search_term: String,
    date_from: Option<String>,
    max_articles: u32,
}

impl EventRequest {
    fn parse(event: &Value) -> Result<Self, String> {
        let search_term = event
            .get("search_term")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or("'search_term' is a required parameter in the event.")?
            .to_string();

        let date_from = match event.get("date_from") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err("'date_from' must be a string in YYYY-MM-DD format".to_string()),
        };

        let max_articles = match event.get("max_articles") {
            None | Some(Value::Null) => DEFAULT_MAX_ARTICLES,
            Some(value) => parse_max_articles(value)?,
        };

        Ok(Self {
            search_term,
            date_from,
            max_articles,
        })
    }
}

/// Accepts a JSON integer, a whole-valued float such as `10.0`, or a string
/// holding an integer.
fn parse_max_articles(value: &Value) -> Result<u32, String> {
    let number = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("'max_articles' must be an integer, got {value}"))?;

    // Out-of-range values are left to the fetcher, which rejects them.
    Ok(u32::try_from(number).unwrap_or(0))
}

/// Handle one event using the process environment for configuration.
pub async fn handle_event(event: &Value) -> HandlerResponse {
    handle_event_with(event, |key| std::env::var(key).ok()).await
}

/// Handle one event, reading configuration through `lookup`.
#[instrument(level = "info", skip_all)]
pub async fn handle_event_with<F>(event: &Value, lookup: F) -> HandlerResponse
where
    F: Fn(&str) -> Option<String>,
{
    info!(%event, "Received event");

    let request = match EventRequest::parse(event) {
        Ok(request) => request,
        Err(message) => return HandlerResponse::bad_request(message),
    };

    let config = match AppConfig::from_lookup(&lookup) {
        Ok(config) => config,
        Err(e) => return HandlerResponse::bad_request(e.to_string()),
    };
    let stream_set = lookup("KINESIS_STREAM_NAME").is_some_and(|s| !s.trim().is_empty());
    if !config.use_mock_broker && !stream_set {
        return HandlerResponse::bad_request(
            "Missing required environment variables: GUARDIAN_API_KEY and KINESIS_STREAM_NAME must be set.",
        );
    }

    let mut fetcher = match FetcherFactory::from_config(&config).await {
        Ok(fetcher) => fetcher,
        Err(e) => return HandlerResponse::application_error(e),
    };

    let outcome = fetcher
        .fetch_and_publish(
            &request.search_term,
            request.date_from.as_deref(),
            request.max_articles,
        )
        .await;
    fetcher.close();

    match outcome {
        Ok(result) => match serde_json::to_string(&result) {
            Ok(body) => {
                info!(
                    success = result.success,
                    found = result.articles_found,
                    published = result.articles_published,
                    "Operation completed"
                );
                HandlerResponse::ok(body)
            }
            Err(e) => HandlerResponse::application_error(e),
        },
        Err(FetcherError::InvalidArgument(message)) => HandlerResponse::bad_request(message),
        Err(e) => HandlerResponse::application_error(e),
    }
}
