//! Guardian API mock server shared by the integration tests.
#![allow(dead_code)]

use guardian_content_fetcher::api::GuardianClient;
use httpmock::Mock;
use httpmock::prelude::*;
use serde_json::{Value, json};
use std::time::Duration;

pub const API_KEY: &str = "test-key";

/// A local stand-in for `content.guardianapis.com`.
pub struct GuardianMockServer {
    server: MockServer,
}

impl GuardianMockServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start_async().await,
        }
    }

    pub fn base_url(&self) -> String {
        self.server.base_url()
    }

    /// A client pointed at this server with rate limiting disabled.
    pub fn client(&self) -> GuardianClient {
        GuardianClient::with_options(API_KEY, Duration::ZERO, &self.base_url()).unwrap()
    }

    /// Answer every search with `results` and status "ok".
    pub async fn mock_results(&self, results: Vec<Value>) -> Mock<'_> {
        let total = results.len();
        self.server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "response": {
                            "status": "ok",
                            "total": total,
                            "results": results
                        }
                    }));
            })
            .await
    }

    /// Answer every search with an embedded API error.
    pub async fn mock_api_error(&self, message: &str) -> Mock<'_> {
        self.server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "response": { "status": "error", "message": message }
                    }));
            })
            .await
    }

    /// Answer every search with an HTTP status and a raw body.
    pub async fn mock_raw(&self, status: u16, body: &str) -> Mock<'_> {
        self.server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(status).body(body);
            })
            .await
    }
}

/// A search result as the Guardian API returns it.
pub fn guardian_result(title: &str, body: Option<&str>) -> Value {
    let slug = title.to_lowercase().replace(' ', "-");
    let mut result = json!({
        "id": format!("technology/2023/jun/01/{slug}"),
        "type": "article",
        "webPublicationDate": "2023-06-01T10:00:00Z",
        "webTitle": title,
        "webUrl": format!("https://www.theguardian.com/technology/2023/jun/01/{slug}"),
        "apiUrl": format!("https://content.guardianapis.com/technology/2023/jun/01/{slug}")
    });
    if let Some(body) = body {
        result["fields"] = json!({ "bodyText": body });
    }
    result
}
