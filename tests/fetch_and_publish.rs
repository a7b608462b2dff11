mod common;

use common::{GuardianMockServer, guardian_result};
use guardian_content_fetcher::broker::{InMemoryPublisher, MessagePublisher};
use guardian_content_fetcher::config::AppConfig;
use guardian_content_fetcher::error::{BrokerError, FetcherError};
use guardian_content_fetcher::fetcher::{ContentFetcher, FetcherFactory};
use guardian_content_fetcher::models::Article;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How a scripted publish call ends.
#[derive(Debug, Clone, Copy)]
enum Outcome {
    Accept,
    Reject,
    Fail,
}

/// Publisher double that replays scripted outcomes and records every call.
#[derive(Debug, Default)]
struct ScriptedPublisher {
    /// `Some(n)` reports `n` accepted records per batch, `None` fails the batch.
    batch_accepts: Option<usize>,
    /// Outcome of the i-th `publish_one`; calls beyond the script are accepted.
    single_outcomes: Vec<Outcome>,
    batch_calls: usize,
    single_calls: Vec<String>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedPublisher {
    fn accepting(n: usize) -> Self {
        Self {
            batch_accepts: Some(n),
            ..Self::default()
        }
    }

    fn failing_batch() -> Self {
        Self::default()
    }

    fn with_singles(mut self, outcomes: &[Outcome]) -> Self {
        self.single_outcomes = outcomes.to_vec();
        self
    }
}

impl MessagePublisher for ScriptedPublisher {
    async fn publish_one(&mut self, article: &Article) -> Result<bool, BrokerError> {
        let outcome = self
            .single_outcomes
            .get(self.single_calls.len())
            .copied()
            .unwrap_or(Outcome::Accept);
        self.single_calls.push(article.title.clone());
        match outcome {
            Outcome::Accept => Ok(true),
            Outcome::Reject => Ok(false),
            Outcome::Fail => Err(BrokerError::publish("scripted failure")),
        }
    }

    async fn publish_batch(&mut self, articles: &[Article]) -> Result<usize, BrokerError> {
        self.batch_calls += 1;
        match self.batch_accepts {
            Some(n) => Ok(n),
            None => Err(BrokerError::publish("scripted batch failure")),
        }
    }

    fn close(&mut self) -> Result<(), BrokerError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn titles(n: usize) -> Vec<Value> {
    (1..=n)
        .map(|i| guardian_result(&format!("Article {i}"), Some("Body text")))
        .collect()
}

fn fetcher_with(
    server: &GuardianMockServer,
    publisher: ScriptedPublisher,
) -> ContentFetcher<ScriptedPublisher> {
    ContentFetcher::new(server.client(), publisher)
}

#[tokio::test]
async fn test_full_batch_success() {
    let server = GuardianMockServer::start().await;
    server.mock_results(titles(3)).await;
    let mut fetcher = fetcher_with(&server, ScriptedPublisher::accepting(3));

    let result = fetcher.fetch_and_publish("python", None, 10).await.unwrap();

    assert!(result.success);
    assert_eq!(result.articles_found, 3);
    assert_eq!(result.articles_published, 3);
    assert!(result.errors.is_empty());
    assert_eq!(fetcher.publisher().batch_calls, 1);
    assert!(fetcher.publisher().single_calls.is_empty());
}

#[tokio::test]
async fn test_partial_batch_keeps_count_without_fallback() {
    let server = GuardianMockServer::start().await;
    server.mock_results(titles(3)).await;
    let mut fetcher = fetcher_with(&server, ScriptedPublisher::accepting(2));

    let result = fetcher.fetch_and_publish("python", None, 10).await.unwrap();

    assert!(result.success);
    assert_eq!(result.articles_published, 2);
    assert_eq!(result.errors, ["Only 2 out of 3 articles were published"]);
    assert!(fetcher.publisher().single_calls.is_empty());
}

#[tokio::test]
async fn test_empty_batch_falls_back_to_individual_publishing() {
    let server = GuardianMockServer::start().await;
    server.mock_results(titles(3)).await;
    let mut fetcher = fetcher_with(&server, ScriptedPublisher::accepting(0));

    let result = fetcher.fetch_and_publish("python", None, 10).await.unwrap();

    assert!(result.success);
    assert_eq!(result.articles_published, 3);
    assert!(result.errors.is_empty());
    let publisher = fetcher.publisher();
    assert_eq!(publisher.batch_calls, 1);
    assert_eq!(publisher.single_calls, ["Article 1", "Article 2", "Article 3"]);
}

#[tokio::test]
async fn test_nothing_published_is_unsuccessful() {
    let server = GuardianMockServer::start().await;
    server.mock_results(titles(2)).await;
    let publisher =
        ScriptedPublisher::accepting(0).with_singles(&[Outcome::Reject, Outcome::Reject]);
    let mut fetcher = fetcher_with(&server, publisher);

    let result = fetcher.fetch_and_publish("python", None, 10).await.unwrap();

    assert!(!result.success);
    assert_eq!(result.articles_found, 2);
    assert_eq!(result.articles_published, 0);
    assert_eq!(result.errors, ["Failed to publish any articles to message broker"]);
}

#[tokio::test]
async fn test_fallback_errors_do_not_stop_the_loop() {
    let server = GuardianMockServer::start().await;
    server.mock_results(titles(4)).await;
    let publisher = ScriptedPublisher::accepting(0).with_singles(&[
        Outcome::Accept,
        Outcome::Fail,
        Outcome::Reject,
        Outcome::Accept,
    ]);
    let mut fetcher = fetcher_with(&server, publisher);

    let result = fetcher.fetch_and_publish("python", None, 10).await.unwrap();

    assert!(result.success);
    assert_eq!(result.articles_published, 2);
    assert_eq!(result.errors, ["Only 2 out of 4 articles were published"]);
    assert_eq!(fetcher.publisher().single_calls.len(), 4);
}

#[tokio::test]
async fn test_no_results_is_success_without_publishing() {
    let server = GuardianMockServer::start().await;
    server.mock_results(vec![]).await;
    let mut fetcher = fetcher_with(&server, ScriptedPublisher::accepting(10));

    let result = fetcher
        .fetch_and_publish("nonexistent topic", Some("2024-01-01"), 5)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.articles_found, 0);
    assert_eq!(result.articles_published, 0);
    assert_eq!(result.date_from.as_deref(), Some("2024-01-01"));
    assert_eq!(fetcher.publisher().batch_calls, 0);
}

#[tokio::test]
async fn test_search_failure_aborts() {
    let server = GuardianMockServer::start().await;
    server.mock_api_error("API rate limit exceeded").await;
    let mut fetcher = fetcher_with(&server, ScriptedPublisher::accepting(10));

    let err = fetcher.fetch_and_publish("python", None, 10).await.unwrap_err();

    assert!(matches!(err, FetcherError::Search(_)));
    assert!(err.to_string().contains("API rate limit exceeded"));
    assert_eq!(fetcher.publisher().batch_calls, 0);
}

#[tokio::test]
async fn test_invalid_date_is_invalid_argument() {
    let server = GuardianMockServer::start().await;
    let mock = server.mock_results(titles(1)).await;
    let mut fetcher = fetcher_with(&server, ScriptedPublisher::accepting(10));

    let err = fetcher
        .fetch_and_publish("python", Some("June 1st"), 10)
        .await
        .unwrap_err();

    assert!(err.is_invalid_argument());
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_batch_error_aborts_without_fallback() {
    let server = GuardianMockServer::start().await;
    server.mock_results(titles(2)).await;
    let mut fetcher = fetcher_with(&server, ScriptedPublisher::failing_batch());

    let err = fetcher.fetch_and_publish("python", None, 10).await.unwrap_err();

    assert!(matches!(err, FetcherError::Broker(BrokerError::Publish(_))));
    assert!(fetcher.publisher().single_calls.is_empty());
}

#[tokio::test]
async fn test_machine_learning_articles_reach_in_memory_publisher_in_order() {
    let server = GuardianMockServer::start().await;
    server
        .mock_results(vec![
            guardian_result("Machine learning transforms healthcare", Some("Doctors use ML")),
            guardian_result("The ethics of machine learning", Some("Questions remain")),
        ])
        .await;
    let mut fetcher = ContentFetcher::new(server.client(), InMemoryPublisher::new());

    let result = fetcher
        .fetch_and_publish("machine learning", None, 10)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.articles_found, 2);
    assert_eq!(result.articles_published, 2);
    let published: Vec<&str> = fetcher
        .publisher()
        .published()
        .iter()
        .map(|a| a.title.as_str())
        .collect();
    assert_eq!(
        published,
        ["Machine learning transforms healthcare", "The ethics of machine learning"]
    );
    assert_eq!(
        fetcher.publisher().published()[0].content_preview.as_deref(),
        Some("Doctors use ML")
    );
}

#[tokio::test]
async fn test_publisher_closed_on_drop() {
    let server = GuardianMockServer::start().await;
    server.mock_api_error("boom").await;
    let publisher = ScriptedPublisher::accepting(1);
    let closes = Arc::clone(&publisher.closes);

    {
        let mut fetcher = fetcher_with(&server, publisher);
        assert!(fetcher.fetch_and_publish("python", None, 10).await.is_err());
    }

    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_explicit_close_not_repeated_on_drop() {
    let server = GuardianMockServer::start().await;
    server.mock_results(titles(1)).await;
    let publisher = ScriptedPublisher::accepting(1);
    let closes = Arc::clone(&publisher.closes);

    {
        let mut fetcher = fetcher_with(&server, publisher);
        fetcher.fetch_and_publish("python", None, 10).await.unwrap();
        fetcher.close();
        fetcher.close();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_over_reported_batch_count_is_capped() {
    let server = GuardianMockServer::start().await;
    server.mock_results(titles(2)).await;
    let mut fetcher = fetcher_with(&server, ScriptedPublisher::accepting(4));

    let result = fetcher.fetch_and_publish("python", None, 10).await.unwrap();

    assert!(result.success);
    assert_eq!(result.articles_found, 2);
    assert_eq!(result.articles_published, 2);
    assert!(result.errors.is_empty());
    assert!(fetcher.publisher().single_calls.is_empty());
}

#[tokio::test]
async fn test_from_config_with_mock_broker() {
    let server = GuardianMockServer::start().await;
    server.mock_results(titles(2)).await;
    let base_url = server.base_url();
    let config = AppConfig::from_lookup(|key| match key {
        "GUARDIAN_API_KEY" => Some("test-key".to_string()),
        "USE_MOCK_BROKER" => Some("true".to_string()),
        "GUARDIAN_RATE_LIMIT_DELAY" => Some("0".to_string()),
        "GUARDIAN_API_URL" => Some(base_url.clone()),
        _ => None,
    })
    .unwrap();

    let mut fetcher = FetcherFactory::from_config(&config).await.unwrap();
    let result = fetcher.fetch_and_publish("python", None, 2).await.unwrap();

    assert!(result.success);
    assert_eq!(result.articles_published, 2);
}
