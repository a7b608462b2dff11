//! Fetch-and-publish coordinator.
//!
//! [`ContentFetcher`] ties a [`GuardianClient`] to a [`MessagePublisher`]:
//!
//! 1. Validate the request
//! 2. Search the Guardian API (one call, no retries)
//! 3. Publish every article in one batch
//! 4. Only if the batch accepted nothing, publish article by article
//! 5. Summarise the run as a [`FetchPublishResult`]
//!
//! Search failures and batch failures abort the run with a [`FetcherError`].
//! Failures while publishing individually are logged and counted as
//! unpublished; the loop always visits every article.
//!
//! [`FetcherFactory`] builds a coordinator wired to Kinesis, to the in-memory
//! publisher, or to whichever one the configuration selects.

use crate::api::{GuardianClient, MAX_PAGE_SIZE};
use crate::broker::{ConfiguredPublisher, InMemoryPublisher, KinesisPublisher, MessagePublisher};
use crate::config::AppConfig;
use crate::error::FetcherError;
use crate::models::{Article, FetchPublishResult};
use tracing::{debug, error, info, instrument, warn};

/// Articles requested when the caller does not say otherwise.
pub const DEFAULT_MAX_ARTICLES: u32 = 10;

const NOTHING_PUBLISHED: &str = "Failed to publish any articles to message broker";

/// Coordinates a search followed by publishing the results.
///
/// The publisher is closed by [`ContentFetcher::close`] or, at the latest,
/// when the fetcher is dropped.
#[derive(Debug)]
pub struct ContentFetcher<P: MessagePublisher> {
    client: GuardianClient,
    publisher: P,
    closed: bool,
}

impl<P: MessagePublisher> ContentFetcher<P> {
    pub fn new(client: GuardianClient, publisher: P) -> Self {
        info!("Guardian content fetcher initialized");
        Self {
            client,
            publisher,
            closed: false,
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    /// Search for `search_term` and publish what comes back.
    ///
    /// # Arguments
    ///
    /// * `search_term` - Query text, must not be blank
    /// * `date_from` - Optional `YYYY-MM-DD` lower bound
    /// * `max_articles` - Page size for the search, `1..=50`
    ///
    /// # Returns
    ///
    /// A summary whose `success` is false only when articles were found but
    /// none could be published.
    ///
    /// # Errors
    ///
    /// - [`FetcherError::InvalidArgument`] for bad input, before any remote call
    /// - [`FetcherError::Search`] when the search fails
    /// - [`FetcherError::Broker`] when the batch publish fails outright
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_and_publish(
        &mut self,
        search_term: &str,
        date_from: Option<&str>,
        max_articles: u32,
    ) -> Result<FetchPublishResult, FetcherError> {
        validate_inputs(search_term, max_articles)?;
        let mut result = FetchPublishResult::new(search_term, date_from);

        info!("Starting article fetch and publish");
        let articles = self
            .client
            .search(search_term, date_from, max_articles)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to fetch articles from Guardian API"))?;
        result.articles_found = articles.len();

        if articles.is_empty() {
            warn!("No articles found for search term");
            result.success = true;
            return Ok(result);
        }
        info!(count = articles.len(), "Found articles to publish");

        let published = self.publish_articles(&articles).await?;
        result.articles_published = published;

        if published == articles.len() {
            info!(published, "Successfully published all articles");
            result.success = true;
        } else if published > 0 {
            warn!(published, total = articles.len(), "Published only part of the articles");
            result.success = true;
            result.errors.push(format!(
                "Only {} out of {} articles were published",
                published,
                articles.len()
            ));
        } else {
            error!("{}", NOTHING_PUBLISHED);
            result.success = false;
            result.errors.push(NOTHING_PUBLISHED.to_string());
        }

        Ok(result)
    }

    /// Batch first; fall back to one-by-one only when the batch accepted nothing.
    async fn publish_articles(&mut self, articles: &[Article]) -> Result<usize, FetcherError> {
        debug!(count = articles.len(), "Attempting batch publish");
        let reported = self
            .publisher
            .publish_batch(articles)
            .await
            .inspect_err(|e| error!(error = %e, "Batch publishing failed"))?;
        if reported > articles.len() {
            warn!(reported, total = articles.len(), "Publisher over-reported batch count");
        }
        let published = reported.min(articles.len());

        if published == articles.len() {
            info!(published, "Batch publish succeeded");
            Ok(published)
        } else if published > 0 {
            warn!(published, total = articles.len(), "Batch publish partially successful");
            Ok(published)
        } else {
            warn!("Batch publish failed, falling back to individual publishing");
            Ok(self.publish_individually(articles).await)
        }
    }

    async fn publish_individually(&mut self, articles: &[Article]) -> usize {
        let total = articles.len();
        let mut published = 0;

        for (i, article) in articles.iter().enumerate() {
            let position = i + 1;
            match self.publisher.publish_one(article).await {
                Ok(true) => {
                    published += 1;
                    debug!(position, total, title = article.display_title(), "Published article");
                }
                Ok(false) => {
                    warn!(position, total, title = article.display_title(), "Failed to publish article");
                }
                Err(e) => {
                    error!(position, total, error = %e, "Error publishing article");
                }
            }
        }

        info!(published, total, "Individual publishing completed");
        published
    }

    /// Release the publisher. Errors are logged, never returned.
    ///
    /// Only the first call reaches the publisher.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match self.publisher.close() {
            Ok(()) => info!("Guardian content fetcher closed"),
            Err(e) => error!(error = %e, "Error closing Guardian content fetcher"),
        }
    }
}

impl<P: MessagePublisher> Drop for ContentFetcher<P> {
    fn drop(&mut self) {
        self.close();
    }
}

fn validate_inputs(search_term: &str, max_articles: u32) -> Result<(), FetcherError> {
    if search_term.trim().is_empty() {
        return Err(FetcherError::InvalidArgument(
            "Search term cannot be empty or whitespace".to_string(),
        ));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&max_articles) {
        return Err(FetcherError::InvalidArgument(format!(
            "max_articles must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    debug!("Input validation passed");
    Ok(())
}

/// Builds [`ContentFetcher`]s for the supported publishers.
pub struct FetcherFactory;

impl FetcherFactory {
    /// A fetcher publishing to the Kinesis stream `stream_name`.
    ///
    /// # Errors
    ///
    /// [`FetcherError::Construction`] if the API key is empty or the stream
    /// cannot be verified.
    pub async fn create_with_kinesis(
        api_key: &str,
        stream_name: &str,
        region: &str,
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
    ) -> Result<ContentFetcher<KinesisPublisher>, FetcherError> {
        let build = async {
            let client = GuardianClient::new(api_key)?;
            let publisher =
                KinesisPublisher::connect(stream_name, region, access_key_id, secret_access_key)
                    .await?;
            Ok::<_, FetcherError>(ContentFetcher::new(client, publisher))
        };
        let fetcher = build.await.map_err(|e| {
            FetcherError::construction(format!("Failed to create fetcher with Kinesis: {e}"))
        })?;
        info!(stream = stream_name, "Created fetcher with Kinesis stream");
        Ok(fetcher)
    }

    /// A fetcher publishing into an [`InMemoryPublisher`].
    pub fn create_with_mock(api_key: &str) -> Result<ContentFetcher<InMemoryPublisher>, FetcherError> {
        let client = GuardianClient::new(api_key).map_err(|e| {
            FetcherError::construction(format!("Failed to create fetcher with mock: {e}"))
        })?;
        info!("Created fetcher with in-memory publisher");
        Ok(ContentFetcher::new(client, InMemoryPublisher::new()))
    }

    /// A fetcher built from environment configuration.
    ///
    /// Honours the configured rate-limit delay and API base URL, and picks the
    /// in-memory publisher when `use_mock_broker` is set.
    pub async fn from_config(
        config: &AppConfig,
    ) -> Result<ContentFetcher<ConfiguredPublisher>, FetcherError> {
        let guardian = &config.guardian;
        let client = GuardianClient::with_options(
            guardian.api_key.as_str(),
            guardian.rate_limit_delay,
            &guardian.base_url,
        )
        .map_err(|e| FetcherError::construction(format!("Failed to create Guardian client: {e}")))?;

        if config.use_mock_broker {
            info!("Using in-memory publisher");
            return Ok(ContentFetcher::new(client, InMemoryPublisher::new().into()));
        }

        let kinesis = config.kinesis.as_ref().ok_or_else(|| {
            FetcherError::construction("Kinesis stream name is required when not using mock")
        })?;
        let publisher = KinesisPublisher::connect(
            &kinesis.stream_name,
            &kinesis.aws.region,
            kinesis.aws.access_key_id.as_deref(),
            kinesis.aws.secret_access_key.as_deref(),
        )
        .await
        .map_err(|e| FetcherError::construction(format!("Failed to create fetcher with Kinesis: {e}")))?;

        info!(stream = %kinesis.stream_name, region = %kinesis.aws.region, "Using Kinesis stream");
        Ok(ContentFetcher::new(client, publisher.into()))
    }
}
