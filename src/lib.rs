//! # Guardian Content Fetcher
//!
//! Searches the Guardian Open Platform content API and republishes the
//! matching articles to a message broker.
//!
//! ## Features
//!
//! - Rate-limited search client returning normalised [`Article`]s with a
//!   1000-character body preview
//! - AWS Kinesis publisher with batched `PutRecords` and an in-memory
//!   publisher for tests and dry runs
//! - A coordinator that publishes in one batch and falls back to
//!   article-by-article publishing when the batch accepts nothing
//! - Environment configuration, a `guardian-fetch` CLI and an event handler
//!   for serverless runtimes
//!
//! ## Usage
//!
//! ```no_run
//! use guardian_content_fetcher::FetcherFactory;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut fetcher = FetcherFactory::create_with_mock("your-api-key")?;
//! let result = fetcher.fetch_and_publish("machine learning", None, 10).await?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod broker;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod lambda;
pub mod models;
pub mod output;
pub mod utils;

pub use api::GuardianClient;
pub use broker::{ConfiguredPublisher, InMemoryPublisher, KinesisPublisher, MessagePublisher};
pub use config::AppConfig;
pub use error::{ApiError, BrokerError, ConfigError, FetcherError};
pub use fetcher::{ContentFetcher, FetcherFactory};
pub use models::{Article, FetchPublishResult};
