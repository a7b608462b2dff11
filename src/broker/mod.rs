//! Message broker publishers.
//!
//! [`MessagePublisher`] is the contract the coordinator publishes through.
//! Two implementations ship with the crate:
//!
//! | Publisher | Module | Notes |
//! |-----------|--------|-------|
//! | [`KinesisPublisher`] | [`kinesis`] | AWS Kinesis Data Streams, batches of up to 500 records |
//! | [`InMemoryPublisher`] | [`memory`] | Records every article in order; never fails |
//!
//! [`ConfiguredPublisher`] wraps either one when the choice is made at runtime.

pub mod kinesis;
pub mod memory;

pub use kinesis::KinesisPublisher;
pub use memory::InMemoryPublisher;

use crate::error::BrokerError;
use crate::models::Article;

/// Publishes articles to a message broker.
pub trait MessagePublisher {
    /// Publish a single article. Returns whether the broker accepted it.
    async fn publish_one(&mut self, article: &Article) -> Result<bool, BrokerError>;

    /// Publish a batch of articles. Returns how many the broker accepted.
    ///
    /// A partial count is reported through the return value; an error means
    /// the batch could not be attempted or failed outright.
    async fn publish_batch(&mut self, articles: &[Article]) -> Result<usize, BrokerError>;

    /// Release the underlying client. Safe to call more than once.
    fn close(&mut self) -> Result<(), BrokerError>;
}

/// A publisher chosen from configuration.
#[derive(Debug)]
pub enum ConfiguredPublisher {
    Kinesis(KinesisPublisher),
    InMemory(InMemoryPublisher),
}

impl MessagePublisher for ConfiguredPublisher {
    async fn publish_one(&mut self, article: &Article) -> Result<bool, BrokerError> {
        match self {
            Self::Kinesis(p) => p.publish_one(article).await,
            Self::InMemory(p) => p.publish_one(article).await,
        }
    }

    async fn publish_batch(&mut self, articles: &[Article]) -> Result<usize, BrokerError> {
        match self {
            Self::Kinesis(p) => p.publish_batch(articles).await,
            Self::InMemory(p) => p.publish_batch(articles).await,
        }
    }

    fn close(&mut self) -> Result<(), BrokerError> {
        match self {
            Self::Kinesis(p) => p.close(),
            Self::InMemory(p) => p.close(),
        }
    }
}

impl From<KinesisPublisher> for ConfiguredPublisher {
    fn from(p: KinesisPublisher) -> Self {
        Self::Kinesis(p)
    }
}

impl From<InMemoryPublisher> for ConfiguredPublisher {
    fn from(p: InMemoryPublisher) -> Self {
        Self::InMemory(p)
    }
}
