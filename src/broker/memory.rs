//! In-memory publisher for tests and dry runs.

use super::MessagePublisher;
use crate::error::BrokerError;
use crate::models::Article;
use tracing::{debug, info};

/// Keeps every published article in insertion order. Publishing never fails.
#[derive(Debug, Default)]
pub struct InMemoryPublisher {
    published: Vec<Article>,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        info!("In-memory publisher initialized");
        Self::default()
    }

    /// Everything published so far, oldest first.
    pub fn published(&self) -> &[Article] {
        &self.published
    }

    pub fn len(&self) -> usize {
        self.published.len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }

    pub fn clear(&mut self) {
        self.published.clear();
        debug!("In-memory publisher messages cleared");
    }
}

impl MessagePublisher for InMemoryPublisher {
    async fn publish_one(&mut self, article: &Article) -> Result<bool, BrokerError> {
        debug!(title = article.display_title(), "Recorded article");
        self.published.push(article.clone());
        Ok(true)
    }

    async fn publish_batch(&mut self, articles: &[Article]) -> Result<usize, BrokerError> {
        self.published.extend_from_slice(articles);
        debug!(count = articles.len(), "Recorded batch");
        Ok(articles.len())
    }

    fn close(&mut self) -> Result<(), BrokerError> {
        info!("In-memory publisher closed");
        Ok(())
    }
}
