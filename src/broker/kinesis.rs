//! AWS Kinesis Data Streams publisher.
//!
//! Each article is sent as one UTF-8 JSON record. The partition key is the
//! article title (at most 256 bytes) so records spread across shards.
//!
//! # Batching
//!
//! `PutRecords` accepts at most 500 records per call. Larger batches are sent
//! as consecutive chunks in input order and the accepted counts are summed;
//! a chunk with `FailedRecordCount = n` contributes `len - n`.

use super::MessagePublisher;
use crate::error::BrokerError;
use crate::models::Article;
use crate::utils::truncate_to_byte_boundary;
use aws_config::BehaviorVersion;
use aws_sdk_kinesis::Client;
use aws_sdk_kinesis::config::{Credentials, Region};
use aws_sdk_kinesis::error::DisplayErrorContext;
use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::types::{PutRecordsRequestEntry, StreamStatus};
use std::fmt;
use tracing::{debug, error, info, instrument, warn};

/// Kinesis hard limit on records per `PutRecords` call.
pub const MAX_RECORDS_PER_BATCH: usize = 500;

/// Kinesis hard limit on partition key length, in bytes.
pub const MAX_PARTITION_KEY_BYTES: usize = 256;

const DEFAULT_PARTITION_KEY: &str = "default";

/// Publishes articles to a single Kinesis stream.
pub struct KinesisPublisher {
    client: Option<Client>,
    stream_name: String,
    region: String,
}

impl fmt::Debug for KinesisPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KinesisPublisher")
            .field("stream_name", &self.stream_name)
            .field("region", &self.region)
            .field("closed", &self.client.is_none())
            .finish()
    }
}

impl KinesisPublisher {
    /// Connect to `stream_name` in `region` and check the stream is usable.
    ///
    /// Explicit credentials are used only when both the key id and the secret
    /// are given; otherwise the default AWS credential chain applies.
    ///
    /// # Errors
    ///
    /// - [`BrokerError::InvalidArgument`] if `stream_name` is empty
    /// - [`BrokerError::StreamNotFound`] if the stream does not exist
    /// - [`BrokerError::StreamNotActive`] unless the stream is `ACTIVE` or `UPDATING`
    /// - [`BrokerError::Client`] for any other failure while describing the stream
    pub async fn connect(
        stream_name: &str,
        region: &str,
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
    ) -> Result<Self, BrokerError> {
        Self::connect_with_endpoint(stream_name, region, access_key_id, secret_access_key, None)
            .await
    }

    /// Like [`KinesisPublisher::connect`], but against an explicit endpoint
    /// such as a local Kinesis emulator.
    #[instrument(level = "info", skip(access_key_id, secret_access_key))]
    pub async fn connect_with_endpoint(
        stream_name: &str,
        region: &str,
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
        endpoint_url: Option<&str>,
    ) -> Result<Self, BrokerError> {
        if stream_name.trim().is_empty() {
            return Err(BrokerError::InvalidArgument(
                "Stream name cannot be empty".to_string(),
            ));
        }

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
        match (access_key_id, secret_access_key) {
            (Some(key_id), Some(secret)) if !key_id.is_empty() && !secret.is_empty() => {
                loader = loader.credentials_provider(Credentials::new(
                    key_id,
                    secret,
                    None,
                    None,
                    "explicit",
                ));
                info!("Kinesis client created with provided credentials");
            }
            _ => info!("Kinesis client created with default credential chain"),
        }
        if let Some(url) = endpoint_url {
            loader = loader.endpoint_url(url);
        }
        let sdk_config = loader.load().await;

        let publisher = Self {
            client: Some(Client::new(&sdk_config)),
            stream_name: stream_name.to_string(),
            region: region.to_string(),
        };
        publisher.verify_stream().await?;
        Ok(publisher)
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    async fn verify_stream(&self) -> Result<(), BrokerError> {
        let client = self.client()?;
        let output = client
            .describe_stream()
            .stream_name(&self.stream_name)
            .send()
            .await
            .map_err(|err| {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception());
                if not_found {
                    BrokerError::StreamNotFound(self.stream_name.clone())
                } else {
                    BrokerError::client(format!(
                        "failed to verify stream existence: {}",
                        DisplayErrorContext(&err)
                    ))
                }
            })?;

        let status = output
            .stream_description()
            .map(|d| d.stream_status().clone())
            .ok_or_else(|| BrokerError::client("DescribeStream returned no stream description"))?;

        if !matches!(status, StreamStatus::Active | StreamStatus::Updating) {
            return Err(BrokerError::StreamNotActive {
                stream: self.stream_name.clone(),
                status: status.as_str().to_string(),
            });
        }

        info!(stream = %self.stream_name, "Verified Kinesis stream is accessible");
        Ok(())
    }

    fn client(&self) -> Result<&Client, BrokerError> {
        self.client.as_ref().ok_or(BrokerError::Closed)
    }
}

impl MessagePublisher for KinesisPublisher {
    #[instrument(level = "debug", skip_all, fields(stream = %self.stream_name))]
    async fn publish_one(&mut self, article: &Article) -> Result<bool, BrokerError> {
        let client = self.client()?;
        let data = encode_record(article)?;

        let output = client
            .put_record()
            .stream_name(&self.stream_name)
            .data(Blob::new(data))
            .partition_key(partition_key(article))
            .send()
            .await
            .map_err(|err| {
                error!(error = %DisplayErrorContext(&err), "Failed to publish message to Kinesis");
                BrokerError::publish(DisplayErrorContext(&err).to_string())
            })?;

        debug!(sequence_number = ?output.sequence_number(), "Message published");
        Ok(true)
    }

    #[instrument(level = "debug", skip_all, fields(stream = %self.stream_name, count = articles.len()))]
    async fn publish_batch(&mut self, articles: &[Article]) -> Result<usize, BrokerError> {
        if articles.is_empty() {
            return Ok(0);
        }
        let client = self.client()?;
        let mut accepted = 0;

        for chunk in articles.chunks(MAX_RECORDS_PER_BATCH) {
            let records = chunk
                .iter()
                .map(|article| {
                    PutRecordsRequestEntry::builder()
                        .data(Blob::new(encode_record(article)?))
                        .partition_key(partition_key(article))
                        .build()
                        .map_err(|e| BrokerError::publish(e.to_string()))
                })
                .collect::<Result<Vec<_>, BrokerError>>()?;

            let output = client
                .put_records()
                .stream_name(&self.stream_name)
                .set_records(Some(records))
                .send()
                .await
                .map_err(|err| {
                    error!(error = %DisplayErrorContext(&err), "Failed to publish batch to Kinesis");
                    BrokerError::publish(DisplayErrorContext(&err).to_string())
                })?;

            let failed = output.failed_record_count();
            let chunk_accepted = accepted_in_chunk(chunk.len(), failed);
            if chunk_accepted < chunk.len() {
                warn!(
                    failed = chunk.len() - chunk_accepted,
                    total = chunk.len(),
                    "Batch had failed records"
                );
            } else {
                debug!(total = chunk.len(), "Batch published");
            }
            accepted += chunk_accepted;
        }

        info!(accepted, total = articles.len(), "Published batch to Kinesis");
        Ok(accepted)
    }

    fn close(&mut self) -> Result<(), BrokerError> {
        if self.client.take().is_some() {
            info!(stream = %self.stream_name, "Kinesis client resources cleaned up");
        }
        Ok(())
    }
}

/// Title capped at 256 bytes, or `"default"` for untitled articles.
pub fn partition_key(article: &Article) -> String {
    if article.title.is_empty() {
        DEFAULT_PARTITION_KEY.to_string()
    } else {
        truncate_to_byte_boundary(&article.title, MAX_PARTITION_KEY_BYTES).to_string()
    }
}

fn encode_record(article: &Article) -> Result<Vec<u8>, BrokerError> {
    Ok(serde_json::to_vec(article)?)
}

/// Records the broker accepted out of a chunk, given its reported failure count.
fn accepted_in_chunk(chunk_len: usize, failed: Option<i32>) -> usize {
    let failed = failed.map_or(0, |n| usize::try_from(n).unwrap_or(0));
    chunk_len.saturating_sub(failed)
}
