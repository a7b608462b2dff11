//! Error types for each layer of the fetch-and-publish pipeline.
//!
//! - [`ApiError`]: failures talking to the Guardian content API
//! - [`BrokerError`]: failures creating or publishing to the message broker
//! - [`FetcherError`]: what the coordinator reports to its callers
//! - [`ConfigError`]: missing or malformed environment configuration

use thiserror::Error;

/// Errors raised by the Guardian search client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Input rejected before any request was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The HTTP request could not be completed or returned a non-2xx status.
    #[error("failed to make request to Guardian API: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the JSON document we expect.
    #[error("invalid JSON response from Guardian API: {0}")]
    InvalidResponse(#[source] serde_json::Error),

    /// The API answered, but its embedded status was not "ok".
    #[error("Guardian API error: {0}")]
    Api(String),
}

impl ApiError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Errors raised by message broker publishers.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Kinesis stream '{0}' does not exist")]
    StreamNotFound(String),

    #[error("Kinesis stream '{stream}' is not active. Status: {status}")]
    StreamNotActive { stream: String, status: String },

    /// Client construction or stream verification failed for another reason.
    #[error("failed to create Kinesis client: {0}")]
    Client(String),

    #[error("failed to publish: {0}")]
    Publish(String),

    #[error("failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("publisher has been closed")]
    Closed,
}

impl BrokerError {
    pub fn client(msg: impl Into<String>) -> Self {
        Self::Client(msg.into())
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }
}

/// Errors surfaced by the fetch-and-publish coordinator and its factory.
#[derive(Error, Debug)]
pub enum FetcherError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("service error during fetch and publish: {0}")]
    Search(#[source] ApiError),

    #[error("service error during fetch and publish: {0}")]
    Broker(#[from] BrokerError),

    #[error("failed to create fetcher: {0}")]
    Construction(String),
}

impl FetcherError {
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction(msg.into())
    }

    /// True when the caller supplied bad input rather than a dependency failing.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

impl From<ApiError> for FetcherError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidArgument(msg) => Self::InvalidArgument(msg),
            other => Self::Search(other),
        }
    }
}

/// Errors raised while loading configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {name}")]
    MissingVariable { name: String },

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl ConfigError {
    pub fn missing<N: Into<String>>(name: N) -> Self {
        Self::MissingVariable { name: name.into() }
    }

    pub fn invalid<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::InvalidValue {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
