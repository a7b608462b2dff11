//! Command-line interface definitions for `guardian-fetch`.
//!
//! Every option can also come from the environment; flags win over
//! variables, and variables win over built-in defaults.

use crate::api::{MAX_PAGE_SIZE, validate_date};
use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::fetcher::DEFAULT_MAX_ARTICLES;
use clap::{Parser, ValueEnum};

/// How the run summary is printed.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Fetch Guardian articles and publish them to a Kinesis stream.
///
/// # Examples
///
/// ```sh
/// # Publish the ten newest "climate change" articles
/// guardian-fetch "climate change"
///
/// # Only articles since the start of the year, printed as JSON
/// guardian-fetch "renewable energy" --date-from 2024-01-01 --output-format json
///
/// # Dry run without AWS
/// guardian-fetch "machine learning" --use-mock
/// ```
#[derive(Parser, Debug)]
#[command(name = "guardian-fetch", author, version, about)]
pub struct Cli {
    /// Search term for Guardian articles
    #[arg(required_unless_present = "print_config_template")]
    pub search_term: Option<String>,

    /// Only include articles published on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub date_from: Option<String>,

    /// Maximum number of articles to fetch (1-50)
    #[arg(long, default_value_t = DEFAULT_MAX_ARTICLES,
          value_parser = clap::value_parser!(u32).range(1..=MAX_PAGE_SIZE as i64))]
    pub max_articles: u32,

    /// Kinesis stream to publish to
    #[arg(long, env = "KINESIS_STREAM_NAME")]
    pub stream_name: Option<String>,

    /// AWS region of the stream
    #[arg(long, env = "AWS_DEFAULT_REGION")]
    pub aws_region: Option<String>,

    /// Publish into memory instead of Kinesis
    #[arg(long)]
    pub use_mock: bool,

    /// Format of the printed summary
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Guardian API key
    #[arg(long, env = "GUARDIAN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print a .env template and exit
    #[arg(long)]
    pub print_config_template: bool,
}

impl Cli {
    /// Log level implied by `--verbose` / `--quiet`, if exactly one was given.
    pub fn log_level_override(&self) -> Option<&'static str> {
        match (self.verbose, self.quiet) {
            (true, false) => Some("DEBUG"),
            (false, true) => Some("ERROR"),
            _ => None,
        }
    }

    /// Reject a blank search term or a malformed `--date-from`.
    pub fn validate_request(&self) -> Result<(), ConfigError> {
        if self
            .search_term
            .as_deref()
            .is_some_and(|term| term.trim().is_empty())
        {
            return Err(ConfigError::invalid(
                "search term",
                "cannot be empty or whitespace",
            ));
        }
        if let Some(date) = self.date_from.as_deref().filter(|d| !d.is_empty()) {
            validate_date(date).map_err(|_| {
                ConfigError::invalid("--date-from", format!("'{date}' is not in YYYY-MM-DD format"))
            })?;
        }
        Ok(())
    }

    /// Build the application configuration, layering flags over `env`.
    ///
    /// Request flags are checked before any configuration is read. Unlike the
    /// library defaults, a Kinesis stream name must be supplied explicitly
    /// unless the mock broker is in use.
    pub fn app_config<F>(&self, env: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.validate_request()?;

        let config = AppConfig::from_lookup(|key| match key {
            "GUARDIAN_API_KEY" => self.api_key.clone().or_else(|| env(key)),
            "KINESIS_STREAM_NAME" => self.stream_name.clone().or_else(|| env(key)),
            "AWS_DEFAULT_REGION" => self.aws_region.clone().or_else(|| env(key)),
            "USE_MOCK_BROKER" if self.use_mock => Some("true".to_string()),
            "LOG_LEVEL" => self
                .log_level_override()
                .map(str::to_string)
                .or_else(|| env(key)),
            _ => env(key),
        })?;

        let stream_given = self
            .stream_name
            .clone()
            .or_else(|| env("KINESIS_STREAM_NAME"))
            .is_some_and(|s| !s.trim().is_empty());
        if !config.use_mock_broker && !stream_given {
            return Err(ConfigError::invalid(
                "KINESIS_STREAM_NAME",
                "a stream name is required when not using mock (set it or pass --stream-name)",
            ));
        }
        Ok(config)
    }
}
