//! Environment-driven configuration.
//!
//! [`AppConfig::from_env`] reads the process environment (after loading a
//! `.env` file if one exists). [`AppConfig::from_lookup`] does the same from
//! any key lookup, which is what the tests use.
//!
//! | Variable | Default | Notes |
//! |----------|---------|-------|
//! | `GUARDIAN_API_KEY` | - | required |
//! | `GUARDIAN_RATE_LIMIT_DELAY` | `2.0` | seconds between searches |
//! | `GUARDIAN_API_URL` | `https://content.guardianapis.com` | |
//! | `AWS_DEFAULT_REGION` | `eu-west-2` | |
//! | `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` | unset | default credential chain when unset |
//! | `KINESIS_STREAM_NAME` | `guardian-content` | ignored with the mock broker |
//! | `USE_MOCK_BROKER` | `false` | |
//! | `LOG_LEVEL` | `INFO` | DEBUG, INFO, WARNING, ERROR, CRITICAL |

use crate::api::{DEFAULT_BASE_URL, DEFAULT_RATE_LIMIT_DELAY};
use crate::error::ConfigError;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_REGION: &str = "eu-west-2";
pub const DEFAULT_STREAM_NAME: &str = "guardian-content";

const LOG_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// Guardian API settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardianConfig {
    pub api_key: String,
    pub rate_limit_delay: Duration,
    pub base_url: String,
}

/// AWS region and optional explicit credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KinesisConfig {
    pub stream_name: String,
    pub aws: AwsConfig,
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub guardian: GuardianConfig,
    /// `None` when the mock broker is selected.
    pub kinesis: Option<KinesisConfig>,
    pub log_level: String,
    pub use_mock_broker: bool,
}

impl AppConfig {
    /// Load configuration from the process environment and any `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            info!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("GUARDIAN_API_KEY").ok_or_else(|| ConfigError::missing("GUARDIAN_API_KEY"))?;
        let rate_limit_delay = match non_empty("GUARDIAN_RATE_LIMIT_DELAY") {
            Some(raw) => parse_delay(&raw)?,
            None => DEFAULT_RATE_LIMIT_DELAY,
        };
        let guardian = GuardianConfig {
            api_key,
            rate_limit_delay,
            base_url: non_empty("GUARDIAN_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };

        let aws = AwsConfig {
            region: non_empty("AWS_DEFAULT_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            access_key_id: non_empty("AWS_ACCESS_KEY_ID"),
            secret_access_key: non_empty("AWS_SECRET_ACCESS_KEY"),
        };

        let use_mock_broker = lookup("USE_MOCK_BROKER").is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
        let kinesis = if use_mock_broker {
            None
        } else {
            Some(KinesisConfig {
                stream_name: non_empty("KINESIS_STREAM_NAME")
                    .unwrap_or_else(|| DEFAULT_STREAM_NAME.to_string()),
                aws,
            })
        };

        let log_level = normalize_log_level(lookup("LOG_LEVEL").as_deref());

        Ok(Self {
            guardian,
            kinesis,
            log_level,
            use_mock_broker,
        })
    }

    /// `tracing` filter directive equivalent to [`AppConfig::log_level`].
    pub fn tracing_level(&self) -> &'static str {
        tracing_directive(&self.log_level)
    }
}

fn parse_delay(raw: &str) -> Result<Duration, ConfigError> {
    let seconds: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid("GUARDIAN_RATE_LIMIT_DELAY", format!("'{raw}' is not a number")))?;
    Duration::try_from_secs_f64(seconds).map_err(|_| {
        ConfigError::invalid(
            "GUARDIAN_RATE_LIMIT_DELAY",
            format!("'{raw}' must be a non-negative number of seconds"),
        )
    })
}

/// Upper-case `level`, falling back to INFO for unknown values.
pub fn normalize_log_level(level: Option<&str>) -> String {
    let Some(level) = level else {
        return "INFO".to_string();
    };
    let upper = level.trim().to_uppercase();
    if LOG_LEVELS.contains(&upper.as_str()) {
        upper
    } else {
        warn!(level, "Invalid log level, using INFO");
        "INFO".to_string()
    }
}

/// Map a configured level name onto a `tracing` filter directive.
pub fn tracing_directive(level: &str) -> &'static str {
    match level {
        "DEBUG" => "debug",
        "WARNING" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// A commented `.env` template listing every supported variable.
pub fn config_template() -> String {
    format!(
        r#"# Guardian Content Fetcher Environment Configuration
# Copy this content to a .env file and fill in your actual values

# Guardian API Configuration (Required)
# Get your free API key from: https://open-platform.theguardian.com/access/
GUARDIAN_API_KEY=your-guardian-api-key-here

# AWS Configuration (Optional - the default credential chain is used if not provided)
# AWS_ACCESS_KEY_ID=your-aws-access-key-id
# AWS_SECRET_ACCESS_KEY=your-aws-secret-access-key

# AWS Region (Optional - defaults to {DEFAULT_REGION})
AWS_DEFAULT_REGION={DEFAULT_REGION}

# Kinesis Stream Configuration (Required unless using mock)
KINESIS_STREAM_NAME={DEFAULT_STREAM_NAME}

# Use the in-memory broker instead of Kinesis (useful for testing)
# USE_MOCK_BROKER=false

# Logging: DEBUG, INFO, WARNING, ERROR or CRITICAL
# LOG_LEVEL=INFO

# Seconds between Guardian API calls
# GUARDIAN_RATE_LIMIT_DELAY={delay}

# Alternative Guardian API base URL
# GUARDIAN_API_URL={DEFAULT_BASE_URL}"#,
        delay = DEFAULT_RATE_LIMIT_DELAY.as_secs_f64()
    )
}
