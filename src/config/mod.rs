//! Configuration module for the catalog client

use std::num::{NonZeroU32, NonZeroUsize};
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use nonzero_ext::nonzero;
use serde::Deserialize;

use crate::domain::product::Language;
use crate::providers::itscope::batch::DEFAULT_BATCH_LENGTH;
use crate::providers::itscope::client::DEFAULT_BASE_URL;

/// Main client settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
}

/// API endpoint and account configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    /// Used to derive the user agent
    pub company_name: String,
    pub username: String,
    pub password: String,
    pub language: Language,
}

/// How group queries are driven through the executor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// One group at a time
    Sequential,
    /// Up to `max_concurrency` groups in flight
    #[default]
    Concurrent,
}

/// Batching, retry and rate limit tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub batch_length: NonZeroUsize,
    pub strategy: FetchStrategy,
    pub max_concurrency: NonZeroUsize,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub rate_limit_per_second: NonZeroU32,
    pub rate_limit_burst: NonZeroU32,
    /// Per-request HTTP timeout
    pub timeout_secs: u64,
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with ITSCOPE_)
    /// 2. config/local.toml (gitignored)
    /// 3. config/default.toml
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let builder = Config::builder()
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local overrides (gitignored)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment variables (ITSCOPE_API__USERNAME, etc.)
            .add_source(
                Environment::with_prefix("ITSCOPE")
                    .separator("__")
                    .try_parsing(true)
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: DEFAULT_BASE_URL.to_string(),
            company_name: String::new(),
            username: String::new(),
            password: String::new(),
            language: Language::German,
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            batch_length: DEFAULT_BATCH_LENGTH,
            strategy: FetchStrategy::Concurrent,
            max_concurrency: nonzero!(20usize),
            max_attempts: 3,
            retry_backoff_ms: 4000,
            rate_limit_per_second: nonzero!(6u32),
            rate_limit_burst: nonzero!(6u32),
            timeout_secs: 30,
        }
    }
}
