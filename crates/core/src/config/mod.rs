//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (DOTGRAPH_*)
//! 2. TOML config file (if DOTGRAPH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;
use validation::{MAX_ARCHIVAL_TTL_DAYS, MAX_CACHE_TTL_HOURS};

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (DOTGRAPH_*)
/// 2. TOML config file (if DOTGRAPH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache metadata database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory holding cached response bodies.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Default cache TTL for volatile listings, in hours.
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    /// Cache TTL for externally-dated historical records, in days.
    #[serde(default = "default_archival_ttl_days")]
    pub archival_ttl_days: u64,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Concurrent in-flight fetches allowed per remote host.
    #[serde(default = "default_per_host_limit")]
    pub per_host_limit: usize,

    /// Attempts per fetch, including the first, for transient failures.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Backoff before the first retry; doubled for each further attempt.
    #[serde(default = "default_retry_initial_backoff_ms")]
    pub retry_initial_backoff_ms: u64,

    /// Upper bound on a single backoff sleep.
    #[serde(default = "default_retry_max_backoff_ms")]
    pub retry_max_backoff_ms: u64,

    /// api.congress.gov key.
    ///
    /// Set via DOTGRAPH_CONGRESS_API_KEY environment variable.
    #[serde(default)]
    pub congress_api_key: Option<String>,

    /// Base URL of the congress.gov v3 API.
    #[serde(default = "default_congress_api_base")]
    pub congress_api_base: String,

    /// How many congresses from the congress listing get their bills crawled.
    #[serde(default = "default_max_congresses")]
    pub max_congresses: usize,

    /// Bolt URI of the Neo4j server.
    #[serde(default = "default_neo4j_uri")]
    pub neo4j_uri: String,

    #[serde(default = "default_neo4j_user")]
    pub neo4j_user: String,

    #[serde(default)]
    pub neo4j_password: Option<String>,

    /// Write to an in-memory graph instead of Neo4j.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./dotgraph-cache.sqlite")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./.dotgraph/blobs")
}

fn default_cache_ttl_hours() -> u64 {
    240
}

fn default_archival_ttl_days() -> u64 {
    3650
}

fn default_user_agent() -> String {
    "dotgraph/0.1".into()
}

fn default_max_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_per_host_limit() -> usize {
    2
}

fn default_retry_max_attempts() -> u32 {
    4
}

fn default_retry_initial_backoff_ms() -> u64 {
    500
}

fn default_retry_max_backoff_ms() -> u64 {
    30_000
}

fn default_congress_api_base() -> String {
    "https://api.congress.gov/v3".into()
}

fn default_max_congresses() -> usize {
    3
}

fn default_neo4j_uri() -> String {
    "127.0.0.1:7687".into()
}

fn default_neo4j_user() -> String {
    "neo4j".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_dir: default_cache_dir(),
            cache_ttl_hours: default_cache_ttl_hours(),
            archival_ttl_days: default_archival_ttl_days(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            per_host_limit: default_per_host_limit(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_initial_backoff_ms: default_retry_initial_backoff_ms(),
            retry_max_backoff_ms: default_retry_max_backoff_ms(),
            congress_api_key: None,
            congress_api_base: default_congress_api_base(),
            max_congresses: default_max_congresses(),
            neo4j_uri: default_neo4j_uri(),
            neo4j_user: default_neo4j_user(),
            neo4j_password: None,
            dry_run: false,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Default cache TTL for volatile listings, clamped to the validated maximum.
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cache_ttl_hours.min(MAX_CACHE_TTL_HOURS) as i64)
    }

    /// Cache TTL for historical records that never change once published,
    /// clamped to the validated maximum.
    pub fn archival_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.archival_ttl_days.min(MAX_ARCHIVAL_TTL_DAYS) as i64)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `DOTGRAPH_`
    /// 2. TOML file from `DOTGRAPH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("DOTGRAPH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("DOTGRAPH_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The congress.gov API key, required before crawling.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_congress_api_key(&self) -> Result<&str, ConfigError> {
        self.congress_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "congress_api_key".into(),
                hint: "Set DOTGRAPH_CONGRESS_API_KEY environment variable".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./dotgraph-cache.sqlite"));
        assert_eq!(config.user_agent, "dotgraph/0.1");
        assert_eq!(config.max_bytes, 20 * 1024 * 1024);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.per_host_limit, 2);
        assert_eq!(config.cache_ttl_hours, 240);
        assert_eq!(config.max_congresses, 3);
        assert!(!config.dry_run);
        assert!(config.congress_api_key.is_none());
    }

    #[test]
    fn test_ttl_durations() {
        let config = AppConfig::default();
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(240));
        assert_eq!(config.archival_ttl(), chrono::Duration::days(3650));
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_oversized_ttls_clamped_not_panicking() {
        let config = AppConfig { cache_ttl_hours: u64::MAX, archival_ttl_days: 1_000_000_000_000, ..Default::default() };
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(87_600));
        assert_eq!(config.archival_ttl(), chrono::Duration::days(36_500));
    }

    #[test]
    fn test_require_congress_api_key_missing() {
        let config = AppConfig::default();
        assert!(matches!(config.require_congress_api_key(), Err(ConfigError::Missing { .. })));

        let config = AppConfig { congress_api_key: Some(String::new()), ..Default::default() };
        assert!(matches!(config.require_congress_api_key(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_require_congress_api_key_present() {
        let config = AppConfig { congress_api_key: Some("test-key".into()), ..Default::default() };
        assert_eq!(config.require_congress_api_key().unwrap(), "test-key");
    }
}
