//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

/// Longest accepted listing TTL: ten years.
pub(crate) const MAX_CACHE_TTL_HOURS: u64 = 87_600;
/// Longest accepted archival TTL: a century.
pub(crate) const MAX_ARCHIVAL_TTL_DAYS: u64 = 36_500;

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `per_host_limit` is 0 or above 16
    /// - `retry_max_attempts` is 0 or above 10
    /// - a backoff bound is inverted
    /// - `user_agent` or `congress_api_base` is empty
    /// - either TTL is 0, `cache_ttl_hours` exceeds ten years or
    ///   `archival_ttl_days` exceeds a century
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.per_host_limit == 0 || self.per_host_limit > 16 {
            return Err(invalid("per_host_limit", "must be between 1 and 16"));
        }

        if self.retry_max_attempts == 0 || self.retry_max_attempts > 10 {
            return Err(invalid("retry_max_attempts", "must be between 1 and 10"));
        }
        if self.retry_initial_backoff_ms > self.retry_max_backoff_ms {
            return Err(invalid("retry_initial_backoff_ms", "must not exceed retry_max_backoff_ms"));
        }

        if self.cache_ttl_hours == 0 || self.cache_ttl_hours > MAX_CACHE_TTL_HOURS {
            return Err(invalid("cache_ttl_hours", "must be between 1 and 87600 (ten years)"));
        }
        if self.archival_ttl_days == 0 || self.archival_ttl_days > MAX_ARCHIVAL_TTL_DAYS {
            return Err(invalid("archival_ttl_days", "must be between 1 and 36500"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.congress_api_base.trim().is_empty() {
            return Err(invalid("congress_api_base", "must not be empty"));
        }

        if self.max_congresses == 0 {
            tracing::warn!("max_congresses is 0; bills will not be crawled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: Result<(), ConfigError>) -> Option<String> {
        match result {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("max_bytes"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("timeout_ms"));
    }

    #[test]
    fn test_validate_per_host_limit() {
        let config = AppConfig { per_host_limit: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("per_host_limit"));

        let config = AppConfig { per_host_limit: 17, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("per_host_limit"));
    }

    #[test]
    fn test_validate_retry_settings() {
        let config = AppConfig { retry_max_attempts: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("retry_max_attempts"));

        let config = AppConfig { retry_initial_backoff_ms: 10_000, retry_max_backoff_ms: 1_000, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("retry_initial_backoff_ms"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("user_agent"));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = AppConfig { cache_ttl_hours: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("cache_ttl_hours"));
    }

    #[test]
    fn test_validate_ttl_upper_bounds() {
        let config = AppConfig { archival_ttl_days: 1_000_000_000_000, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("archival_ttl_days"));

        let config = AppConfig { cache_ttl_hours: MAX_CACHE_TTL_HOURS + 1, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("cache_ttl_hours"));

        let config = AppConfig {
            cache_ttl_hours: MAX_CACHE_TTL_HOURS,
            archival_ttl_days: MAX_ARCHIVAL_TTL_DAYS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            max_bytes: 50 * 1024 * 1024,
            timeout_ms: 100,
            per_host_limit: 16,
            retry_max_attempts: 1,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
