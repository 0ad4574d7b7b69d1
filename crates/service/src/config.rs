//! Customer service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CUSTOMER_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! ## Optional
//! - `CUSTOMER_HOST` - Bind address (default: 127.0.0.1)
//! - `CUSTOMER_PORT` - Listen port (default: 8080)
//! - `CUSTOMER_CACHE_CAPACITY` - Entries per cache (default: 1000)
//! - `CUSTOMER_CACHE_TTL_SECS` - Lifetime of cached customers (default: 600)
//! - `CUSTOMER_INFLIGHT_TTL_SECS` - Lifetime of coalescing-cache entries (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::cache::{CacheConfig, CacheSettings};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Customer service configuration.
#[derive(Clone)]
pub struct ServiceConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Capacity and lifetimes of the customer caches
    pub cache: CacheConfig,
    /// Sentry error tracking
    pub sentry: SentryConfig,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cache", &self.cache)
            .field("sentry", &self.sentry)
            .finish()
    }
}

/// Sentry client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let database_url = env.database_url("CUSTOMER_DATABASE_URL")?;
        let host = env.parse_or("CUSTOMER_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or("CUSTOMER_PORT", 8080_u16)?;

        let capacity = env.positive("CUSTOMER_CACHE_CAPACITY", CacheConfig::DEFAULT_CAPACITY)?;
        let value_ttl = env.positive(
            "CUSTOMER_CACHE_TTL_SECS",
            CacheConfig::DEFAULT_VALUE_TTL.as_secs(),
        )?;
        let in_flight_ttl = env.positive(
            "CUSTOMER_INFLIGHT_TTL_SECS",
            CacheConfig::DEFAULT_IN_FLIGHT_TTL.as_secs(),
        )?;
        let values = CacheSettings::new(capacity, Duration::from_secs(value_ttl));
        let cache = CacheConfig {
            by_id: values,
            by_document: values,
            in_flight: CacheSettings::new(capacity, Duration::from_secs(in_flight_ttl)),
        };

        let defaults = SentryConfig::default();
        let sentry = SentryConfig {
            dsn: env.optional("SENTRY_DSN"),
            environment: env.optional("SENTRY_ENVIRONMENT"),
            sample_rate: env.sample_rate("SENTRY_SAMPLE_RATE", defaults.sample_rate)?,
            traces_sample_rate: env
                .sample_rate("SENTRY_TRACES_SAMPLE_RATE", defaults.traces_sample_rate)?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            cache,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }

    /// Parse a variable, or use `default` when it is unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Parse a count or duration that must be greater than zero.
    fn positive(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        match self.parse_or(key, default)? {
            0 => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be greater than zero".to_string(),
            )),
            value => Ok(value),
        }
    }

    /// Parse a sample rate in `0.0..=1.0`.
    fn sample_rate(&self, key: &str, default: f32) -> Result<f32, ConfigError> {
        let rate = self.parse_or(key, default)?;
        if (0.0..=1.0).contains(&rate) {
            Ok(rate)
        } else {
            Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("must be between 0.0 and 1.0 (got {rate})"),
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("CUSTOMER_DATABASE_URL", "postgres://localhost/customers")]).unwrap();

        assert_eq!(config.database_url.expose_secret(), "postgres://localhost/customers");
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.sentry, SentryConfig::default());
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "CUSTOMER_DATABASE_URL"));
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fly/customers")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fly/customers");

        let config = load(&[
            ("DATABASE_URL", "postgres://fly/customers"),
            ("CUSTOMER_DATABASE_URL", "postgres://own/customers"),
        ])
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://own/customers");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("CUSTOMER_DATABASE_URL", "postgres://localhost/customers"),
            ("CUSTOMER_HOST", "0.0.0.0"),
            ("CUSTOMER_PORT", "9000"),
            ("CUSTOMER_CACHE_CAPACITY", "50"),
            ("CUSTOMER_CACHE_TTL_SECS", "30"),
            ("CUSTOMER_INFLIGHT_TTL_SECS", "5"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
            ("SENTRY_ENVIRONMENT", "staging"),
            ("SENTRY_TRACES_SAMPLE_RATE", "0.25"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.cache.by_id, CacheSettings::new(50, Duration::from_secs(30)));
        assert_eq!(config.cache.by_document, config.cache.by_id);
        assert_eq!(config.cache.in_flight, CacheSettings::new(50, Duration::from_secs(5)));
        assert_eq!(config.sentry.dsn.as_deref(), Some("https://key@sentry.example/1"));
        assert_eq!(config.sentry.environment.as_deref(), Some("staging"));
        assert!((config.sentry.traces_sample_rate - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[
            ("CUSTOMER_DATABASE_URL", "postgres://localhost/customers"),
            ("CUSTOMER_PORT", "http"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CUSTOMER_PORT"));
    }

    #[test]
    fn test_zero_cache_settings_rejected() {
        for key in [
            "CUSTOMER_CACHE_CAPACITY",
            "CUSTOMER_CACHE_TTL_SECS",
            "CUSTOMER_INFLIGHT_TTL_SECS",
        ] {
            let err = load(&[
                ("CUSTOMER_DATABASE_URL", "postgres://localhost/customers"),
                (key, "0"),
            ])
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == key));
        }
    }

    #[test]
    fn test_sample_rate_out_of_range() {
        let err = load(&[
            ("CUSTOMER_DATABASE_URL", "postgres://localhost/customers"),
            ("SENTRY_SAMPLE_RATE", "1.5"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "SENTRY_SAMPLE_RATE"));
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[("CUSTOMER_DATABASE_URL", "postgres://user:hunter2@db/customers")]).unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
    }
}
