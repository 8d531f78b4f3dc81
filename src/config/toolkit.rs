//! Root configuration combining producer and pool settings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;

use super::{PoolConfig, ProducerConfig};

/// Environment variable overriding [`ProducerConfig::queue_capacity`].
pub const ENV_QUEUE_CAPACITY: &str = "LOOKAHEAD_QUEUE_CAPACITY";
/// Environment variable overriding [`ProducerConfig::poll_interval_ms`].
pub const ENV_POLL_INTERVAL_MS: &str = "LOOKAHEAD_POLL_INTERVAL_MS";
/// Environment variable overriding [`ProducerConfig::thread_name`].
pub const ENV_THREAD_NAME: &str = "LOOKAHEAD_THREAD_NAME";
/// Environment variable overriding [`PoolConfig::limit`].
pub const ENV_POOL_LIMIT: &str = "POOL_LIMIT";

/// Root configuration for both components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Lookahead producer options.
    pub producer: ProducerConfig,
    /// Bounded pool options.
    pub pool: PoolConfig,
}

impl ToolkitConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.producer.validate()?;
        self.pool.validate()
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, or the validation
    /// error of the parsed values.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment.
    ///
    /// A `.env` file in the working directory (or a parent) is loaded first
    /// if present; variables already set in the environment win.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] for unparsable values, or the validation
    /// error of the resulting configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded environment file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, starting from the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Same as [`ToolkitConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(capacity) = parse_var(&lookup, ENV_QUEUE_CAPACITY)? {
            cfg.producer.queue_capacity = capacity;
        }
        if let Some(interval) = parse_var(&lookup, ENV_POLL_INTERVAL_MS)? {
            cfg.producer.poll_interval_ms = interval;
        }
        if let Some(name) = lookup(ENV_THREAD_NAME) {
            cfg.producer.thread_name = name;
        }
        if let Some(limit) = parse_var(&lookup, ENV_POOL_LIMIT)? {
            cfg.pool.limit = limit;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Env {
            key: key.to_owned(),
            value: raw,
        })
}
