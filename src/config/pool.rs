//! Bounded pool configuration.

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;

/// Default ceiling on concurrently running pool units.
pub const DEFAULT_POOL_LIMIT: usize = 128;

/// Options for a [`BoundedPool`](crate::core::BoundedPool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum concurrently running admitted units.
    pub limit: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_POOL_LIMIT,
        }
    }
}

impl PoolConfig {
    /// Configuration with the given limit.
    #[must_use]
    pub const fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    /// Validate pool configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLimit`] when `limit` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::InvalidLimit);
        }
        Ok(())
    }
}
