//! Error types for producers, pools and configuration.

use std::time::Duration;

use thiserror::Error;

use super::bounded_pool::WorkUnit;

/// Errors raised synchronously when a component is configured incorrectly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A producer was built without a producing routine.
    #[error("no routine for the lookahead producer to run")]
    MissingRoutine,
    /// The lookahead queue must hold at least one item.
    #[error("queue_capacity must be greater than 0")]
    InvalidQueueCapacity,
    /// The poll interval must be non-zero.
    #[error("poll_interval_ms must be greater than 0")]
    InvalidPollInterval,
    /// Producer thread names must be non-empty and free of NUL bytes.
    #[error("invalid producer thread name: {0:?}")]
    InvalidThreadName(String),
    /// Pools need room for at least one running unit.
    #[error("pool limit must be greater than 0")]
    InvalidLimit,
    /// Groups must contain at least one element.
    #[error("chunk size must be greater than 0")]
    InvalidChunkSize,
    /// A configuration document could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
    /// An environment variable held a value of the wrong type.
    #[error("environment variable `{key}` has invalid value {value:?}")]
    Env {
        /// Variable name.
        key: String,
        /// Raw value that failed to parse.
        value: String,
    },
}

/// Errors reported by a [`LookaheadProducer`](super::LookaheadProducer).
#[derive(Debug, Error)]
pub enum ProducerError {
    /// The routine panicked while producing; items emitted before the
    /// failure were still delivered.
    #[error("producer routine failed: {0}")]
    RoutineFailed(String),
    /// The background thread could not be started.
    #[error("failed to spawn producer thread: {0}")]
    Spawn(#[source] std::io::Error),
    /// The background thread terminated abnormally.
    #[error("producer thread panicked")]
    Panicked,
}

/// Errors reported by a [`BoundedPool`](super::BoundedPool).
#[derive(Debug, Error)]
pub enum PoolError {
    /// The value handed to the pool is not a runnable execution unit.
    #[error("cannot admit unit: {0}")]
    InvalidUnit(String),
    /// The pool is full; the unit is handed back untouched.
    #[error("pool is at capacity ({limit} running units)")]
    AtCapacity {
        /// Configured pool limit.
        limit: usize,
        /// The rejected unit.
        unit: WorkUnit,
    },
    /// No slot freed up in time; the unit is handed back untouched.
    #[error("no pool slot freed within {waited:?}")]
    Timeout {
        /// How long admission waited.
        waited: Duration,
        /// The rejected unit.
        unit: WorkUnit,
    },
    /// The operating system refused to start the unit's thread.
    #[error("failed to spawn unit thread: {0}")]
    Spawn(#[source] std::io::Error),
    /// The async admission task could not be joined.
    #[error("admission task failed: {0}")]
    Join(String),
}

impl PoolError {
    /// Recover the unit carried by a capacity or timeout rejection.
    #[must_use]
    pub fn into_unit(self) -> Option<WorkUnit> {
        match self {
            Self::AtCapacity { unit, .. } | Self::Timeout { unit, .. } => Some(unit),
            _ => None,
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
