//! Lookahead producer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;

/// Default number of items a producer may run ahead of its consumer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 65_536;
/// Default interval between stop-flag checks while blocked on the queue.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;
/// Default name of the background producer thread.
pub const DEFAULT_THREAD_NAME: &str = "lookahead-producer";

/// Options for a [`LookaheadProducer`](crate::core::LookaheadProducer).
///
/// The larger the queue, the more values are computed ahead of use, which
/// costs memory and processor time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Upper bound on buffered but unconsumed items.
    #[serde(alias = "queueCapacity")]
    pub queue_capacity: usize,
    /// Milliseconds either side waits on the queue before re-checking the
    /// stop flag.
    #[serde(alias = "pollIntervalMs")]
    pub poll_interval_ms: u64,
    /// Name given to the background thread.
    #[serde(alias = "threadName")]
    pub thread_name: String,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
        }
    }
}

impl ProducerConfig {
    /// Configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lookahead queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the poll interval. Sub-millisecond parts are dropped, but a
    /// non-zero interval never becomes shorter than one millisecond.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self.poll_interval_ms = if interval.is_zero() { 0 } else { millis.max(1) };
        self
    }

    /// Set the background thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate producer configuration values.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity);
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.thread_name.is_empty() || self.thread_name.contains('\0') {
            return Err(ConfigError::InvalidThreadName(self.thread_name.clone()));
        }
        Ok(())
    }
}
