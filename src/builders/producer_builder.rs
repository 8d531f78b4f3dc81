//! Builder assembling a lookahead producer from a routine and options.

use std::time::Duration;

use crate::config::ProducerConfig;
use crate::core::lookahead::{erase_routine, Routine};
use crate::core::{ConfigError, LookaheadProducer};

/// Step-by-step construction of a [`LookaheadProducer`].
///
/// Unlike [`LookaheadProducer::new`], the routine is optional until
/// [`build`](ProducerBuilder::build), which is where a missing routine is
/// reported.
///
/// ```
/// use lookahead_pool::builders::ProducerBuilder;
/// use std::time::Duration;
///
/// let mut producer = ProducerBuilder::new()
///     .queue_capacity(8)
///     .poll_interval(Duration::from_millis(50))
///     .routine(|| vec!["a", "b"])
///     .build()?;
/// assert_eq!(producer.iter().collect::<Vec<_>>(), ["a", "b"]);
/// # Ok::<(), lookahead_pool::ConfigError>(())
/// ```
pub struct ProducerBuilder<T: Send + 'static> {
    config: ProducerConfig,
    routine: Option<Routine<T>>,
}

impl<T: Send + 'static> ProducerBuilder<T> {
    /// Builder with default options and no routine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ProducerConfig::default(),
            routine: None,
        }
    }

    /// Replace all options at once.
    #[must_use]
    pub fn config(mut self, config: ProducerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the lookahead queue capacity.
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the poll interval.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_poll_interval(interval);
        self
    }

    /// Set the background thread name.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Set the producing routine.
    #[must_use]
    pub fn routine<F, I>(mut self, routine: F) -> Self
    where
        F: FnOnce() -> I + Send + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        self.routine = Some(erase_routine(routine));
        self
    }

    /// Validate and create the producer. Nothing is started.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingRoutine`] if no routine was set
    /// - the configuration's validation error otherwise
    pub fn build(self) -> Result<LookaheadProducer<T>, ConfigError> {
        let routine = self.routine.ok_or(ConfigError::MissingRoutine)?;
        self.config.validate()?;
        Ok(LookaheadProducer::from_parts(self.config, routine))
    }
}

impl<T: Send + 'static> Default for ProducerBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> std::fmt::Debug for ProducerBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerBuilder")
            .field("config", &self.config)
            .field("has_routine", &self.routine.is_some())
            .finish()
    }
}
