//! Background lookahead producer.
//!
//! A [`LookaheadProducer`] runs a producing routine on its own thread and
//! streams the routine's items through a bounded queue to whoever iterates the
//! producer. Production runs ahead of consumption by at most
//! `queue_capacity` items.
//!
//! # Design
//!
//! - **Bounded queue**: a `crossbeam_channel::bounded` channel is the only
//!   synchronization point between the two threads
//! - **Bounded waits**: both sides block with a timeout of one poll interval
//!   and re-check the stop flag in between, so a stop is observed promptly
//!   even while the queue is full or empty
//! - **Failure propagation**: a panic in the routine is delivered to the
//!   consumer as a terminal marker instead of silently truncating the stream
//!
//! # Leaking the producer thread
//!
//! The background thread only exits once the routine is exhausted and its
//! items were drained, or once a stop is requested. A producer that is kept
//! alive but not fully consumed holds its thread forever; call
//! [`LookaheadProducer::stop`] (or drop the producer) when abandoning it.
//!
//! # Example
//!
//! ```
//! use lookahead_pool::LookaheadProducer;
//!
//! let mut producer = LookaheadProducer::new(|| 0..20);
//! let items: Vec<u32> = producer.iter().collect();
//! assert_eq!(items, (0..20).collect::<Vec<_>>());
//! producer.stop();
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use tracing::{debug, error};

use crate::config::ProducerConfig;

use super::{ConfigError, ProducerError, StopHandle};

/// Type-erased producing routine.
pub(crate) type Routine<T> = Box<dyn FnOnce() -> Box<dyn Iterator<Item = T>> + Send + 'static>;

/// Erase a routine returning any iterable.
pub(crate) fn erase_routine<T, F, I>(routine: F) -> Routine<T>
where
    F: FnOnce() -> I + Send + 'static,
    I: IntoIterator<Item = T>,
    I::IntoIter: 'static,
{
    Box::new(move || Box::new(routine().into_iter()) as Box<dyn Iterator<Item = T>>)
}

/// Messages carried by the lookahead queue.
enum Envelope<T> {
    Item(T),
    Failed(String),
}

/// Lifecycle of a producer. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    /// Constructed; the background thread has not been started.
    Idle,
    /// The background thread was started and the stream is not finished.
    Running,
    /// Exhausted, failed or stopped. Never restarts.
    Finished,
}

/// Runs a producing routine on a background thread and exposes its items as
/// a lazy, forward-only sequence.
pub struct LookaheadProducer<T: Send + 'static> {
    config: ProducerConfig,
    routine: Option<Routine<T>>,
    stop: StopHandle,
    rx: Option<Receiver<Envelope<T>>>,
    worker: Option<JoinHandle<()>>,
    state: ProducerState,
    failure: Option<ProducerError>,
}

impl<T: Send + 'static> LookaheadProducer<T> {
    /// Create an idle producer with the default configuration.
    ///
    /// `routine` is called once, on the background thread, when the producer
    /// is first iterated. Arguments are captured by the closure.
    pub fn new<F, I>(routine: F) -> Self
    where
        F: FnOnce() -> I + Send + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Self::from_parts(ProducerConfig::default(), erase_routine(routine))
    }

    /// Create an idle producer with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is invalid.
    pub fn with_config<F, I>(routine: F, config: ProducerConfig) -> Result<Self, ConfigError>
    where
        F: FnOnce() -> I + Send + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        config.validate()?;
        Ok(Self::from_parts(config, erase_routine(routine)))
    }

    pub(crate) fn from_parts(config: ProducerConfig, routine: Routine<T>) -> Self {
        Self {
            config,
            routine: Some(routine),
            stop: StopHandle::new(),
            rx: None,
            worker: None,
            state: ProducerState::Idle,
            failure: None,
        }
    }

    /// Borrowing iterator over the produced items.
    ///
    /// The first pull starts the background thread. Iterating again later
    /// resumes where the previous iterator left off.
    pub fn iter(&mut self) -> Iter<'_, T> {
        Iter { producer: self }
    }

    /// Request the producer to finish. Idempotent.
    ///
    /// Buffered items that were not consumed yet are discarded.
    pub fn stop(&self) {
        if self.stop.stop() {
            debug!(thread = %self.config.thread_name, "lookahead producer stop requested");
        }
    }

    /// Handle that stops this producer from another thread.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ProducerState {
        if self.stop.is_stopped() {
            ProducerState::Finished
        } else {
            self.state
        }
    }

    /// Whether the stream has ended or a stop was requested.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state() == ProducerState::Finished
    }

    /// Whether the background thread is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }

    /// Configuration this producer was built with.
    #[must_use]
    pub const fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Why the stream ended early, if it did not end by exhaustion or stop.
    #[must_use]
    pub const fn failure(&self) -> Option<&ProducerError> {
        self.failure.as_ref()
    }

    /// Take the recorded failure, leaving `None`.
    pub fn take_failure(&mut self) -> Option<ProducerError> {
        self.failure.take()
    }

    /// Stop the producer and wait for the background thread to exit.
    ///
    /// Returns within about one poll interval unless the routine itself is
    /// blocked computing its next item.
    ///
    /// # Errors
    ///
    /// Returns [`ProducerError::Panicked`] if the thread ended abnormally.
    pub fn join(&mut self) -> Result<(), ProducerError> {
        self.stop();
        self.finish();
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| ProducerError::Panicked),
            None => Ok(()),
        }
    }

    fn start(&mut self) {
        let Some(routine) = self.routine.take() else {
            return;
        };
        let (tx, rx) = bounded(self.config.queue_capacity);
        let stop = self.stop.clone();
        let poll_interval = self.config.poll_interval();

        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || run(routine, &tx, &stop, poll_interval));

        match spawned {
            Ok(worker) => {
                debug!(
                    thread = %self.config.thread_name,
                    queue_capacity = self.config.queue_capacity,
                    "lookahead producer started"
                );
                self.worker = Some(worker);
                self.rx = Some(rx);
                self.state = ProducerState::Running;
            }
            Err(e) => {
                error!(thread = %self.config.thread_name, error = %e, "failed to spawn producer thread");
                self.failure = Some(ProducerError::Spawn(e));
                self.finish();
            }
        }
    }

    fn finish(&mut self) {
        self.state = ProducerState::Finished;
        self.stop.stop();
        // Dropping the receiver discards buffered items and unblocks the sender.
        self.rx = None;
    }

    fn next_item(&mut self) -> Option<T> {
        match self.state {
            ProducerState::Finished => return None,
            ProducerState::Idle => {
                if self.stop.is_stopped() {
                    self.finish();
                    return None;
                }
                self.start();
            }
            ProducerState::Running => {}
        }

        let rx = self.rx.clone()?;
        let poll_interval = self.config.poll_interval();
        loop {
            if self.stop.is_stopped() {
                self.finish();
                return None;
            }
            match rx.recv_timeout(poll_interval) {
                Ok(Envelope::Item(item)) => return Some(item),
                Ok(Envelope::Failed(reason)) => {
                    error!(thread = %self.config.thread_name, reason = %reason, "producer routine failed");
                    self.failure = Some(ProducerError::RoutineFailed(reason));
                    self.finish();
                    return None;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!(thread = %self.config.thread_name, "lookahead stream drained");
                    self.finish();
                    return None;
                }
            }
        }
    }
}

impl<T: Send + 'static> Drop for LookaheadProducer<T> {
    fn drop(&mut self) {
        // Signal only; the thread exits on its own within one poll interval.
        self.stop.stop();
    }
}

impl<T: Send + 'static> std::fmt::Debug for LookaheadProducer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookaheadProducer")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

/// Borrowing iterator returned by [`LookaheadProducer::iter`].
#[derive(Debug)]
pub struct Iter<'a, T: Send + 'static> {
    producer: &'a mut LookaheadProducer<T>,
}

impl<T: Send + 'static> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.producer.next_item()
    }
}

/// Owning iterator; dropping it stops the producer.
#[derive(Debug)]
pub struct IntoIter<T: Send + 'static> {
    producer: LookaheadProducer<T>,
}

impl<T: Send + 'static> IntoIter<T> {
    /// The underlying producer, e.g. to inspect a failure.
    #[must_use]
    pub const fn producer(&self) -> &LookaheadProducer<T> {
        &self.producer
    }
}

impl<T: Send + 'static> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.producer.next_item()
    }
}

impl<'a, T: Send + 'static> IntoIterator for &'a mut LookaheadProducer<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T: Send + 'static> IntoIterator for LookaheadProducer<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter { producer: self }
    }
}

/// Background loop: run the routine and forward its items.
///
/// Dropping `tx` on return disconnects the channel once the consumer has
/// received every buffered item.
fn run<T>(
    routine: Routine<T>,
    tx: &Sender<Envelope<T>>,
    stop: &StopHandle,
    poll_interval: Duration,
) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        for item in routine() {
            if !send(tx, Envelope::Item(item), stop, poll_interval) {
                return false;
            }
        }
        true
    }));

    match outcome {
        Ok(true) => debug!("producer routine exhausted"),
        Ok(false) => debug!("producer stopped before routine was exhausted"),
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            send(tx, Envelope::Failed(reason), stop, poll_interval);
        }
    }
}

/// Enqueue one envelope, waiting at most one poll interval between stop
/// checks. Returns `false` if the producer should quit.
fn send<T>(
    tx: &Sender<Envelope<T>>,
    mut envelope: Envelope<T>,
    stop: &StopHandle,
    poll_interval: Duration,
) -> bool {
    loop {
        if stop.is_stopped() {
            return false;
        }
        match tx.send_timeout(envelope, poll_interval) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(back)) => envelope = back,
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn fast_config() -> ProducerConfig {
        ProducerConfig::new().with_poll_interval(Duration::from_millis(10))
    }

    #[test]
    fn test_created_idle() {
        let producer = LookaheadProducer::new(|| vec![1, 2, 3]);
        assert_eq!(producer.state(), ProducerState::Idle);
        assert!(!producer.is_running());
    }

    #[test]
    fn test_yields_all_items_in_order() {
        let mut producer = LookaheadProducer::with_config(|| 0..100, fast_config()).unwrap();
        let items: Vec<i32> = producer.iter().collect();
        assert_eq!(items, (0..100).collect::<Vec<_>>());
        assert!(producer.is_finished());
        assert!(producer.failure().is_none());
        producer.join().unwrap();
    }

    #[test]
    fn test_small_queue_does_not_drop_items() {
        let config = fast_config().with_queue_capacity(2);
        let mut producer = LookaheadProducer::with_config(|| vec!['a', 'b', 'c', 'd', 'e'], config).unwrap();
        let items: String = producer.iter().collect();
        assert_eq!(items, "abcde");
    }

    #[test]
    fn test_resumes_across_iterators() {
        let mut producer = LookaheadProducer::with_config(|| 0..6, fast_config()).unwrap();
        let first: Vec<_> = producer.iter().take(2).collect();
        let rest: Vec<_> = producer.iter().collect();
        assert_eq!(first, vec![0, 1]);
        assert_eq!(rest, vec![2, 3, 4, 5]);
        assert_eq!(producer.iter().next(), None);
    }

    #[test]
    fn test_stop_before_start_never_runs_routine() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let mut producer = LookaheadProducer::new(move || {
            flag.store(true, Ordering::SeqCst);
            vec![1]
        });

        producer.stop();
        assert_eq!(producer.iter().next(), None);
        assert!(!producer.is_running());
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_stop_discards_buffered_items() {
        let config = fast_config().with_queue_capacity(16);
        let mut producer = LookaheadProducer::with_config(|| 0..16, config).unwrap();
        assert_eq!(producer.iter().next(), Some(0));
        producer.stop();
        assert_eq!(producer.iter().next(), None);
        assert_eq!(producer.state(), ProducerState::Finished);
    }

    #[test]
    fn test_stop_with_full_queue_ends_thread() {
        let config = fast_config().with_queue_capacity(2);
        let mut producer = LookaheadProducer::with_config(|| 0u64.., config).unwrap();
        assert_eq!(producer.iter().next(), Some(0));

        let start = Instant::now();
        producer.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(!producer.is_running());
    }

    #[test]
    fn test_routine_panic_is_reported() {
        let mut producer = LookaheadProducer::with_config(
            || (0..5).map(|i| if i == 3 { panic!("boom at {i}") } else { i }),
            fast_config(),
        )
        .unwrap();

        let items: Vec<_> = producer.iter().collect();
        assert_eq!(items, vec![0, 1, 2]);
        match producer.take_failure() {
            Some(ProducerError::RoutineFailed(reason)) => assert_eq!(reason, "boom at 3"),
            other => panic!("unexpected failure: {other:?}"),
        }
        assert!(producer.failure().is_none());
    }

    #[test]
    fn test_panic_message_fallback() {
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
