//! Shared stop flag observed by producer and consumer threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to a producer's "finished" flag.
///
/// Every clone observes the same flag. Setting it is irreversible; both the
/// producing thread and the consuming iterator notice within one poll
/// interval.
///
/// ```
/// use lookahead_pool::StopHandle;
///
/// let handle = StopHandle::new();
/// let remote = handle.clone();
/// assert!(remote.stop());
/// assert!(!handle.stop());
/// assert!(handle.is_stopped());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Create a fresh, unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Returns `true` if this call performed the transition.
    pub fn stop(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
