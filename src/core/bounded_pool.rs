//! Thread pool that caps how many admitted units run at once.
//!
//! Units are plain OS threads. Admitting a unit starts it immediately if the
//! pool has a free slot; otherwise the caller blocks until one of the running
//! units completes.
//!
//! # Design
//!
//! - **No polling**: blocked admitters wait on a `Condvar` that every
//!   completing unit notifies
//! - **Single critical section**: pruning, the capacity check and
//!   registration all happen under one registry lock
//! - **Run to completion**: the pool throttles admission only; there is no
//!   way to cancel a unit once it started
//!
//! # Example
//!
//! ```
//! use lookahead_pool::{BoundedPool, WorkUnit};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let pool = BoundedPool::new(4)?;
//! let done = Arc::new(AtomicUsize::new(0));
//! for _ in 0..10 {
//!     let done = Arc::clone(&done);
//!     pool.admit(WorkUnit::new(move || {
//!         done.fetch_add(1, Ordering::SeqCst);
//!     }))?;
//! }
//! pool.wait_idle();
//! assert_eq!(done.load(Ordering::SeqCst), 10);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::config::PoolConfig;

use super::{ConfigError, PoolError};

type UnitBody = Box<dyn FnOnce() + Send + 'static>;

/// Identifier assigned to a unit at admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u64);

impl UnitId {
    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// An execution unit that has not been started yet.
///
/// The body sits behind a mutex only so rejected units can travel inside
/// [`PoolError`] while keeping the error `Send + Sync`.
pub struct WorkUnit {
    name: Option<String>,
    stack_size: Option<usize>,
    body: Mutex<Option<UnitBody>>,
}

impl WorkUnit {
    /// Unit running `body` on its own thread.
    pub fn new<F>(body: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            name: None,
            stack_size: None,
            body: Mutex::new(Some(Box::new(body))),
        }
    }

    /// A handle with nothing to run. Pools refuse to admit it.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            name: None,
            stack_size: None,
            body: Mutex::new(None),
        }
    }

    /// Name the unit's thread.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Request a specific stack size in bytes for the unit's thread.
    #[must_use]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Thread name, if one was set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the unit carries a body to run.
    #[must_use]
    pub fn is_runnable(&self) -> bool {
        self.body.lock().is_some()
    }

    fn validate(&self) -> Result<(), PoolError> {
        if !self.is_runnable() {
            return Err(PoolError::InvalidUnit("unit has no body to run".into()));
        }
        if let Some(name) = &self.name {
            if name.contains('\0') {
                return Err(PoolError::InvalidUnit(format!(
                    "thread name {name:?} contains a NUL byte"
                )));
            }
        }
        if self.stack_size == Some(0) {
            return Err(PoolError::InvalidUnit("stack size must be greater than 0".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkUnit")
            .field("name", &self.name)
            .field("stack_size", &self.stack_size)
            .field("runnable", &self.is_runnable())
            .finish()
    }
}

/// A started unit tracked by the pool.
struct TrackedUnit {
    id: UnitId,
    name: Option<String>,
    done: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl TrackedUnit {
    fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

/// State shared between the pool and its running units.
struct Shared {
    registry: Mutex<Vec<TrackedUnit>>,
    slot_freed: Condvar,
}

/// Marks a unit complete when its thread leaves the body, even by panic.
struct CompletionGuard {
    done: Arc<AtomicBool>,
    shared: Arc<Shared>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.done.store(true, Ordering::Release);
        // Take the lock so a waiter between its check and its wait cannot
        // miss the notification.
        let _registry = self.shared.registry.lock();
        self.shared.slot_freed.notify_all();
    }
}

/// Pool limiting the number of simultaneously running execution units.
///
/// `admit` may be called concurrently from any number of threads. No
/// ordering is guaranteed among blocked admitters; a freed slot goes to one
/// of them.
pub struct BoundedPool {
    limit: usize,
    shared: Arc<Shared>,
    next_id: AtomicU64,
}

impl BoundedPool {
    /// Create a pool allowing at most `limit` running units.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLimit`] if `limit` is zero.
    pub fn new(limit: usize) -> Result<Self, ConfigError> {
        Self::from_config(&PoolConfig::with_limit(limit))
    }

    /// Create a pool from configuration.
    ///
    /// # Errors
    ///
    /// Returns the configuration's validation error.
    pub fn from_config(config: &PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(limit = config.limit, "BoundedPool initialized");
        Ok(Self::with_valid_limit(config.limit))
    }

    fn with_valid_limit(limit: usize) -> Self {
        Self {
            limit,
            shared: Arc::new(Shared {
                registry: Mutex::new(Vec::new()),
                slot_freed: Condvar::new(),
            }),
            next_id: AtomicU64::new(0),
        }
    }

    /// Maximum number of concurrently running units.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Number of admitted units still running.
    ///
    /// Completed units are dropped from the registry as a side effect; this
    /// is the only place slots are reclaimed.
    pub fn active_count(&self) -> usize {
        let (live, finished) = {
            let mut registry = self.shared.registry.lock();
            let finished = prune(&mut registry);
            (registry.len(), finished)
        };
        reap(finished);
        live
    }

    /// Admit a unit, blocking while the pool is at capacity, then start it.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidUnit`] if the unit cannot run; the pool is left
    ///   untouched
    /// - [`PoolError::Spawn`] if the thread could not be started
    pub fn admit(&self, unit: WorkUnit) -> Result<UnitId, PoolError> {
        unit.validate()?;

        let mut registry = self.shared.registry.lock();
        let mut finished = prune(&mut registry);
        while registry.len() >= self.limit {
            debug!(limit = self.limit, "pool at capacity, waiting for a free slot");
            self.shared.slot_freed.wait(&mut registry);
            finished.extend(prune(&mut registry));
        }
        let admitted = self.start(&mut registry, unit);
        drop(registry);

        reap(finished);
        admitted
    }

    /// Admit a unit only if a slot is free right now.
    ///
    /// # Errors
    ///
    /// [`PoolError::AtCapacity`] hands the unit back when the pool is full;
    /// otherwise as [`BoundedPool::admit`].
    pub fn try_admit(&self, unit: WorkUnit) -> Result<UnitId, PoolError> {
        unit.validate()?;

        let mut registry = self.shared.registry.lock();
        let finished = prune(&mut registry);
        let admitted = if registry.len() >= self.limit {
            Err(PoolError::AtCapacity {
                limit: self.limit,
                unit,
            })
        } else {
            self.start(&mut registry, unit)
        };
        drop(registry);

        reap(finished);
        admitted
    }

    /// Admit a unit, waiting at most `timeout` for a free slot.
    ///
    /// # Errors
    ///
    /// [`PoolError::Timeout`] hands the unit back when no slot freed in
    /// time; otherwise as [`BoundedPool::admit`].
    pub fn admit_timeout(&self, unit: WorkUnit, timeout: Duration) -> Result<UnitId, PoolError> {
        unit.validate()?;
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            // Too far in the future to represent; wait without a deadline.
            return self.admit(unit);
        };

        let mut registry = self.shared.registry.lock();
        let mut finished = prune(&mut registry);
        let mut timed_out = false;
        while registry.len() >= self.limit {
            if timed_out {
                drop(registry);
                reap(finished);
                return Err(PoolError::Timeout {
                    waited: timeout,
                    unit,
                });
            }
            timed_out = self
                .shared
                .slot_freed
                .wait_until(&mut registry, deadline)
                .timed_out();
            finished.extend(prune(&mut registry));
        }
        let admitted = self.start(&mut registry, unit);
        drop(registry);

        reap(finished);
        admitted
    }

    /// Block until every admitted unit has completed.
    pub fn wait_idle(&self) {
        let mut registry = self.shared.registry.lock();
        let mut finished = prune(&mut registry);
        while !registry.is_empty() {
            self.shared.slot_freed.wait(&mut registry);
            finished.extend(prune(&mut registry));
        }
        drop(registry);
        reap(finished);
    }

    /// Admit a unit from async code.
    ///
    /// The blocking wait runs on tokio's blocking thread pool so the calling
    /// runtime keeps making progress.
    ///
    /// # Errors
    ///
    /// As [`BoundedPool::admit`], plus [`PoolError::Join`] if the blocking
    /// task was cancelled or panicked.
    #[cfg(feature = "tokio-runtime")]
    pub async fn admit_async(self: &Arc<Self>, unit: WorkUnit) -> Result<UnitId, PoolError> {
        let pool = Arc::clone(self);
        tokio::task::spawn_blocking(move || pool.admit(unit))
            .await
            .map_err(|e| PoolError::Join(e.to_string()))?
    }

    /// Register and start a unit. Called with the registry locked and a free
    /// slot available.
    fn start(
        &self,
        registry: &mut MutexGuard<'_, Vec<TrackedUnit>>,
        unit: WorkUnit,
    ) -> Result<UnitId, PoolError> {
        let WorkUnit {
            name,
            stack_size,
            body,
        } = unit;
        let Some(body) = body.into_inner() else {
            return Err(PoolError::InvalidUnit("unit has no body to run".into()));
        };

        let id = UnitId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let done = Arc::new(AtomicBool::new(false));
        let unit_done = Arc::clone(&done);
        let shared = Arc::clone(&self.shared);

        let mut builder = thread::Builder::new();
        if let Some(name) = &name {
            builder = builder.name(name.clone());
        }
        if let Some(bytes) = stack_size {
            builder = builder.stack_size(bytes);
        }

        let handle = builder
            .spawn(move || {
                // Built on the unit's thread: dropping it takes the registry
                // lock, which the admitting thread holds until we return.
                let _guard = CompletionGuard {
                    done: unit_done,
                    shared,
                };
                body();
            })
            .map_err(PoolError::Spawn)?;

        debug!(unit_id = %id, name = ?name, active = registry.len() + 1, "unit admitted");
        registry.push(TrackedUnit {
            id,
            name,
            done,
            handle,
        });
        Ok(id)
    }
}

impl Default for BoundedPool {
    fn default() -> Self {
        Self::with_valid_limit(PoolConfig::default().limit)
    }
}

impl fmt::Debug for BoundedPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedPool")
            .field("limit", &self.limit)
            .field("tracked", &self.shared.registry.lock().len())
            .finish()
    }
}

/// Remove completed units from the registry, preserving admission order.
fn prune(registry: &mut Vec<TrackedUnit>) -> Vec<TrackedUnit> {
    let mut finished = Vec::new();
    let mut idx = 0;
    while idx < registry.len() {
        if registry[idx].is_done() {
            finished.push(registry.remove(idx));
        } else {
            idx += 1;
        }
    }
    finished
}

/// Join pruned units. Must be called without the registry lock held, since
/// a finishing unit takes that lock on its way out.
fn reap(finished: Vec<TrackedUnit>) {
    for unit in finished {
        if unit.handle.join().is_err() {
            warn!(unit_id = %unit.id, name = ?unit.name, "pool unit panicked");
        } else {
            debug!(unit_id = %unit.id, "pool unit completed");
        }
    }
}
