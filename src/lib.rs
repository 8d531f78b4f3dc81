//! # Lookahead Pool
//!
//! Small concurrency toolkit built from two independent primitives and a
//! batching helper.
//!
//! ## Key Features
//!
//! - **Lookahead producer**: runs a producing routine on a background thread
//!   and streams its results through a bounded queue, so production runs
//!   ahead of consumption without unbounded buffering
//! - **Bounded pool**: caps how many admitted threads run at once; admission
//!   blocks while the pool is full
//! - **Chunking**: splits any sequence into fixed-size batches, the usual way
//!   to size units of work before handing them to the pool
//!
//! ## LookaheadProducer
//!
//! ```rust
//! use lookahead_pool::{LookaheadProducer, ProducerConfig};
//!
//! let config = ProducerConfig::new().with_queue_capacity(2);
//! let mut producer = LookaheadProducer::with_config(|| (0..5).map(|i| i * i), config)?;
//! let squares: Vec<i32> = producer.iter().collect();
//! assert_eq!(squares, [0, 1, 4, 9, 16]);
//! assert!(producer.failure().is_none());
//! # Ok::<(), lookahead_pool::ConfigError>(())
//! ```
//!
//! A producer that is abandoned before its routine is exhausted keeps its
//! thread alive until [`LookaheadProducer::stop`] is called or the producer
//! is dropped.
//!
//! ## BoundedPool with chunked work
//!
//! ```rust
//! use lookahead_pool::{chunk, BoundedPool, WorkUnit};
//! use std::sync::{Arc, Mutex};
//!
//! let pool = BoundedPool::new(2)?;
//! let totals = Arc::new(Mutex::new(Vec::new()));
//! for batch in chunk(1..=10, 3)? {
//!     let totals = Arc::clone(&totals);
//!     pool.admit(WorkUnit::new(move || {
//!         totals.lock().unwrap().push(batch.iter().sum::<i32>());
//!     }))?;
//! }
//! pool.wait_idle();
//! assert_eq!(totals.lock().unwrap().iter().sum::<i32>(), 55);
//! # Ok::<(), lookahead_pool::AppError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Producer, pool and chunking primitives.
pub mod core;
/// Configuration models for producers and pools.
pub mod config;
/// Builders to construct producers from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;

pub use crate::builders::ProducerBuilder;
pub use crate::config::{PoolConfig, ProducerConfig, ToolkitConfig};
pub use crate::core::{
    chunk, AppResult, BoundedPool, ChunkExt, Chunks, ConfigError, LookaheadProducer, PoolError,
    ProducerError, ProducerState, StopHandle, UnitId, WorkUnit,
};

/// Catch-all error for application glue, see [`AppResult`].
pub type AppError = anyhow::Error;
