//! Configuration models for producers and pools.

pub mod pool;
pub mod producer;
pub mod toolkit;

pub use pool::{PoolConfig, DEFAULT_POOL_LIMIT};
pub use producer::{
    ProducerConfig, DEFAULT_POLL_INTERVAL_MS, DEFAULT_QUEUE_CAPACITY, DEFAULT_THREAD_NAME,
};
pub use toolkit::ToolkitConfig;
