//! Concurrency primitives: lookahead producer, bounded pool and chunking.

pub mod bounded_pool;
pub mod chunk;
pub mod error;
pub mod lookahead;
pub mod stop;

pub use bounded_pool::{BoundedPool, UnitId, WorkUnit};
pub use chunk::{chunk, ChunkExt, Chunks};
pub use error::{AppResult, ConfigError, PoolError, ProducerError};
pub use lookahead::{IntoIter, Iter, LookaheadProducer, ProducerState};
pub use stop::StopHandle;
