//! taskpool - a fixed-size worker pool with timed and serialized tasks
//!
//! Tasks run immediately, once after a delay, or periodically. Tasks that
//! share a serial tag never run at the same time; everything else runs in
//! parallel across the pool's threads.

pub mod clock;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod task;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::PoolConfig;
pub use error::{PoolError, Result, TaskError};
pub use scheduler::{PoolStats, ThreadPool};
pub use task::{ResultHandle, Tag, TaskRecord, Timing};
