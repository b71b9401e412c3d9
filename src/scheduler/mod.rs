//! Scheduling engine.
//!
//! This module provides:
//! - **Selector**: pure decision function choosing the next task or the time
//!   until one becomes eligible.
//! - **Queue state**: pending records, running tags and the stopping flag,
//!   all behind one mutex.
//! - **Worker loop**: poll, sleep with early wake, run outside the lock,
//!   settle under the lock.
//! - **ThreadPool**: submission API and shutdown.
//!
//! # Architecture
//!
//! One `Mutex<QueueState>` paired with one `Condvar`:
//! 1. Submitters push a record and `notify_one`
//! 2. A worker asks the selector what to run; if nothing is ready it waits on
//!    the condvar for the reported time (or the idle heartbeat)
//! 3. Whatever woke it, the worker asks the selector again
//! 4. The claimed payload runs with the lock released
//! 5. The worker re-locks to release the tag and re-queue periodic records

mod pool;
mod queue;
mod select;
mod stats;
mod worker;

pub use pool::ThreadPool;
pub use select::{Selection, select};
pub use stats::PoolStats;
