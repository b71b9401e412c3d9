//! Thread pool: construction, task submission and shutdown.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::{Clock, MonotonicClock};
use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::scheduler::stats::PoolStats;
use crate::scheduler::worker::{self, Shared};
use crate::task::{Payload, ResultHandle, Tag, Timing};

/// A fixed set of worker threads running immediate, delayed and periodic tasks.
///
/// Tasks that share a [`Tag`] never run at the same time. Everything else runs
/// in parallel, up to the number of workers.
///
/// Dropping the pool shuts it down: workers finish the payload they are
/// running, then exit, and anything still queued is discarded.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use taskpool::ThreadPool;
///
/// let pool = ThreadPool::new(4)?;
/// let sum = pool.execute(|| 2 + 2);
/// let later = pool.execute_after(Duration::from_millis(100), || "later");
/// pool.execute_periodic(Duration::from_secs(1), || println!("tick"))?;
///
/// assert_eq!(sum.wait(), Ok(4));
/// assert_eq!(later.wait(), Ok("later"));
/// # Ok::<(), taskpool::PoolError>(())
/// ```
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    config: PoolConfig,
    shut_down: bool,
}

impl ThreadPool {
    /// Start a pool with `worker_threads` workers and default settings.
    pub fn new(worker_threads: usize) -> Result<Self> {
        Self::with_config(PoolConfig::default().with_worker_threads(worker_threads))
    }

    pub fn with_config(config: PoolConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// Start a pool that reads time from `clock`.
    ///
    /// Fails if the config is invalid or a worker thread cannot be spawned;
    /// workers started before the failure are stopped and joined first.
    pub fn with_clock(config: PoolConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        if config.worker_threads == 0 {
            warn!("Thread pool has no workers; submitted tasks will never run");
        }

        let mut pool = Self {
            shared: Arc::new(Shared::new(clock, config.idle_wait())),
            workers: Vec::with_capacity(config.worker_threads),
            config,
            shut_down: false,
        };

        for index in 0..pool.config.worker_threads {
            match pool.spawn_worker(index) {
                Ok(handle) => pool.workers.push(handle),
                Err(source) => {
                    pool.shutdown();
                    return Err(PoolError::Spawn { index, source });
                }
            }
        }

        info!(workers = pool.workers.len(), "Thread pool started");
        Ok(pool)
    }

    fn spawn_worker(&self, index: usize) -> std::io::Result<JoinHandle<()>> {
        let mut builder = thread::Builder::new().name(format!("{}-{}", self.config.thread_name, index));
        if let Some(kb) = self.config.stack_size_kb {
            builder = builder.stack_size(kb * 1024);
        }
        let shared = Arc::clone(&self.shared);
        builder.spawn(move || worker::run(shared, index))
    }

    /// Run `f` as soon as a worker is free.
    pub fn execute<F, T>(&self, f: F) -> ResultHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit(Timing::Immediate, None, f)
    }

    /// Run `f` as soon as a worker is free and no other task tagged `tag` is running.
    pub fn execute_serial<F, T>(&self, tag: u32, f: F) -> ResultHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit(Timing::Immediate, Some(Tag(tag)), f)
    }

    /// Run `f` once, no earlier than `delay` from now.
    pub fn execute_after<F, T>(&self, delay: Duration, f: F) -> ResultHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let delay_ms = duration_ms(delay);
        self.submit(Timing::After { delay_ms }, None, f)
    }

    /// Run `f` every `period`, measured from the end of one run to the start of the next.
    ///
    /// The first run happens one period after submission. The task repeats
    /// until the pool shuts down; a run that panics is logged and the task is
    /// scheduled again as usual. `period` must be at least one millisecond.
    pub fn execute_periodic<F>(&self, period: Duration, f: F) -> Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        let period_ms = duration_ms(period);
        if period_ms == 0 {
            return Err(PoolError::InvalidPeriod);
        }
        self.enqueue(Timing::Periodic { period_ms }, None, Payload::repeat(f))
            .map(|_| ())
    }

    fn submit<F, T>(&self, timing: Timing, tag: Option<Tag>, f: F) -> ResultHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (payload, handle) = Payload::once(f);
        match self.enqueue(timing, tag, payload) {
            Ok(_) => handle,
            Err(_) => ResultHandle::rejected(),
        }
    }

    fn enqueue(&self, timing: Timing, tag: Option<Tag>, payload: Payload) -> Result<u64> {
        let sequence = {
            let mut state = self.shared.lock();
            state.push(timing, tag, self.shared.now_ms(), payload)
        };
        match sequence {
            Ok(sequence) => {
                self.shared.wake.notify_one();
                Ok(sequence)
            }
            Err(e) => {
                debug!(%timing, "Rejected task submitted after shutdown");
                Err(e)
            }
        }
    }

    /// Stop all workers and discard queued tasks.
    ///
    /// Payloads already running are allowed to finish; periodic tasks are not
    /// rescheduled. Handles of discarded tasks resolve to
    /// [`TaskError::Discarded`](crate::TaskError::Discarded), and later
    /// submissions are rejected. Calling this again does nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.shared.lock().begin_stop();
        self.shared.wake.notify_all();

        let current = thread::current().id();
        for handle in self.workers.drain(..) {
            if handle.thread().id() == current {
                // Last owner dropped the pool from inside a task
                warn!("Shutdown called from a worker thread; not joining it");
                continue;
            }
            if handle.join().is_err() {
                warn!("Worker thread panicked");
            }
        }

        let discarded = self.shared.lock().drain();
        info!(discarded = discarded.len(), "Thread pool stopped");
    }

    /// True once [`shutdown`](Self::shutdown) has begun.
    pub fn is_shutdown(&self) -> bool {
        self.shut_down || self.shared.lock().is_stopping()
    }

    /// Number of worker threads still attached to the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Snapshot of the queue and counters. `workers` counts threads still
    /// attached, so it drops to zero after shutdown.
    pub fn stats(&self) -> PoolStats {
        self.shared.lock().stats(self.workers.len())
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
