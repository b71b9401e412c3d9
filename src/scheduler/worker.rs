//! Worker loop.
//!
//! Each pool thread runs [`run`]: poll the queue under the lock, sleep on the
//! condition variable when nothing is ready, run the claimed payload with the
//! lock released, then settle the run under the lock again.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::clock::Clock;
use crate::scheduler::queue::{Next, QueueState};
use crate::task::TaskRecord;

/// State shared by the pool handle and all of its workers.
pub(crate) struct Shared {
    state: Mutex<QueueState>,
    pub(crate) wake: Condvar,
    clock: Arc<dyn Clock>,
    idle_wait: Duration,
}

impl Shared {
    pub(crate) fn new(clock: Arc<dyn Clock>, idle_wait: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::new()),
            wake: Condvar::new(),
            clock,
            idle_wait,
        }
    }

    /// Lock the queue. Payloads never run under this lock, so a poisoned
    /// mutex still holds consistent state and is recovered.
    pub(crate) fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

/// Worker thread body. Returns once the pool is stopping.
pub(crate) fn run(shared: Arc<Shared>, index: usize) {
    debug!(worker = index, "Worker started");

    while let Some(record) = next_task(&shared) {
        let tag = record.tag();
        let sequence = record.sequence();
        trace!(worker = index, sequence, timing = %record.timing(), ?tag, "Running task");

        let (outcome, returned) = record.run();
        if let Err(message) = &outcome {
            warn!(worker = index, sequence, error = %message, "Task panicked");
        }

        let now = shared.now_ms();
        let settled = shared.lock().complete(tag, returned, &outcome, now);
        drop(settled.dropped);
        if settled.wake {
            shared.wake.notify_one();
        }
    }

    debug!(worker = index, "Worker stopped");
}

/// Block until a record is claimed or the pool stops.
///
/// Every wake, early or timed out, goes back through the selector: a more
/// urgent record may have arrived while this worker slept.
fn next_task(shared: &Shared) -> Option<TaskRecord> {
    let mut state = shared.lock();
    loop {
        let timeout = match state.poll(shared.now_ms()) {
            Next::Run(record) => return Some(record),
            Next::Stop => return None,
            Next::Wait(wait) => wait,
            Next::Idle => shared.idle_wait,
        };
        state = match shared.wake.wait_timeout(state, timeout) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, MonotonicClock};
    use crate::task::{Payload, Timing};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn shared_with(clock: Arc<dyn Clock>) -> Arc<Shared> {
        Arc::new(Shared::new(clock, Duration::from_millis(50)))
    }

    fn push(shared: &Shared, timing: Timing, payload: Payload) {
        let now = shared.now_ms();
        shared.lock().push(timing, None, now, payload).unwrap();
        shared.wake.notify_one();
    }

    fn stop(shared: &Shared) {
        shared.lock().begin_stop();
        shared.wake.notify_all();
    }

    #[test]
    fn test_worker_exits_on_stop() {
        let shared = shared_with(Arc::new(MonotonicClock::new()));
        stop(&shared);
        // Returns immediately because the queue is already stopping
        run(shared.clone(), 0);
    }

    #[test]
    fn test_worker_runs_submitted_task() {
        let shared = shared_with(Arc::new(MonotonicClock::new()));
        let worker = {
            let shared = shared.clone();
            thread::spawn(move || run(shared, 0))
        };

        let (payload, handle) = Payload::once(|| "ran");
        push(&shared, Timing::Immediate, payload);
        assert_eq!(handle.wait(), Ok("ran"));

        stop(&shared);
        worker.join().unwrap();
        assert_eq!(shared.lock().stats(1).completed, 1);
    }

    #[test]
    fn test_worker_waits_for_manual_clock() {
        let clock = Arc::new(ManualClock::new(0));
        let shared = shared_with(clock.clone());
        let count = Arc::new(AtomicUsize::new(0));
        let worker = {
            let shared = shared.clone();
            thread::spawn(move || run(shared, 0))
        };

        let c = count.clone();
        push(&shared, Timing::After { delay_ms: 1_000 }, Payload::once_detached(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        // Real time passes but the clock does not, so the task stays pending
        thread::sleep(Duration::from_millis(120));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // Exactly at the due reading the delay may not have fully elapsed
        clock.advance(1_000);
        shared.wake.notify_all();
        thread::sleep(Duration::from_millis(80));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        clock.advance(1);
        shared.wake.notify_all();
        for _ in 0..100 {
            if count.load(Ordering::SeqCst) == 1 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);

        stop(&shared);
        worker.join().unwrap();
    }

    #[test]
    fn test_worker_survives_panicking_task() {
        let shared = shared_with(Arc::new(MonotonicClock::new()));
        let worker = {
            let shared = shared.clone();
            thread::spawn(move || run(shared, 0))
        };

        let (bad, bad_handle) = Payload::once(|| -> u8 { panic!("worker must survive this") });
        let (good, good_handle) = Payload::once(|| 5u8);
        push(&shared, Timing::Immediate, bad);
        push(&shared, Timing::Immediate, good);

        assert!(bad_handle.wait().is_err());
        assert_eq!(good_handle.wait(), Ok(5));

        stop(&shared);
        worker.join().unwrap();
        let stats = shared.lock().stats(1);
        assert_eq!(stats.panicked, 1);
        assert_eq!(stats.completed, 1);
    }
}
