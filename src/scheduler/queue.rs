//! Shared queue state.
//!
//! Everything workers and submitters share lives in one [`QueueState`]
//! guarded by a single mutex: the pending records, the tags currently
//! executing, the stopping flag and the counters.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{PoolError, Result};
use crate::scheduler::select::{Selection, select};
use crate::scheduler::stats::PoolStats;
use crate::task::{Outcome, Payload, Tag, TaskRecord, Timing};

/// Result of a worker's poll.
#[derive(Debug)]
pub(crate) enum Next {
    /// Run this record. Its tag has already been marked running.
    Run(TaskRecord),
    /// Sleep up to this long, then poll again.
    Wait(Duration),
    /// Nothing to do until something is submitted or a tag frees up.
    Idle,
    /// The pool is shutting down.
    Stop,
}

/// What settling a finished run left for the worker to do.
#[derive(Debug)]
pub(crate) struct Settled {
    /// A waiting worker may now find something to do.
    pub(crate) wake: bool,
    /// Periodic record refused because the pool is stopping. Drop it unlocked.
    pub(crate) dropped: Option<TaskRecord>,
}

#[derive(Debug, Default)]
pub(crate) struct QueueState {
    pending: Vec<TaskRecord>,
    running_tags: HashSet<Tag>,
    running: usize,
    stopping: bool,
    next_sequence: u64,
    stats: PoolStats,
}

impl QueueState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Enqueue a new record stamped at `now_ms`, returning its sequence.
    ///
    /// Refused once shutdown has begun; the payload is dropped unrun.
    pub(crate) fn push(&mut self, timing: Timing, tag: Option<Tag>, now_ms: u64, payload: Payload) -> Result<u64> {
        if self.stopping {
            self.stats.rejected += 1;
            return Err(PoolError::ShutDown);
        }

        self.next_sequence += 1;
        let sequence = self.next_sequence;
        self.pending.push(TaskRecord::new(timing, tag, now_ms, sequence, payload));
        self.stats.submitted += 1;
        trace!(sequence, %timing, ?tag, pending = self.pending.len(), "Task enqueued");
        Ok(sequence)
    }

    /// Ask the selector what to do and, if a record is ready, claim it.
    pub(crate) fn poll(&mut self, now_ms: u64) -> Next {
        if self.stopping {
            return Next::Stop;
        }

        match select(&self.pending, &self.running_tags, now_ms) {
            Selection::Ready(index) => {
                let record = self.pending.swap_remove(index);
                if let Some(tag) = record.tag() {
                    self.running_tags.insert(tag);
                }
                self.running += 1;
                Next::Run(record)
            }
            Selection::WaitUntil(wait) => Next::Wait(wait),
            Selection::Idle => Next::Idle,
        }
    }

    /// Settle a finished run.
    ///
    /// Releases the tag and puts a periodic record back with a fresh stamp.
    /// Once the pool is stopping the record is handed back instead, since its
    /// payload may own the last pool handle and must not drop under the lock.
    pub(crate) fn complete(&mut self, tag: Option<Tag>, returned: Option<TaskRecord>, outcome: &Outcome, now_ms: u64) -> Settled {
        self.running = self.running.saturating_sub(1);
        match outcome {
            Ok(()) => self.stats.completed += 1,
            Err(_) => self.stats.panicked += 1,
        }

        let released = tag.is_some_and(|tag| self.running_tags.remove(&tag));

        let (requeued, dropped) = match returned {
            Some(mut record) if !self.stopping => {
                record.restamp(now_ms);
                self.pending.push(record);
                (true, None)
            }
            Some(record) => {
                debug!(sequence = record.sequence(), "Dropping periodic task, pool is stopping");
                (false, Some(record))
            }
            None => (false, None),
        };

        Settled {
            wake: requeued || (released && !self.pending.is_empty()),
            dropped,
        }
    }

    /// Flip the stopping flag. Returns false if it was already set.
    pub(crate) fn begin_stop(&mut self) -> bool {
        !std::mem::replace(&mut self.stopping, true)
    }

    pub(crate) fn is_stopping(&self) -> bool {
        self.stopping
    }

    /// Remove every pending record.
    pub(crate) fn drain(&mut self) -> Vec<TaskRecord> {
        let drained: Vec<TaskRecord> = self.pending.drain(..).collect();
        self.stats.discarded += drained.len() as u64;
        drained
    }

    pub(crate) fn stats(&self, workers: usize) -> PoolStats {
        PoolStats {
            workers,
            pending: self.pending.len(),
            running: self.running,
            ..self.stats.clone()
        }
    }
}
