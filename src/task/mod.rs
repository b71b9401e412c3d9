//! Task types for taskpool
//!
//! - Timing: the three timing classes (immediate, after a delay, periodic)
//! - Tag: serial tag; tasks sharing one never run concurrently
//! - TaskRecord: one unit of schedulable work
//! - ResultHandle: caller-side view of a task's eventual result

pub mod handle;
mod payload;

pub use handle::ResultHandle;
pub(crate) use payload::{Outcome, Payload};

use std::fmt;

use serde::{Deserialize, Serialize};

/// When a task becomes eligible to run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Timing {
    /// As soon as a worker (and the task's tag, if any) is free
    Immediate,
    /// Once, no earlier than `delay_ms` after submission
    After { delay_ms: u64 },
    /// Repeatedly, `period_ms` after the end of the previous run
    Periodic { period_ms: u64 },
}

impl Timing {
    pub fn is_immediate(&self) -> bool {
        matches!(self, Self::Immediate)
    }

    pub fn is_periodic(&self) -> bool {
        matches!(self, Self::Periodic { .. })
    }

    /// Offset from the record's stamp to its eligibility time.
    pub fn offset_ms(&self) -> u64 {
        match self {
            Self::Immediate => 0,
            Self::After { delay_ms } => *delay_ms,
            Self::Periodic { period_ms } => *period_ms,
        }
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate => write!(f, "immediate"),
            Self::After { delay_ms } => write!(f, "after {}ms", delay_ms),
            Self::Periodic { period_ms } => write!(f, "every {}ms", period_ms),
        }
    }
}

/// Serial tag. At most one task carrying a given tag executes at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u32);

impl From<u32> for Tag {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A queued unit of work.
///
/// Records are moved by value: out of the pending queue into the worker that
/// runs them, and (for periodic tasks) back again afterwards.
pub struct TaskRecord {
    timing: Timing,
    tag: Option<Tag>,
    stamp_ms: u64,
    sequence: u64,
    payload: Payload,
}

impl TaskRecord {
    pub(crate) fn new(timing: Timing, tag: Option<Tag>, stamp_ms: u64, sequence: u64, payload: Payload) -> Self {
        Self {
            timing,
            tag,
            stamp_ms,
            sequence,
            payload,
        }
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn tag(&self) -> Option<Tag> {
        self.tag
    }

    /// Creation time, or end of the last run for periodic records.
    pub fn stamp_ms(&self) -> u64 {
        self.stamp_ms
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Stamp plus the timing offset.
    pub fn due_ms(&self) -> u64 {
        self.stamp_ms.saturating_add(self.timing.offset_ms())
    }

    /// First clock reading at which the record may start.
    ///
    /// Readings are whole milliseconds rounded down, so a timed record waits
    /// for one reading past `due_ms` before the full offset has surely elapsed.
    pub fn ready_at_ms(&self) -> u64 {
        match self.timing.offset_ms() {
            0 => self.stamp_ms,
            offset => self.stamp_ms.saturating_add(offset).saturating_add(1),
        }
    }

    /// Milliseconds left until the record may start; zero once it can.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.ready_at_ms().saturating_sub(now_ms)
    }

    pub(crate) fn restamp(&mut self, now_ms: u64) {
        self.stamp_ms = now_ms;
    }

    /// Run the payload. Periodic records come back for re-queueing.
    pub(crate) fn run(mut self) -> (Outcome, Option<TaskRecord>) {
        match self.payload {
            Payload::Once(job) => (job(), None),
            Payload::Repeat(mut job) => {
                let outcome = job();
                self.payload = Payload::Repeat(job);
                (outcome, Some(self))
            }
        }
    }
}

impl fmt::Debug for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRecord")
            .field("timing", &self.timing)
            .field("tag", &self.tag)
            .field("stamp_ms", &self.stamp_ms)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}
