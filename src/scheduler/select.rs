//! Selector for choosing which pending task runs next.
//!
//! The selector is a pure function of the pending records, the set of tags
//! currently executing, and the clock reading. It decides based on:
//! - Timing class (immediate records always beat timed ones)
//! - Serial tags (records whose tag is running are not candidates at all)
//! - Deadlines (timed records are ready one clock reading after they fall due)
//! - Sequence (ties go to the record created first)

use std::collections::HashSet;
use std::time::Duration;

use crate::task::{Tag, TaskRecord};

/// What a worker should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Run the record at this position in the pending slice.
    Ready(usize),
    /// Nothing is ready; the earliest timed candidate is due after this long.
    WaitUntil(Duration),
    /// No candidates: nothing pending, or every record is tag-blocked.
    Idle,
}

/// Pick the next record to run.
///
/// Eligible immediate records win outright, earliest sequence first. Failing
/// that, the earliest-sequence timed record whose wait has elapsed is chosen.
/// Otherwise the shortest remaining wait is reported so the caller can sleep
/// and poll again; a better candidate may have been submitted by then.
pub fn select(pending: &[TaskRecord], running_tags: &HashSet<Tag>, now_ms: u64) -> Selection {
    let mut immediate: Option<(usize, u64)> = None;
    let mut due: Option<(usize, u64)> = None;
    let mut min_wait: Option<u64> = None;

    for (index, record) in pending.iter().enumerate() {
        if record.tag().is_some_and(|tag| running_tags.contains(&tag)) {
            continue;
        }

        let sequence = record.sequence();
        if record.timing().is_immediate() {
            if immediate.is_none_or(|(_, best)| sequence < best) {
                immediate = Some((index, sequence));
            }
            continue;
        }

        match record.remaining_ms(now_ms) {
            0 => {
                if due.is_none_or(|(_, best)| sequence < best) {
                    due = Some((index, sequence));
                }
            }
            wait => min_wait = Some(min_wait.map_or(wait, |current| current.min(wait))),
        }
    }

    if let Some((index, _)) = immediate.or(due) {
        return Selection::Ready(index);
    }

    match min_wait {
        Some(ms) => Selection::WaitUntil(Duration::from_millis(ms)),
        None => Selection::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Payload, Timing};

    fn record(timing: Timing, tag: Option<u32>, stamp_ms: u64, sequence: u64) -> TaskRecord {
        TaskRecord::new(timing, tag.map(Tag), stamp_ms, sequence, Payload::once_detached(|| ()))
    }

    fn immediate(tag: Option<u32>, sequence: u64) -> TaskRecord {
        record(Timing::Immediate, tag, 0, sequence)
    }

    fn after(delay_ms: u64, stamp_ms: u64, sequence: u64) -> TaskRecord {
        record(Timing::After { delay_ms }, None, stamp_ms, sequence)
    }

    fn periodic(period_ms: u64, stamp_ms: u64, sequence: u64) -> TaskRecord {
        record(Timing::Periodic { period_ms }, None, stamp_ms, sequence)
    }

    fn tags(values: &[u32]) -> HashSet<Tag> {
        values.iter().copied().map(Tag).collect()
    }

    #[test]
    fn test_select_empty_is_idle() {
        assert_eq!(select(&[], &HashSet::new(), 0), Selection::Idle);
    }

    #[test]
    fn test_select_single_immediate() {
        let pending = vec![immediate(None, 1)];
        assert_eq!(select(&pending, &HashSet::new(), 0), Selection::Ready(0));
    }

    #[test]
    fn test_select_immediate_by_sequence() {
        let pending = vec![immediate(None, 7), immediate(None, 3), immediate(None, 5)];
        assert_eq!(select(&pending, &HashSet::new(), 0), Selection::Ready(1));
    }

    #[test]
    fn test_select_immediate_beats_overdue_timed() {
        // The timed record is long overdue and older, the immediate still wins
        let pending = vec![after(10, 0, 1), periodic(10, 0, 2), immediate(None, 3)];
        assert_eq!(select(&pending, &HashSet::new(), 10_000), Selection::Ready(2));
    }

    #[test]
    fn test_select_skips_blocked_immediate() {
        let pending = vec![immediate(Some(1), 1), immediate(Some(2), 2)];
        assert_eq!(select(&pending, &tags(&[1]), 0), Selection::Ready(1));
    }

    #[test]
    fn test_select_all_blocked_is_idle() {
        let pending = vec![immediate(Some(1), 1), immediate(Some(1), 2)];
        assert_eq!(select(&pending, &tags(&[1]), 0), Selection::Idle);
    }

    #[test]
    fn test_select_blocked_immediate_falls_back_to_timed() {
        let pending = vec![immediate(Some(4), 1), after(100, 0, 2)];
        assert_eq!(select(&pending, &tags(&[4]), 30), Selection::WaitUntil(Duration::from_millis(71)));
        assert_eq!(select(&pending, &tags(&[4]), 101), Selection::Ready(1));
    }

    #[test]
    fn test_select_untagged_ignores_running_tags() {
        let pending = vec![immediate(None, 1)];
        assert_eq!(select(&pending, &tags(&[1, 2, 3]), 0), Selection::Ready(0));
    }

    #[test]
    fn test_select_waits_for_earliest_deadline() {
        let pending = vec![after(500, 0, 1), periodic(50, 20, 2), after(200, 0, 3)];
        assert_eq!(select(&pending, &HashSet::new(), 10), Selection::WaitUntil(Duration::from_millis(61)));
    }

    #[test]
    fn test_select_due_timed_record() {
        let pending = vec![after(500, 0, 1), after(100, 0, 2)];
        assert_eq!(select(&pending, &HashSet::new(), 150), Selection::Ready(1));
    }

    #[test]
    fn test_select_due_ties_go_to_lowest_sequence() {
        let pending = vec![after(10, 0, 9), periodic(10, 0, 4), after(5, 0, 6)];
        assert_eq!(select(&pending, &HashSet::new(), 100), Selection::Ready(1));
    }

    #[test]
    fn test_select_due_beats_not_yet_due_with_lower_sequence() {
        let pending = vec![after(1_000, 0, 1), after(10, 0, 2)];
        assert_eq!(select(&pending, &HashSet::new(), 11), Selection::Ready(1));
    }

    #[test]
    fn test_select_timed_waits_one_reading_past_due() {
        let pending = vec![after(10, 0, 1)];
        assert_eq!(select(&pending, &HashSet::new(), 10), Selection::WaitUntil(Duration::from_millis(1)));
        assert_eq!(select(&pending, &HashSet::new(), 11), Selection::Ready(0));
    }

    #[test]
    fn test_select_excludes_blocked_timed_even_when_due() {
        let pending = vec![
            record(Timing::After { delay_ms: 0 }, Some(8), 0, 1),
            after(40, 0, 2),
        ];
        assert_eq!(select(&pending, &tags(&[8]), 10), Selection::WaitUntil(Duration::from_millis(31)));
    }

    #[test]
    fn test_select_zero_delay_is_ready_immediately() {
        let pending = vec![after(0, 25, 1)];
        assert_eq!(select(&pending, &HashSet::new(), 25), Selection::Ready(0));
    }

    #[test]
    fn test_select_clock_behind_stamp_still_waits() {
        // A stamp later than `now` must not underflow
        let pending = vec![periodic(50, 1_000, 1)];
        assert_eq!(select(&pending, &HashSet::new(), 900), Selection::WaitUntil(Duration::from_millis(151)));
    }
}
