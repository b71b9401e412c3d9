//! Pool counters.

use std::fmt;

/// Point-in-time snapshot of a pool's queue and counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Worker threads still attached to the pool; zero after shutdown.
    pub workers: usize,
    /// Records waiting in the queue (includes periodic records between firings).
    pub pending: usize,
    /// Payloads executing right now.
    pub running: usize,
    /// Records accepted into the queue.
    pub submitted: u64,
    /// Payload runs that returned normally. Each periodic firing counts once.
    pub completed: u64,
    /// Payload runs that panicked.
    pub panicked: u64,
    /// Submissions refused because the pool was shutting down.
    pub rejected: u64,
    /// Records dropped unrun at shutdown.
    pub discarded: u64,
}

impl PoolStats {
    /// Total payload runs, successful or not.
    pub fn executed(&self) -> u64 {
        self.completed + self.panicked
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "workers={} pending={} running={} submitted={} completed={} panicked={} rejected={} discarded={}",
            self.workers,
            self.pending,
            self.running,
            self.submitted,
            self.completed,
            self.panicked,
            self.rejected,
            self.discarded
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default_is_zeroed() {
        let stats = PoolStats::default();
        assert_eq!(stats.executed(), 0);
        assert_eq!(stats.pending, 0);
    }

    #[test]
    fn test_executed_counts_panics() {
        let stats = PoolStats {
            completed: 5,
            panicked: 2,
            ..Default::default()
        };
        assert_eq!(stats.executed(), 7);
    }

    #[test]
    fn test_stats_display() {
        let stats = PoolStats {
            workers: 4,
            submitted: 3,
            ..Default::default()
        };
        let text = stats.to_string();
        assert!(text.starts_with("workers=4"));
        assert!(text.contains("submitted=3"));
    }
}
