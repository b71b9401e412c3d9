//! Canned workloads for the `demo` command.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use eyre::{Context, Result};
use log::info;
use taskpool::{PoolConfig, PoolStats, ThreadPool};

use crate::cli::commands::Scenario;

/// Timestamped events recorded by demo tasks.
#[derive(Clone)]
pub struct Timeline {
    start: Instant,
    events: Arc<Mutex<Vec<(u64, String)>>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn record(&self, event: impl Into<String>) {
        let at = self.start.elapsed().as_millis() as u64;
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((at, event.into()));
    }

    /// Events in the order they were recorded.
    pub fn events(&self) -> Vec<(u64, String)> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// What a finished demo run produced.
pub struct DemoReport {
    pub events: Vec<(u64, String)>,
    pub stats: PoolStats,
}

/// Start a pool, submit the scenario's tasks, let it run, then shut it down.
pub fn run(scenario: Scenario, duration: Duration, config: PoolConfig) -> Result<DemoReport> {
    info!("Running {:?} demo for {:?} with {} workers", scenario, duration, config.worker_threads);

    let mut pool = ThreadPool::with_config(config).context("Failed to start thread pool")?;
    let timeline = Timeline::new();

    match scenario {
        Scenario::Mixed => submit_mixed(&pool, &timeline)?,
        Scenario::Serial => submit_serial(&pool, &timeline),
        Scenario::Periodic => submit_periodic(&pool, &timeline)?,
    }

    thread::sleep(duration);
    pool.shutdown();
    timeline.record("pool shut down");

    Ok(DemoReport {
        events: timeline.events(),
        stats: pool.stats(),
    })
}

fn submit_mixed(pool: &ThreadPool, timeline: &Timeline) -> Result<()> {
    let t = timeline.clone();
    let _ = pool.execute_after(Duration::from_millis(100), move || t.record("after 100ms"));

    let t = timeline.clone();
    let mut fired = 0;
    pool.execute_periodic(Duration::from_millis(50), move || {
        fired += 1;
        t.record(format!("periodic 50ms, firing {}", fired));
    })
    .context("Failed to submit periodic task")?;

    for i in 0..3 {
        let t = timeline.clone();
        let _ = pool.execute(move || t.record(format!("immediate {}", i)));
    }

    for name in ["serial A", "serial B"] {
        let t = timeline.clone();
        let _ = pool.execute_serial(1, move || {
            t.record(format!("{} start", name));
            thread::sleep(Duration::from_millis(30));
            t.record(format!("{} end", name));
        });
    }

    Ok(())
}

fn submit_serial(pool: &ThreadPool, timeline: &Timeline) {
    let t = timeline.clone();
    let _ = pool.execute_serial(1, move || {
        t.record("slow start");
        thread::sleep(Duration::from_millis(100));
        t.record("slow end");
    });

    let t = timeline.clone();
    let _ = pool.execute_serial(1, move || t.record("fast (same tag)"));

    let t = timeline.clone();
    let _ = pool.execute_serial(2, move || t.record("other tag"));
}

fn submit_periodic(pool: &ThreadPool, timeline: &Timeline) -> Result<()> {
    let t = timeline.clone();
    let mut fired = 0;
    pool.execute_periodic(Duration::from_millis(50), move || {
        fired += 1;
        t.record(format!("tick {}", fired));
    })
    .context("Failed to submit periodic task")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(workers: usize) -> PoolConfig {
        PoolConfig::default()
            .with_worker_threads(workers)
            .with_idle_wait(Duration::from_millis(100))
    }

    #[test]
    fn test_timeline_records_in_order() {
        let timeline = Timeline::new();
        timeline.record("first");
        timeline.record("second");
        let events = timeline.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].1, "first");
        assert!(events[0].0 <= events[1].0);
    }

    #[test]
    fn test_serial_demo_orders_same_tag() {
        let report = run(Scenario::Serial, Duration::from_millis(250), config(2)).unwrap();
        let names: Vec<&str> = report.events.iter().map(|(_, e)| e.as_str()).collect();
        let slow_end = names.iter().position(|e| *e == "slow end").unwrap();
        let fast = names.iter().position(|e| *e == "fast (same tag)").unwrap();
        assert!(slow_end < fast);
        assert_eq!(report.stats.completed, 3);
    }

    #[test]
    fn test_periodic_demo_ticks() {
        let report = run(Scenario::Periodic, Duration::from_millis(300), config(1)).unwrap();
        let ticks = report.events.iter().filter(|(_, e)| e.starts_with("tick")).count();
        assert!(ticks >= 3, "only {} ticks", ticks);
    }
}
