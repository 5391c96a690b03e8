// Plugin metrics module
//
// Lightweight counters for spawn checks, removals and commands

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Plugin activity counters
///
/// Uses atomic operations so the event bridge, command front and main-thread
/// jobs can all record without locks. Logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Slime spawn attempts the policy was consulted for
    pub spawns_checked: AtomicU64,

    /// Slime spawn attempts the policy cancelled
    pub spawns_prevented: AtomicU64,

    /// Total slimes removed by any operation
    pub slimes_removed: AtomicUsize,

    /// Worlds processed by bulk removal
    pub worlds_cleared: AtomicUsize,

    /// Removals that failed and were reported as zero
    pub removal_failures: AtomicU64,

    /// Commands dispatched through the command front
    pub commands_handled: AtomicU64,

    /// Plugin start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            spawns_checked: AtomicU64::new(0),
            spawns_prevented: AtomicU64::new(0),
            slimes_removed: AtomicUsize::new(0),
            worlds_cleared: AtomicUsize::new(0),
            removal_failures: AtomicU64::new(0),
            commands_handled: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one policy verdict
    pub fn record_spawn_check(&self, prevented: bool) {
        self.spawns_checked.fetch_add(1, Ordering::Relaxed);
        if prevented {
            self.spawns_prevented.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a completed removal in one world
    pub fn record_removal(&self, removed: usize) {
        self.worlds_cleared.fetch_add(1, Ordering::Relaxed);
        self.slimes_removed.fetch_add(removed, Ordering::Relaxed);
    }

    /// Record a removal that could not run
    pub fn record_removal_failure(&self) {
        self.removal_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a handled command
    pub fn record_command(&self) {
        self.commands_handled.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Share of checked spawns that were prevented, in percent
    pub fn prevention_rate(&self) -> f64 {
        let checked = self.spawns_checked.load(Ordering::Relaxed);
        let prevented = self.spawns_prevented.load(Ordering::Relaxed);
        if checked > 0 {
            prevented as f64 * 100.0 / checked as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Slime Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Spawns: {} checked, {} prevented ({:.1}%)",
            self.spawns_checked.load(Ordering::Relaxed),
            self.spawns_prevented.load(Ordering::Relaxed),
            self.prevention_rate()
        );
        tracing::info!(
            "Removals: {} slimes across {} world passes, {} failures",
            self.slimes_removed.load(Ordering::Relaxed),
            self.worlds_cleared.load(Ordering::Relaxed),
            self.removal_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Commands handled: {}",
            self.commands_handled.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
