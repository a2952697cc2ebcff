/// Process-wide send counters for the dispatcher.
///
/// Mutated concurrently by every sender task and read by the periodic
/// reporter. Uses atomics exclusively so snapshot reads never stall the hot
/// path — no Mutex, no locking.

use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct Stats {
    total: AtomicU64,
    success: AtomicU64,
    failed: AtomicU64,
    latency_ms: AtomicU64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, latency_ms: u64) {
        self.latency_ms.fetch_add(latency_ms, Relaxed);
        self.success.fetch_add(1, Relaxed);
        self.total.fetch_add(1, Relaxed);
    }

    pub fn record_failure(&self, latency_ms: u64) {
        self.latency_ms.fetch_add(latency_ms, Relaxed);
        self.failed.fetch_add(1, Relaxed);
        self.total.fetch_add(1, Relaxed);
    }

    /// Advisory read of all counters. Individual loads are not a consistent
    /// cut across concurrent writers, which is fine for progress reporting.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Relaxed),
            success: self.success.load(Relaxed),
            failed: self.failed.load(Relaxed),
            cumulative_latency_ms: self.latency_ms.load(Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub cumulative_latency_ms: u64,
}

impl StatsSnapshot {
    pub fn avg_latency_ms(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            self.cumulative_latency_ms / self.total
        }
    }

    pub fn requests_per_second(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            0.0
        } else {
            self.total as f64 / secs
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.success as f64 / self.total as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_total_equals_success_plus_failed() {
        let stats = Stats::new();
        stats.record_success(10);
        stats.record_success(20);
        stats.record_failure(30);

        let snap = stats.snapshot();
        assert_eq!(snap.total, 3);
        assert_eq!(snap.success, 2);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.total, snap.success + snap.failed);
        assert_eq!(snap.cumulative_latency_ms, 60);
        assert_eq!(snap.avg_latency_ms(), 20);
    }

    #[test]
    fn test_empty_snapshot_guards_divide_by_zero() {
        let snap = Stats::new().snapshot();
        assert_eq!(snap.avg_latency_ms(), 0);
        assert_eq!(snap.success_rate(), 0.0);
        assert_eq!(snap.requests_per_second(Duration::from_secs(0)), 0.0);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let stats = Arc::new(Stats::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let stats = Arc::clone(&stats);
            handles.push(std::thread::spawn(move || {
                for i in 0..1_000 {
                    if i % 2 == 0 {
                        stats.record_success(1);
                    } else {
                        stats.record_failure(1);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let snap = stats.snapshot();
        assert_eq!(snap.total, 8_000);
        assert_eq!(snap.success, 4_000);
        assert_eq!(snap.failed, 4_000);
        assert_eq!(snap.cumulative_latency_ms, 8_000);
    }
}
