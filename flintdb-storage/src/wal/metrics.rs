//! Metrics collection for WAL operations.
//!
//! All fields use atomic operations so a [`WalManager`](crate::wal::WalManager)
//! can expose them without taking its own lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// WAL operation counters.
#[derive(Debug, Default)]
pub struct WalMetrics {
    records_appended: AtomicU64,
    bytes_appended: AtomicU64,
    compressed_records: AtomicU64,

    commits_total: AtomicU64,
    rollbacks_total: AtomicU64,
    checkpoints_total: AtomicU64,

    flushes_total: AtomicU64,
    fsyncs_total: AtomicU64,
    fsync_duration_ms: AtomicU64,

    recovered_transactions: AtomicU64,
    recovered_operations: AtomicU64,
}

impl WalMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_append(&self, size: u64, compressed: bool) {
        self.records_appended.fetch_add(1, Ordering::Relaxed);
        self.bytes_appended.fetch_add(size, Ordering::Relaxed);
        if compressed {
            self.compressed_records.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_commit(&self) {
        self.commits_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rollback(&self) {
        self.rollbacks_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_checkpoint(&self) {
        self.checkpoints_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flush(&self) {
        self.flushes_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fsync(&self, duration_ms: u64) {
        self.fsyncs_total.fetch_add(1, Ordering::Relaxed);
        self.fsync_duration_ms.fetch_add(duration_ms, Ordering::Relaxed);
    }

    pub fn record_recovery(&self, transactions: u64, operations: u64) {
        self.recovered_transactions.fetch_add(transactions, Ordering::Relaxed);
        self.recovered_operations.fetch_add(operations, Ordering::Relaxed);
    }

    pub fn records_appended(&self) -> u64 {
        self.records_appended.load(Ordering::Relaxed)
    }

    pub fn bytes_appended(&self) -> u64 {
        self.bytes_appended.load(Ordering::Relaxed)
    }

    pub fn compressed_records(&self) -> u64 {
        self.compressed_records.load(Ordering::Relaxed)
    }

    pub fn commits_total(&self) -> u64 {
        self.commits_total.load(Ordering::Relaxed)
    }

    pub fn rollbacks_total(&self) -> u64 {
        self.rollbacks_total.load(Ordering::Relaxed)
    }

    pub fn checkpoints_total(&self) -> u64 {
        self.checkpoints_total.load(Ordering::Relaxed)
    }

    pub fn flushes_total(&self) -> u64 {
        self.flushes_total.load(Ordering::Relaxed)
    }

    pub fn fsyncs_total(&self) -> u64 {
        self.fsyncs_total.load(Ordering::Relaxed)
    }

    pub fn avg_fsync_duration_ms(&self) -> f64 {
        let total = self.fsync_duration_ms.load(Ordering::Relaxed);
        let count = self.fsyncs_total.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    pub fn recovered_transactions(&self) -> u64 {
        self.recovered_transactions.load(Ordering::Relaxed)
    }

    pub fn recovered_operations(&self) -> u64 {
        self.recovered_operations.load(Ordering::Relaxed)
    }
}

/// Helper for timing an operation and feeding the result into [`WalMetrics`].
pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn complete(self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_append_tracks_compression() {
        let metrics = WalMetrics::new();
        metrics.record_append(100, false);
        metrics.record_append(50, true);

        assert_eq!(metrics.records_appended(), 2);
        assert_eq!(metrics.bytes_appended(), 150);
        assert_eq!(metrics.compressed_records(), 1);
    }

    #[test]
    fn fsync_duration_averages_correctly() {
        let metrics = WalMetrics::new();
        metrics.record_fsync(10);
        metrics.record_fsync(20);
        metrics.record_fsync(30);

        assert_eq!(metrics.fsyncs_total(), 3);
        assert_eq!(metrics.avg_fsync_duration_ms(), 20.0);
    }

    #[test]
    fn commit_rollback_checkpoint_counters() {
        let metrics = WalMetrics::new();
        metrics.record_commit();
        metrics.record_commit();
        metrics.record_rollback();
        metrics.record_checkpoint();

        assert_eq!(metrics.commits_total(), 2);
        assert_eq!(metrics.rollbacks_total(), 1);
        assert_eq!(metrics.checkpoints_total(), 1);
    }

    #[test]
    fn timed_operation_measures_elapsed_time() {
        let timer = TimedOperation::start();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(timer.complete() >= 5);
    }
}
