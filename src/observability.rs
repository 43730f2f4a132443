//! Tracing setup and maintenance counters
//!
//! Background tasks have no caller to return errors to, so failures there are
//! logged and counted here. `/stats` exposes the counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, TelemetryConfig};

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. With
/// [`LogFormat::Off`] nothing is installed and all events are discarded.
pub fn init_tracing(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.log_format {
        LogFormat::Off => return,
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    if let Err(e) = result {
        // Already installed, e.g. by a test harness
        tracing::debug!(error = %e, "Tracing subscriber not installed");
    }
}

/// Counters for the request path and the maintenance tasks
#[derive(Debug, Default)]
pub struct Metrics {
    events_recorded: AtomicU64,
    record_failures: AtomicU64,
    events_pruned: AtomicU64,
    journal_flushes: AtomicU64,
    flush_failures: AtomicU64,
    snapshots_written: AtomicU64,
    snapshot_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_recorded(&self) {
        self.events_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.record_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "record_failures", "Metric incremented");
    }

    pub fn events_pruned(&self, count: usize) {
        self.events_pruned.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn journal_flushed(&self) {
        self.journal_flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn flush_failed(&self) {
        self.flush_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "flush_failures", "Metric incremented");
    }

    pub fn snapshot_written(&self) {
        self.snapshots_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot_failed(&self) {
        self.snapshot_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "snapshot_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_recorded: self.events_recorded.load(Ordering::Relaxed),
            record_failures: self.record_failures.load(Ordering::Relaxed),
            events_pruned: self.events_pruned.load(Ordering::Relaxed),
            journal_flushes: self.journal_flushes.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
            snapshots_written: self.snapshots_written.load(Ordering::Relaxed),
            snapshot_failures: self.snapshot_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub events_recorded: u64,
    pub record_failures: u64,
    pub events_pruned: u64,
    pub journal_flushes: u64,
    pub flush_failures: u64,
    pub snapshots_written: u64,
    pub snapshot_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = Metrics::new();
        metrics.event_recorded();
        metrics.event_recorded();
        metrics.events_pruned(5);
        metrics.flush_failed();
        metrics.snapshot_written();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_recorded, 2);
        assert_eq!(snapshot.events_pruned, 5);
        assert_eq!(snapshot.flush_failures, 1);
        assert_eq!(snapshot.snapshots_written, 1);
        assert_eq!(snapshot.snapshot_failures, 0);
    }
}
