use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use super::codec::SnapshotFormat;
use super::error::Result;
use super::sink::SnapshotSink;
use crate::counter::EventSource;
use crate::observability::Metrics;
use crate::task::{self, Shutdown, TaskHandle};

/// Periodically writes the store's full contents through a sink
///
/// A snapshot may or may not include entries a concurrent prune is about to
/// drop; it never contains a partially updated list.
pub struct SnapshotTaker {
    period: Duration,
    source: Arc<dyn EventSource>,
    sink: Arc<dyn SnapshotSink>,
    format: SnapshotFormat,
    metrics: Arc<Metrics>,
}

impl SnapshotTaker {
    pub fn new(
        period: Duration,
        source: Arc<dyn EventSource>,
        sink: Arc<dyn SnapshotSink>,
        format: SnapshotFormat,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            period,
            source,
            sink,
            format,
            metrics,
        }
    }

    /// Take one snapshot now, returning how many events it held
    pub fn take_once(&self) -> Result<usize> {
        let events = self.source.get();
        let bytes = self.format.encode(&events)?;
        self.sink.write(&bytes)?;
        self.metrics.snapshot_written();
        debug!(events = events.len(), bytes = bytes.len(), "Snapshot written");
        Ok(events.len())
    }

    /// Snapshot once per period until `shutdown` fires
    ///
    /// Failures are logged and counted and the next period tries again.
    /// Cancellation does not take a final snapshot.
    pub fn start(self, shutdown: &Shutdown) -> TaskHandle {
        TaskHandle::spawn("snapshot", shutdown, move |mut signal| async move {
            info!(
                period_ms = self.period.as_millis() as u64,
                format = ?self.format,
                "Snapshot taker started"
            );
            let mut ticker = task::periodic_interval(self.period);

            loop {
                tokio::select! {
                    _ = signal.recv() => {
                        info!("Snapshot taker stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = self.take_once() {
                            self.metrics.snapshot_failed();
                            error!(error = %e, "Snapshot failed");
                        }
                    }
                }
            }
        })
    }
}
