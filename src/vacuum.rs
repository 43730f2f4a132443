//! Background pruning of expired events
//!
//! A [`Vacuumer`] is resolved once from configuration and then driven by the
//! store's maintenance task. `Noop` exists for deployments (and tests) where the
//! lazy count in `len()` is enough and memory reclamation is not wanted.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::task::{self, ShutdownSignal};

/// Anything that can drop its expired prefix
pub trait Prune: Send + Sync + 'static {
    /// Returns the number of entries discarded
    fn prune(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Vacuumer {
    #[default]
    Noop,
    Periodic {
        period: Duration,
    },
}

impl Vacuumer {
    pub fn periodic(period: Duration) -> Self {
        Vacuumer::Periodic { period }
    }

    /// Run until `signal` fires
    ///
    /// `Noop` returns immediately. `Periodic` prunes `target` once per period,
    /// the first time one full period after start.
    ///
    /// # Panics
    ///
    /// Panics if a periodic vacuumer was built with a zero period.
    /// Configuration validation rejects that before it gets here.
    pub async fn run<P>(self, target: Arc<P>, mut signal: ShutdownSignal)
    where
        P: Prune + ?Sized,
    {
        let period = match self {
            Vacuumer::Noop => {
                debug!("Vacuum disabled");
                return;
            }
            Vacuumer::Periodic { period } => period,
        };

        info!(period_ms = period.as_millis() as u64, "Vacuum started");
        let mut ticker = task::periodic_interval(period);

        loop {
            tokio::select! {
                _ = signal.recv() => {
                    info!("Vacuum stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let pruned = target.prune();
                    debug!(pruned, "Vacuum pass complete");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Shutdown, TaskHandle};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingPruner {
        calls: AtomicUsize,
    }

    impl Prune for CountingPruner {
        fn prune(&self) -> usize {
            self.calls.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    #[tokio::test]
    async fn test_noop_returns_immediately() {
        let pruner = Arc::new(CountingPruner::default());
        let shutdown = Shutdown::new();

        Vacuumer::Noop.run(pruner.clone(), shutdown.subscribe()).await;

        assert_eq!(pruner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_prunes_each_period() {
        let pruner = Arc::new(CountingPruner::default());
        let shutdown = Shutdown::new();
        let vacuumer = Vacuumer::periodic(Duration::from_secs(5));

        let target = pruner.clone();
        let handle = TaskHandle::spawn("vacuum", &shutdown, move |signal| {
            vacuumer.run(target, signal)
        });

        // Nothing before the first full period
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(pruner.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(pruner.calls.load(Ordering::SeqCst), 3);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_stops_on_signal() {
        let pruner = Arc::new(CountingPruner::default());
        let shutdown = Shutdown::new();
        let vacuumer = Vacuumer::periodic(Duration::from_secs(1));

        let target = pruner.clone();
        let handle = TaskHandle::spawn("vacuum", &shutdown, move |signal| {
            vacuumer.run(target, signal)
        });

        handle.shutdown().await.unwrap();
        let calls = pruner.calls.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(pruner.calls.load(Ordering::SeqCst), calls);
    }
    #[tokio::test(start_paused = true)]
    async fn test_unbounded_period_starts_and_stops() {
        let pruner = Arc::new(CountingPruner::default());
        let shutdown = Shutdown::new();
        let vacuumer = Vacuumer::periodic(Duration::MAX);

        let target = pruner.clone();
        let handle = TaskHandle::spawn("vacuum", &shutdown, move |signal| {
            vacuumer.run(target, signal)
        });

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(!handle.is_finished());
        assert_eq!(pruner.calls.load(Ordering::SeqCst), 0);

        handle.shutdown().await.unwrap();
    }
}
