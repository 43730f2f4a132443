//! Shutdown signalling and handles for background maintenance tasks
//!
//! Every periodic task (vacuum, journal flush, snapshot) is spawned through
//! [`TaskHandle::spawn`] and listens on a [`Shutdown`]. Triggering the signal
//! asks the task to finish; [`TaskHandle::join`] resolves only after the task
//! has run its final maintenance step and returned.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task '{name}' panicked: {message}")]
    Panicked { name: &'static str, message: String },

    #[error("Task '{0}' was cancelled by the runtime")]
    Aborted(&'static str),
}

pub type Result<T> = std::result::Result<T, TaskError>;

/// Longest period a maintenance ticker runs at; longer ones are clamped
pub const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Ticker for a periodic task, first firing one full `period` from now
///
/// Missed ticks are delayed rather than bursted.
///
/// # Panics
///
/// Panics if `period` is zero.
pub fn periodic_interval(period: Duration) -> Interval {
    let period = period.min(MAX_PERIOD);
    let now = Instant::now();
    let start = now.checked_add(period).unwrap_or(now);

    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Shared cancellation signal
///
/// Once triggered it stays triggered, so listeners created afterwards observe
/// it immediately.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Listening half of a [`Shutdown`]
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once shutdown has been triggered. Cancel safe.
    pub async fn recv(&mut self) {
        // A closed channel means every Shutdown is gone and nobody can
        // trigger it anymore, which is treated the same as a trigger.
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

/// Handle to a spawned maintenance task
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    shutdown: Shutdown,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Spawn `task` on the current tokio runtime, bound to `shutdown`
    pub fn spawn<F, Fut>(name: &'static str, shutdown: &Shutdown, task: F) -> Self
    where
        F: FnOnce(ShutdownSignal) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let signal = shutdown.subscribe();
        let join = tokio::spawn(task(signal));
        debug!(task = name, "Maintenance task spawned");

        Self {
            name,
            shutdown: shutdown.clone(),
            join,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Trigger the signal this task listens on
    ///
    /// Tasks spawned from the same [`Shutdown`] stop together.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task to return
    pub async fn join(self) -> Result<()> {
        let name = self.name;
        match self.join.await {
            Ok(()) => {
                debug!(task = name, "Maintenance task finished");
                Ok(())
            }
            Err(e) if e.is_panic() => {
                let payload = e.into_panic();
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(task = name, %message, "Maintenance task panicked");
                Err(TaskError::Panicked { name, message })
            }
            Err(_) => Err(TaskError::Aborted(name)),
        }
    }

    pub async fn shutdown(self) -> Result<()> {
        self.stop();
        self.join().await
    }
}
