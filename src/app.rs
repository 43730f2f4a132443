//! Startup and shutdown of the counting service
//!
//! [`App::start`] turns a validated [`Config`] into a running store: it
//! recovers history for the chosen durability strategy, builds the store and
//! spawns every background task against one shared [`Shutdown`].

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Config, DurabilityStrategy};
use crate::counter::{Event, Recorder, SlidingWindow, WindowOptions};
use crate::journal::{self, JournalError, JournalOptions, Journaled};
use crate::observability::Metrics;
use crate::snapshot::{self, AtomicFileSink, SnapshotError, SnapshotTaker};
use crate::task::{Shutdown, TaskError, TaskHandle};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// A running store with its recorder and maintenance tasks
pub struct App {
    store: Arc<SlidingWindow>,
    recorder: Arc<dyn Recorder>,
    metrics: Arc<Metrics>,
    strategy: DurabilityStrategy,
    shutdown: Shutdown,
    tasks: Vec<TaskHandle>,
}

impl App {
    /// Recover state and spawn the background tasks
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &Config) -> Result<Self> {
        let strategy = config.durability.strategy;
        let shutdown = Shutdown::new();
        let metrics = Arc::new(Metrics::new());

        let initial = recover(config)?;
        let store = Arc::new(SlidingWindow::new(
            WindowOptions::builder()
                .window(config.window.length.as_duration())
                .vacuum(config.window.vacuumer())
                .initial(initial)
                .shutdown(shutdown.clone())
                .metrics(Arc::clone(&metrics))
                .build(),
        ));

        let (recorder, durability_task): (Arc<dyn Recorder>, Option<TaskHandle>) = match strategy {
            DurabilityStrategy::Journal => {
                let options = JournalOptions {
                    buffer_capacity: config.journal.buffer_capacity.as_usize(),
                    flush_interval: config.journal.flush_interval.as_duration(),
                };
                let journaled = Arc::new(Journaled::resume(
                    Arc::clone(&store),
                    &config.journal.path,
                    options,
                )?);
                let task = journaled.start(&shutdown);
                let recorder: Arc<dyn Recorder> = journaled;
                (recorder, Some(task))
            }
            DurabilityStrategy::Snapshot => {
                let taker = SnapshotTaker::new(
                    config.snapshot.interval.as_duration(),
                    store.clone(),
                    Arc::new(AtomicFileSink::new(&config.snapshot.path)),
                    config.snapshot.format,
                    Arc::clone(&metrics),
                );
                let recorder: Arc<dyn Recorder> = store.clone();
                (recorder, Some(taker.start(&shutdown)))
            }
            DurabilityStrategy::None => {
                let recorder: Arc<dyn Recorder> = store.clone();
                (recorder, None)
            }
        };

        let tasks: Vec<TaskHandle> = std::iter::once(store.start())
            .chain(durability_task)
            .collect();

        info!(
            window_ms = store.window().as_millis() as u64,
            durability = strategy.as_str(),
            restored = store.stored(),
            tasks = tasks.len(),
            "Hit counter started"
        );

        Ok(Self {
            store,
            recorder,
            metrics,
            strategy,
            shutdown,
            tasks,
        })
    }

    pub fn store(&self) -> &Arc<SlidingWindow> {
        &self.store
    }

    /// What the request path records through
    pub fn recorder(&self) -> Arc<dyn Recorder> {
        Arc::clone(&self.recorder)
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn strategy(&self) -> DurabilityStrategy {
        self.strategy
    }

    /// Stop every task and wait for each to finish
    ///
    /// All tasks are joined even if one fails; the first failure is returned.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.trigger();

        let mut first_error = None;
        for task in self.tasks {
            let name = task.name();
            if let Err(e) = task.join().await {
                warn!(task = name, error = %e, "Task did not shut down cleanly");
                first_error.get_or_insert(e);
            }
        }

        info!(stored = self.store.stored(), "Hit counter stopped");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

/// History to seed the store with
fn recover(config: &Config) -> Result<Vec<Event>> {
    match config.durability.strategy {
        DurabilityStrategy::Journal => {
            let path = &config.journal.path;
            let replay = journal::replay(path)?;
            if config.journal.strict {
                Ok(replay.into_strict(path)?)
            } else {
                Ok(replay.events)
            }
        }
        DurabilityStrategy::Snapshot if config.snapshot.restore_on_start => {
            Ok(snapshot::restore(&config.snapshot.path, config.snapshot.format)?.unwrap_or_default())
        }
        DurabilityStrategy::Snapshot | DurabilityStrategy::None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VacuumMode;
    use crate::humanize::HumanDuration;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir, strategy: DurabilityStrategy) -> Config {
        let mut config = Config::default();
        config.durability.strategy = strategy;
        config.window.length = HumanDuration::from_secs(3600);
        config.journal.path = dir.path().join("hits.journal");
        config.snapshot.path = dir.path().join("hits.snapshot");
        config
    }

    #[tokio::test]
    async fn test_none_strategy_touches_no_files() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, DurabilityStrategy::None);

        let app = App::start(&config).unwrap();
        app.recorder().add(app.store().now()).unwrap();
        assert_eq!(app.recorder().len(), 1);
        app.shutdown().await.unwrap();

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_journal_restart_keeps_history() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, DurabilityStrategy::Journal);

        let app = App::start(&config).unwrap();
        for _ in 0..3 {
            app.recorder().add(app.store().now()).unwrap();
        }
        app.shutdown().await.unwrap();

        let app = App::start(&config).unwrap();
        assert_eq!(app.store().stored(), 3);
        app.recorder().add(app.store().now()).unwrap();
        assert_eq!(app.recorder().len(), 4);
        app.shutdown().await.unwrap();

        let replayed = journal::replay(&config.journal.path).unwrap();
        assert!(replayed.is_clean());
        assert_eq!(replayed.events.len(), 4);
    }

    #[tokio::test]
    async fn test_journal_restart_drops_expired_history() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, DurabilityStrategy::Journal);

        let month_ago = chrono::Utc::now() - chrono::TimeDelta::days(30);
        let mut encoded = Vec::new();
        for i in 0..100 {
            journal::record::encode(&(month_ago + chrono::TimeDelta::seconds(i)), &mut encoded).unwrap();
        }
        fs::write(&config.journal.path, &encoded).unwrap();

        let app = App::start(&config).unwrap();
        assert_eq!(app.store().stored(), 0);
        app.recorder().add(app.store().now()).unwrap();
        app.shutdown().await.unwrap();

        let replayed = journal::replay(&config.journal.path).unwrap();
        assert!(replayed.is_clean());
        assert_eq!(replayed.events.len(), 1);
    }

    #[tokio::test]
    async fn test_strict_journal_refuses_damaged_tail() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir, DurabilityStrategy::Journal);
        fs::write(&config.journal.path, [0x05, 0x08]).unwrap();

        config.journal.strict = true;
        assert!(matches!(
            App::start(&config),
            Err(AppError::Journal(JournalError::Damaged { .. }))
        ));

        config.journal.strict = false;
        let app = App::start(&config).unwrap();
        assert_eq!(app.store().stored(), 0);
        app.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_restore_only_when_enabled() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir, DurabilityStrategy::Snapshot);
        config.window.vacuum = VacuumMode::None;

        let events = vec![chrono::Utc::now(), chrono::Utc::now()];
        let bytes = config.snapshot.format.encode(&events).unwrap();
        fs::write(&config.snapshot.path, bytes).unwrap();

        let app = App::start(&config).unwrap();
        assert_eq!(app.store().stored(), 0);
        app.shutdown().await.unwrap();

        config.snapshot.restore_on_start = true;
        let app = App::start(&config).unwrap();
        assert_eq!(app.store().get(), events);
        assert_eq!(app.strategy(), DurabilityStrategy::Snapshot);
        app.shutdown().await.unwrap();
    }
}
