use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use super::error::Result;
use super::record;
use crate::atomic;
use crate::counter::{self, Event, EventSource, Recorder, SlidingWindow};
use crate::observability::Metrics;
use crate::task::{self, Shutdown, TaskHandle};

/// Write-side settings for a journal session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalOptions {
    /// Size of the in-memory write buffer
    pub buffer_capacity: usize,
    /// How often the flush task pushes the buffer to the file
    pub flush_interval: Duration,
}

impl Default for JournalOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: 512,
            flush_interval: Duration::from_secs(1),
        }
    }
}

/// Store decorator that appends every accepted event to a journal file
///
/// Writes are buffered; an event is only on disk once the buffer has been
/// flushed, either because it filled up, by the periodic flush task, or by
/// the final flush when that task is stopped.
pub struct Journaled {
    store: Arc<SlidingWindow>,
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    options: JournalOptions,
    metrics: Arc<Metrics>,
}

impl Journaled {
    /// Open a new journal session at `path`, handing over the store's history
    ///
    /// The store is pruned first, then its remaining contents (normally what
    /// was just replayed from `path`) are written to a temporary file, synced
    /// and renamed over `path` before it is reopened for appending. Expired
    /// events are dropped from the journal at every restart, and the previous
    /// journal is only replaced once the new one durably holds the history.
    pub fn resume(
        store: Arc<SlidingWindow>,
        path: impl AsRef<Path>,
        options: JournalOptions,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let expired = store.prune();
        let history = store.get();

        let mut encoded = Vec::with_capacity(history.iter().map(record::encoded_len).sum());
        for at in &history {
            record::encode(at, &mut encoded)?;
        }
        atomic::atomic_write(&path, &encoded)?;

        let file = OpenOptions::new().append(true).open(&path)?;
        info!(
            path = %path.display(),
            carried_over = history.len(),
            expired,
            "Journal session opened"
        );

        let metrics = Arc::clone(store.metrics());
        Ok(Self {
            store,
            writer: Mutex::new(BufWriter::with_capacity(options.buffer_capacity, file)),
            path,
            options,
            metrics,
        })
    }

    pub fn store(&self) -> &Arc<SlidingWindow> {
        &self.store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `at` in the store, then append it to the journal buffer
    ///
    /// The writer lock is held across both steps so the journal sees events
    /// in the same order as the store.
    pub fn add(&self, at: Event) -> Result<()> {
        let mut writer = self.writer.lock();
        self.store.add(at);

        let mut encoded = Vec::with_capacity(record::encoded_len(&at));
        record::encode(&at, &mut encoded)?;
        writer.write_all(&encoded)?;
        Ok(())
    }

    /// Push buffered records to the OS
    pub fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        self.metrics.journal_flushed();
        Ok(())
    }

    /// Flush and fsync
    pub fn sync(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.flush()?;
        writer.get_ref().sync_data()?;
        self.metrics.journal_flushed();
        Ok(())
    }

    /// Spawn the periodic flush task
    ///
    /// On shutdown it performs one last flush and fsync before returning, so
    /// joining the handle means everything added so far is on disk.
    pub fn start(self: &Arc<Self>, shutdown: &Shutdown) -> TaskHandle {
        let journal = Arc::clone(self);
        TaskHandle::spawn("journal-flush", shutdown, move |mut signal| async move {
            let period = journal.options.flush_interval;
            let mut ticker = task::periodic_interval(period);

            loop {
                tokio::select! {
                    _ = signal.recv() => break,
                    _ = ticker.tick() => journal.report_flush(journal.flush()),
                }
            }

            journal.report_flush(journal.sync());
            info!(path = %journal.path.display(), "Journal flushed on shutdown");
        })
    }

    fn report_flush(&self, result: Result<()>) {
        match result {
            Ok(()) => debug!(path = %self.path.display(), "Journal flushed"),
            Err(e) => {
                self.metrics.flush_failed();
                error!(path = %self.path.display(), error = %e, "Journal flush failed");
            }
        }
    }
}

impl Recorder for Journaled {
    fn add(&self, at: Event) -> counter::Result<()> {
        Journaled::add(self, at).inspect_err(|_| self.metrics.record_failed())?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

impl EventSource for Journaled {
    fn get(&self) -> Vec<Event> {
        self.store.get()
    }
}
