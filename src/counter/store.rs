use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tracing::debug;

use super::{Event, EventSource, Recorder, Result};
use crate::clock::{Clock, SystemClock};
use crate::observability::Metrics;
use crate::task::{Shutdown, TaskHandle};
use crate::vacuum::{Prune, Vacuumer};

/// Construction options for [`SlidingWindow`]
///
/// ```
/// use std::time::Duration;
/// use hitcount::counter::{SlidingWindow, WindowOptions};
/// use hitcount::vacuum::Vacuumer;
///
/// let store = SlidingWindow::new(
///     WindowOptions::builder()
///         .window(Duration::from_secs(30))
///         .vacuum(Vacuumer::periodic(Duration::from_secs(5)))
///         .build(),
/// );
/// assert_eq!(store.len(), 0);
/// ```
#[derive(Builder)]
pub struct WindowOptions {
    /// How far back an event still counts
    window: Duration,
    #[builder(default = default_clock())]
    clock: Arc<dyn Clock>,
    #[builder(default)]
    vacuum: Vacuumer,
    /// Warm-start contents, oldest first
    #[builder(default)]
    initial: Vec<Event>,
    /// Signal the vacuum task listens on
    #[builder(default)]
    shutdown: Shutdown,
    #[builder(default = Arc::new(Metrics::new()))]
    metrics: Arc<Metrics>,
}

fn default_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

/// Ordered record of event timestamps within a trailing window
///
/// All operations take the same exclusive lock; there is no reader/writer
/// split since the whole process shares one aggregate window.
pub struct SlidingWindow {
    window: Duration,
    window_delta: TimeDelta,
    clock: Arc<dyn Clock>,
    data: Mutex<VecDeque<Event>>,
    vacuum: Vacuumer,
    shutdown: Shutdown,
    metrics: Arc<Metrics>,
}

impl SlidingWindow {
    pub fn new(options: WindowOptions) -> Self {
        let WindowOptions {
            window,
            clock,
            vacuum,
            initial,
            shutdown,
            metrics,
        } = options;

        Self {
            window,
            window_delta: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
            clock,
            data: Mutex::new(VecDeque::from(initial)),
            vacuum,
            shutdown,
            metrics,
        }
    }

    /// Empty store on the wall clock with no background vacuum
    pub fn with_window(window: Duration) -> Self {
        Self::new(WindowOptions::builder().window(window).build())
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn now(&self) -> Event {
        self.clock.now()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn add(&self, at: Event) {
        self.data.lock().push_back(at);
        self.metrics.event_recorded();
    }

    /// Count of entries newer than `now - window`
    ///
    /// Stale entries are skipped from the oldest end until the first entry
    /// inside the window; nothing is removed.
    pub fn len(&self) -> usize {
        let cutoff = self.cutoff();
        let data = self.data.lock();
        let stale = stale_prefix(&data, cutoff);
        data.len() - stale
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw number of retained entries, stale ones included
    pub fn stored(&self) -> usize {
        self.data.lock().len()
    }

    /// Copy of the full contents in arrival order
    pub fn get(&self) -> Vec<Event> {
        self.data.lock().iter().copied().collect()
    }

    /// Drop the leading run of entries at or before `now - window`
    pub fn prune(&self) -> usize {
        let cutoff = self.cutoff();
        let mut data = self.data.lock();
        let stale = stale_prefix(&data, cutoff);
        data.drain(..stale);
        let remaining = data.len();
        drop(data);

        debug!(pruned = stale, remaining, "Pruned expired events");
        self.metrics.events_pruned(stale);
        stale
    }

    /// Spawn the configured vacuumer against this store
    pub fn start(self: &Arc<Self>) -> TaskHandle {
        let vacuum = self.vacuum;
        let target = Arc::clone(self);
        TaskHandle::spawn("vacuum", &self.shutdown, move |signal| {
            vacuum.run(target, signal)
        })
    }

    /// Ask the vacuum task to finish
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    fn cutoff(&self) -> DateTime<Utc> {
        self.clock
            .now()
            .checked_sub_signed(self.window_delta)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Length of the run of entries at or before `cutoff`, scanning from the front
fn stale_prefix(data: &VecDeque<Event>, cutoff: DateTime<Utc>) -> usize {
    data.iter().take_while(|at| **at <= cutoff).count()
}

impl fmt::Debug for SlidingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlidingWindow")
            .field("window", &self.window)
            .field("vacuum", &self.vacuum)
            .field("stored", &self.stored())
            .finish()
    }
}

impl Recorder for SlidingWindow {
    fn add(&self, at: Event) -> Result<()> {
        SlidingWindow::add(self, at);
        Ok(())
    }

    fn len(&self) -> usize {
        SlidingWindow::len(self)
    }
}

impl EventSource for SlidingWindow {
    fn get(&self) -> Vec<Event> {
        SlidingWindow::get(self)
    }
}

impl Prune for SlidingWindow {
    fn prune(&self) -> usize {
        SlidingWindow::prune(self)
    }
}
