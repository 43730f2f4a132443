use std::sync::Arc;

use crate::app::App;
use crate::config::DurabilityStrategy;
use crate::counter::{Recorder, SlidingWindow};
use crate::observability::Metrics;

#[derive(Clone)]
pub struct AppState {
    /// Records hits; the journal decorator when journaling is on
    pub recorder: Arc<dyn Recorder>,
    pub store: Arc<SlidingWindow>,
    pub metrics: Arc<Metrics>,
    pub durability: DurabilityStrategy,
}

impl AppState {
    pub fn new(
        recorder: Arc<dyn Recorder>,
        store: Arc<SlidingWindow>,
        durability: DurabilityStrategy,
    ) -> Self {
        let metrics = Arc::clone(store.metrics());
        Self {
            recorder,
            store,
            metrics,
            durability,
        }
    }

    pub fn from_app(app: &App) -> Self {
        Self {
            recorder: app.recorder(),
            store: Arc::clone(app.store()),
            metrics: Arc::clone(app.metrics()),
            durability: app.strategy(),
        }
    }
}
