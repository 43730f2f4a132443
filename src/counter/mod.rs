//! In-memory sliding window of hit timestamps
//!
//! [`SlidingWindow`] keeps every accepted event in arrival order and answers
//! "how many happened within the last `window`". Expiry is handled two ways
//! that are kept deliberately separate:
//!
//! - `len()` skips the stale prefix at read time without touching the data
//! - `prune()` actually drops the stale prefix, driven by a [`Vacuumer`]
//!
//! Both rely on the data being ordered by timestamp. Events are appended as
//! they arrive, so this holds as long as the clock does not go backwards; an
//! out-of-order stale entry sitting behind a fresh one is neither skipped nor
//! pruned.
//!
//! [`Vacuumer`]: crate::vacuum::Vacuumer

pub mod error;
pub mod proto;
pub mod store;

use chrono::{DateTime, Utc};

pub use error::{CounterError, Result};
pub use store::{SlidingWindow, WindowOptions};

/// A single hit, identified only by when it happened
pub type Event = DateTime<Utc>;

/// Seam between the request path and whatever records hits
///
/// Implemented by the plain store and by the journal decorator.
pub trait Recorder: Send + Sync {
    fn add(&self, at: Event) -> Result<()>;

    /// Number of events inside the window right now
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read access to the full current contents, stale entries included
pub trait EventSource: Send + Sync {
    fn get(&self) -> Vec<Event>;
}
