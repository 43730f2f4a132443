//! Append-only journal of accepted events
//!
//! The journal is one of the two durability strategies (the other being
//! [`crate::snapshot`]). Every event accepted by [`Journaled`] is appended to
//! a buffered file; at startup [`replay`] rebuilds the store's contents from
//! that file and [`Journaled::resume`] hands the replayed history over to a
//! fresh session.
//!
//! ## Startup
//!
//! ```rust,ignore
//! let replayed = journal::replay(&path)?;
//! let store = Arc::new(SlidingWindow::new(
//!     WindowOptions::builder().window(window).initial(replayed.events).build(),
//! ));
//! let journal = Arc::new(Journaled::resume(store, &path, JournalOptions::default())?);
//! let flusher = journal.start(&shutdown);
//! ```
//!
//! ## File format
//!
//! A plain sequence of length-delimited protobuf `Timestamp` records, see
//! [`record`].

pub mod error;
pub mod loader;
pub mod record;
pub mod writer;

pub use error::{JournalError, Result};
pub use loader::{Replay, ReplayEnd, replay};
pub use writer::{JournalOptions, Journaled};
