//! Whole-state snapshots
//!
//! The alternative to the journal: instead of recording each event, a
//! [`SnapshotTaker`] periodically serializes the store's full contents and
//! atomically replaces a snapshot file with them. Only one of the two
//! strategies is meant to be active for a given store.
//!
//! Restoring from a snapshot at startup is not implied by taking them; the
//! bootstrap calls [`restore`] only when configured to.

pub mod codec;
pub mod error;
pub mod sink;
pub mod taker;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::info;

pub use codec::{EventSnapshot, SnapshotFormat};
pub use error::{Result, SnapshotError};
pub use sink::{AtomicFileSink, SnapshotSink};
pub use taker::SnapshotTaker;

use crate::counter::Event;

/// Decode the snapshot at `path`, or `None` if there is none yet
pub fn restore(path: &Path, format: SnapshotFormat) -> Result<Option<Vec<Event>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let events = format.decode(&bytes)?;
    info!(path = %path.display(), events = events.len(), "Snapshot restored");
    Ok(Some(events))
}
