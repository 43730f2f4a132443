use std::io;
use std::path::{Path, PathBuf};

use crate::atomic;

/// Destination for encoded snapshots
pub trait SnapshotSink: Send + Sync + 'static {
    fn write(&self, bytes: &[u8]) -> io::Result<()>;
}

impl<F> SnapshotSink for F
where
    F: Fn(&[u8]) -> io::Result<()> + Send + Sync + 'static,
{
    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        self(bytes)
    }
}

/// Replaces a file atomically with every snapshot
#[derive(Debug, Clone)]
pub struct AtomicFileSink {
    path: PathBuf,
}

impl AtomicFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSink for AtomicFileSink {
    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        atomic::atomic_write(&self.path, bytes)
    }
}
