//! Atomic file replacement
//!
//! Content goes to a sibling temporary file which is fsynced and then renamed
//! over the target. Readers of the target see either the old complete file or
//! the new complete file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

/// Temporary sibling used while replacing `path`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    atomic_write_with(path, |file| file.write_all(content))
}

/// Replace `path` with whatever `write_fn` writes
///
/// If `write_fn` or the sync fails the temporary file is removed and `path`
/// is left as it was.
pub fn atomic_write_with<F>(path: &Path, write_fn: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp = temp_path(path);
    let written = File::create(&temp).and_then(|mut file| {
        write_fn(&mut file)?;
        file.sync_all()
    });

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&temp) {
            warn!(path = %temp.display(), error = %cleanup, "Failed to remove temporary file");
        }
        return Err(e);
    }

    fs::rename(&temp, path)?;
    sync_parent(path);
    Ok(())
}

/// Best effort fsync of the containing directory so the rename itself survives a crash
fn sync_parent(path: &Path) {
    #[cfg(unix)]
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = File::open(parent).and_then(|dir| dir.sync_all()) {
            warn!(path = %parent.display(), error = %e, "Directory sync failed");
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_path_is_sibling() {
        let temp = temp_path(Path::new("data/hits.snapshot"));
        assert_eq!(temp, PathBuf::from("data/hits.snapshot.tmp"));
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/target.bin");

        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_interrupted_write_keeps_previous_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("target.bin");
        atomic_write(&path, b"complete").unwrap();

        let result = atomic_write_with(&path, |file| {
            file.write_all(b"parti")?;
            Err(io::Error::other("interrupted"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), b"complete");
        assert!(!temp_path(&path).exists());
    }
}
