use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::reporter::Reporter;

/// Scratch artifacts created while an operation runs, deleted
/// unconditionally once the run is over.
///
/// Registration is append-only during execution; disposal drains the set,
/// so invoking it a second time finds nothing left to delete.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    paths: Mutex<Vec<PathBuf>>,
}

impl ResourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file or directory for removal after the run.
    pub fn register(&self, path: impl Into<PathBuf>) {
        self.lock().push(path.into());
    }

    /// Paths currently awaiting disposal.
    #[must_use]
    pub fn registered(&self) -> Vec<PathBuf> {
        self.lock().clone()
    }

    /// Delete every registered path, tolerating entries that are already
    /// gone. A path that cannot be removed is reported as a warning, never
    /// returned as an error.
    pub fn dispose_all(&self, reporter: &dyn Reporter) {
        let paths: Vec<PathBuf> = self.lock().drain(..).collect();
        for path in paths {
            match remove_path(&path) {
                Ok(true) => {
                    reporter.log_message(&format!("Cleaned up resource: {}", path.display()));
                }
                Ok(false) => {}
                Err(error) => {
                    reporter.log_message(&format!(
                        "Warning: Failed to clean up {}: {error}",
                        path.display()
                    ));
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.paths.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `Ok(true)` when something was removed, `Ok(false)` when the path was
/// already absent.
fn remove_path(path: &Path) -> io::Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(error) => return Err(error),
    };
    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(true)
}
