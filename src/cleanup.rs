//! Scope-exit removal of temporary files

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Owns temporary files created while a command runs and removes them when
/// dropped, whether the command succeeded, returned early or failed.
///
/// Removal failures are reported on stderr and never replace the command's
/// own result.
#[derive(Debug, Default)]
pub struct CleanupGuard {
    paths: Vec<PathBuf>,
}

impl CleanupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    #[cfg(test)]
    pub fn registered(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove everything registered so far. Files that are already gone
    /// count as removed.
    pub fn release(&mut self) -> Vec<(PathBuf, io::Error)> {
        let mut failures = Vec::new();
        for path in self.paths.drain(..) {
            if let Err(e) = remove(&path) {
                failures.push((path, e));
            }
        }
        failures
    }
}

fn remove(path: &Path) -> io::Result<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        for (path, e) in self.release() {
            eprintln!("⚠️  Warning: Fail to clean up {}: {}", path.display(), e);
        }
    }
}
