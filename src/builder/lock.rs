//! Single-flight build marker.
//!
//! A sentinel file next to the linked artifact signals "build or run in
//! progress" to cooperating tools, such as a host program that hot-reloads
//! the artifact and must not load it mid-link. The marker is advisory: it
//! does not stop a process that ignores it.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::fs::{ensure_dir, remove_file_if_exists};

/// Marker file guarding the output directory.
#[derive(Debug, Clone)]
pub struct ExclusiveBuildLock {
    path: PathBuf,
}

impl ExclusiveBuildLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ExclusiveBuildLock { path: path.into() }
    }

    /// The marker for an artifact: `out/game.dll` → `out/game.dll.lock`.
    pub fn for_artifact(artifact: &Path) -> Self {
        let mut name = artifact.as_os_str().to_owned();
        name.push(".lock");
        ExclusiveBuildLock::new(PathBuf::from(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a marker is currently present.
    pub fn is_held(&self) -> bool {
        self.path.exists()
    }

    /// Create the marker. It is removed when the guard drops.
    pub fn acquire(&self) -> Result<LockGuard<'_>> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        if self.is_held() {
            tracing::debug!("lock marker {} already present", self.path.display());
        }
        File::create(&self.path)
            .with_context(|| format!("failed to create lock marker: {}", self.path.display()))?;
        Ok(LockGuard { lock: self })
    }

    /// Remove the marker. An absent marker counts as released.
    pub fn release(&self) -> io::Result<()> {
        remove_file_if_exists(&self.path)
    }

    /// Remove a marker left behind by a crashed run. Returns whether one was found.
    pub fn clear_stale(&self) -> io::Result<bool> {
        let was_held = self.is_held();
        self.release()?;
        if was_held {
            tracing::info!("cleared stale lock marker {}", self.path.display());
        }
        Ok(was_held)
    }

    /// Run `f` with the marker held, releasing it however `f` exits.
    pub fn with<R>(&self, f: impl FnOnce() -> R) -> Result<R> {
        let _guard = self.acquire()?;
        Ok(f())
    }
}

/// Held lock marker; removes the marker on drop.
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a ExclusiveBuildLock,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.release() {
            tracing::warn!(
                "failed to remove lock marker {}: {}",
                self.lock.path.display(),
                e
            );
        }
    }
}
