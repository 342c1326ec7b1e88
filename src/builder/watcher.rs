//! Polling change detection.
//!
//! The watcher keeps the last-seen modification time of every tracked file.
//! A poll reports files whose timestamp strictly increased and records the
//! new timestamp, so each change is reported once.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::source::TranslationUnit;
use crate::util::fs::{modified_time, modified_time_opt};

/// Last-known modification times of tracked files.
#[derive(Debug, Clone, Default)]
pub struct ChangeWatcher {
    state: HashMap<PathBuf, SystemTime>,
}

impl ChangeWatcher {
    pub fn new() -> Self {
        ChangeWatcher::default()
    }

    /// Replace the tracked set with `files` at their current timestamps.
    pub fn initialize<I, P>(&mut self, files: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.state.clear();
        self.track_new(files);
    }

    /// Start tracking files not seen before, at their current timestamps.
    /// Returns how many were added.
    pub fn track_new<I, P>(&mut self, files: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut added = 0;
        for file in files {
            let file = file.as_ref();
            if self.state.contains_key(file) {
                continue;
            }
            match modified_time(file) {
                Ok(time) => {
                    self.state.insert(file.to_path_buf(), time);
                    added += 1;
                }
                Err(e) => tracing::debug!("not tracking {}: {}", file.display(), e),
            }
        }
        added
    }

    /// Stop tracking every file not in `files`. Returns how many were dropped.
    pub fn retain_only<I, P>(&mut self, files: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let keep: HashSet<PathBuf> = files
            .into_iter()
            .map(|f| f.as_ref().to_path_buf())
            .collect();
        let before = self.state.len();
        self.state.retain(|file, _| keep.contains(file));
        before - self.state.len()
    }

    /// Set an explicit baseline for a file.
    pub fn seed(&mut self, file: impl Into<PathBuf>, time: SystemTime) {
        self.state.insert(file.into(), time);
    }

    /// Baseline each unit's source at its object's timestamp, or the epoch
    /// when the object is missing, so sources edited since the last build
    /// show up in the next poll.
    pub fn seed_from_objects<'a, I>(&mut self, units: I)
    where
        I: IntoIterator<Item = &'a TranslationUnit>,
    {
        for unit in units {
            let baseline = modified_time_opt(&unit.object).unwrap_or(UNIX_EPOCH);
            self.seed(unit.source.clone(), baseline);
        }
    }

    pub fn is_tracked(&self, file: &Path) -> bool {
        self.state.contains_key(file)
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Files modified since the last snapshot or poll.
    pub fn poll(&mut self) -> BTreeSet<PathBuf> {
        let mut changed = BTreeSet::new();
        for (file, last) in self.state.iter_mut() {
            let current = match modified_time(file) {
                Ok(time) => time,
                Err(e) => {
                    tracing::debug!("skipping {}: {}", file.display(), e);
                    continue;
                }
            };
            if current > *last {
                *last = current;
                changed.insert(file.clone());
            }
        }
        changed
    }
}
