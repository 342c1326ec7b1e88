//! Test utilities and mocks for hotbuild unit tests.
//!
//! Provides on-disk project fixtures and a [`RecordingToolchain`] that
//! stands in for the compiler: it records every call, writes object and
//! artifact files on success, and fails on request.

pub mod fixtures;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;

use crate::builder::lock::ExclusiveBuildLock;
use crate::builder::toolchain::{LinkMode, StepOutcome, Toolchain};

pub use fixtures::*;

/// A recorded toolchain invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolchainCall {
    Compile {
        source: PathBuf,
        object: PathBuf,
        /// Whether the lock marker existed during the call.
        locked: bool,
    },
    Link {
        objects: Vec<PathBuf>,
        output: PathBuf,
        mode: LinkMode,
        locked: bool,
    },
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<ToolchainCall>,
    failing_sources: HashSet<PathBuf>,
    fail_links: bool,
}

/// Mock toolchain. Clones share their recording.
#[derive(Debug, Clone)]
pub struct RecordingToolchain {
    inner: Arc<Mutex<Recorder>>,
    lock: Option<ExclusiveBuildLock>,
}

impl RecordingToolchain {
    pub fn new() -> Self {
        RecordingToolchain {
            inner: Arc::new(Mutex::new(Recorder::default())),
            lock: None,
        }
    }

    /// Record whether this lock is held during each call.
    pub fn observing(mut self, lock: ExclusiveBuildLock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Make compiles of `source` fail (or succeed again).
    pub fn set_compile_fails(&self, source: &Path, fails: bool) {
        let mut inner = self.inner.lock().unwrap();
        if fails {
            inner.failing_sources.insert(source.to_path_buf());
        } else {
            inner.failing_sources.remove(source);
        }
    }

    /// Make links fail (or succeed again).
    pub fn set_link_fails(&self, fails: bool) {
        self.inner.lock().unwrap().fail_links = fails;
    }

    /// All calls so far.
    pub fn calls(&self) -> Vec<ToolchainCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Sources compiled so far, in call order.
    pub fn compiled(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ToolchainCall::Compile { source, .. } => Some(source),
                _ => None,
            })
            .collect()
    }

    /// Number of link calls so far.
    pub fn link_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ToolchainCall::Link { .. }))
            .count()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    fn locked(&self) -> bool {
        self.lock.as_ref().is_some_and(|l| l.is_held())
    }
}

impl Default for RecordingToolchain {
    fn default() -> Self {
        Self::new()
    }
}

fn write_output(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, b"")?;
    Ok(())
}

impl Toolchain for RecordingToolchain {
    fn compile(&self, source: &Path, object: &Path) -> Result<StepOutcome> {
        let locked = self.locked();
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(ToolchainCall::Compile {
            source: source.to_path_buf(),
            object: object.to_path_buf(),
            locked,
        });

        if inner.failing_sources.contains(source) {
            return Ok(StepOutcome::failed(Duration::from_millis(1), Some(1)));
        }
        write_output(object)?;
        Ok(StepOutcome::succeeded(Duration::from_millis(1)))
    }

    fn link(&self, objects: &[PathBuf], output: &Path, mode: LinkMode) -> Result<StepOutcome> {
        let locked = self.locked();
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(ToolchainCall::Link {
            objects: objects.to_vec(),
            output: output.to_path_buf(),
            mode,
            locked,
        });

        if inner.fail_links {
            return Ok(StepOutcome::failed(Duration::from_millis(1), Some(1)));
        }
        write_output(output)?;
        Ok(StepOutcome::succeeded(Duration::from_millis(1)))
    }
}
