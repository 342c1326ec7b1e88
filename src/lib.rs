//! hotbuild - an incremental build orchestrator for small C++ projects
//!
//! This crate provides the core library functionality for hotbuild:
//! include scanning, transitive dependency tracking, change detection and
//! the watch loop that recompiles and relinks a hot-reloadable artifact.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities for hotbuild unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides on-disk project fixtures and a recording
/// toolchain that stands in for the compiler driver.
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildScheduler, ExclusiveBuildLock, GccToolchain, Toolchain};
pub use core::{DependencyGraph, DependencyScanner, ScanError, SourceLayout};
pub use util::context::GlobalContext;
