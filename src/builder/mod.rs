//! Incremental build machinery.
//!
//! This module implements change detection, the rebuild scheduler, the
//! single-flight build marker and the compiler driver.

pub mod lock;
pub mod scheduler;
pub mod toolchain;
pub mod watcher;

pub use lock::ExclusiveBuildLock;
pub use scheduler::{needs_rebuild, BuildOnceReport, BuildScheduler, CycleReport};
pub use toolchain::{GccToolchain, LinkMode, StepOutcome, Toolchain};
pub use watcher::ChangeWatcher;
