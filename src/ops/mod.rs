//! High-level operations.
//!
//! This module contains the implementation of hotbuild commands.

pub mod hotbuild_run;
pub mod hotbuild_walk;
pub mod hotbuild_watch;
pub mod startup;

pub use hotbuild_run::{build_and_run, build_and_run_with, launch};
pub use hotbuild_test::{test_watch, TestLoop, TestReport};
pub use hotbuild_walk::{walk, WalkFile, WalkOptions, WalkReport, WalkUnit};
pub use hotbuild_watch::{watch, watch_with, WatchOptions};
pub use startup::prepare_output;
