//! Core data structures for hotbuild.
//!
//! This module contains the foundational types used throughout hotbuild:
//! - Source files, translation units and output naming
//! - Include scanning
//! - The dependency graph and compile plan

pub mod errors;
pub mod graph;
pub mod scanner;
pub mod source;

pub use errors::ScanError;
pub use graph::{BuildArtifactSet, DependencyGraph, PlannedUnit};
pub use scanner::DependencyScanner;
pub use source::{SourceFile, SourceKind, SourceLayout, TranslationUnit};
