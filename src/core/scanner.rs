//! Local include discovery.
//!
//! Starting from a root component's implementation file, the scanner walks
//! quoted `#include "..."` directives breadth-first. Angle-bracket includes
//! name system or third-party headers and are outside the scanned universe.
//! Headers pull in their same-named implementation file so that editing
//! `scene.h` also recompiles `scene.cpp`.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::errors::ScanError;
use crate::core::graph::DependencyGraph;
use crate::core::source::{SourceFile, SourceKind, SourceLayout};
use crate::util::fs::{modified_time_opt, normalize_path};

static QUOTED_INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*#\s*include\s*"([^"]+)""#).expect("include regex is valid")
});

/// Quoted include operands of a source text, in order of appearance.
pub fn parse_includes(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .filter_map(|line| QUOTED_INCLUDE.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Breadth-first include scanner.
pub struct DependencyScanner<'a> {
    layout: &'a SourceLayout,
}

impl<'a> DependencyScanner<'a> {
    pub fn new(layout: &'a SourceLayout) -> Self {
        DependencyScanner { layout }
    }

    /// Discover every file reachable from `component` and its direct includes.
    pub fn scan(&self, component: &str) -> Result<DependencyGraph, ScanError> {
        let root = self
            .layout
            .root_source(component)
            .map(|p| normalize_path(&p))
            .ok_or_else(|| ScanError::MissingRoot {
                component: component.to_string(),
                src_dir: self.layout.src_dir().to_path_buf(),
            })?;

        let mut seen: HashSet<PathBuf> = HashSet::from([root.clone()]);
        let mut queue: VecDeque<PathBuf> = VecDeque::from([root]);
        let mut files = Vec::new();

        while let Some(path) = queue.pop_front() {
            let bytes = std::fs::read(&path).map_err(|source| ScanError::Io {
                path: path.clone(),
                source,
            })?;
            // Include directives are ASCII; other bytes never matter.
            let contents = String::from_utf8_lossy(&bytes);
            let kind = self.layout.kind(&path);

            if kind == SourceKind::Header {
                if let Some(implementation) = self.layout.implementation_for(&path) {
                    let implementation = normalize_path(&implementation);
                    if seen.insert(implementation.clone()) {
                        queue.push_back(implementation);
                    }
                }
            }

            let mut includes: Vec<PathBuf> = Vec::new();
            for include in parse_includes(&contents) {
                let target = self.resolve(&path, include)?;
                if !includes.contains(&target) {
                    includes.push(target.clone());
                }
                if seen.insert(target.clone()) {
                    queue.push_back(target);
                }
            }

            tracing::debug!(
                "scanned {} ({} local include(s))",
                path.display(),
                includes.len()
            );

            files.push(SourceFile {
                modified: modified_time_opt(&path),
                path,
                kind,
                includes,
            });
        }

        Ok(DependencyGraph::from_files(files))
    }

    /// Locate an include: next to the including file first, then under the
    /// source root.
    fn resolve(&self, from: &Path, include: &str) -> Result<PathBuf, ScanError> {
        let beside = from.parent().map(|dir| dir.join(include));
        let under_root = Some(self.layout.src_dir().join(include));

        beside
            .into_iter()
            .chain(under_root)
            .map(|candidate| normalize_path(&candidate))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ScanError::UnresolvableDependency {
                include: include.to_string(),
                from: from.to_path_buf(),
            })
    }
}
