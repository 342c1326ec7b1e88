//! Include dependency graph.
//!
//! The graph stores each discovered file's direct includes in discovery
//! order and derives transitive dependency sets on demand. Closures are
//! memoized per file; a graph is never patched, callers rescan and replace
//! it wholesale when sources change.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;

use crate::core::errors::ScanError;
use crate::core::source::{SourceFile, SourceKind, SourceLayout, TranslationUnit};

/// Direct and transitive include relationships of a scanned project.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    files: Vec<SourceFile>,
    index: HashMap<PathBuf, usize>,
    closures: HashMap<PathBuf, HashSet<PathBuf>>,
}

impl DependencyGraph {
    /// Build a graph from scanned files. Later duplicates of a path are ignored.
    pub fn from_files(files: Vec<SourceFile>) -> Self {
        let mut graph = DependencyGraph::default();
        for file in files {
            if graph.index.contains_key(&file.path) {
                continue;
            }
            graph.index.insert(file.path.clone(), graph.files.len());
            graph.files.push(file);
        }
        graph
    }

    /// Number of known files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Known file paths, in discovery order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| f.path.as_path())
    }

    /// Known files with their metadata, in discovery order.
    pub fn source_files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<&SourceFile> {
        self.index.get(path).map(|&i| &self.files[i])
    }

    /// Direct includes of a file, in discovery order.
    pub fn direct_dependencies(&self, path: &Path) -> Option<&[PathBuf]> {
        self.get(path).map(|f| f.includes.as_slice())
    }

    /// Every file reachable from `path` through includes.
    ///
    /// Iterative depth-first walk: a file already in the accumulating set is
    /// never expanded again, so include cycles terminate. A file taking part
    /// in a cycle appears in its own closure.
    pub fn transitive_dependencies(&mut self, path: &Path) -> Result<&HashSet<PathBuf>, ScanError> {
        if !self.closures.contains_key(path) {
            let closure = self.compute_closure(path)?;
            self.closures.insert(path.to_path_buf(), closure);
        }
        Ok(&self.closures[path])
    }

    fn compute_closure(&self, path: &Path) -> Result<HashSet<PathBuf>, ScanError> {
        let start = self.get(path).ok_or_else(|| ScanError::UnresolvableDependency {
            include: path.display().to_string(),
            from: path.to_path_buf(),
        })?;

        let mut closure: HashSet<PathBuf> = HashSet::new();
        let mut stack: Vec<(&Path, &Path)> = start
            .includes
            .iter()
            .rev()
            .map(|dep| (dep.as_path(), start.path.as_path()))
            .collect();

        while let Some((dep, parent)) = stack.pop() {
            if closure.contains(dep) {
                continue;
            }
            closure.insert(dep.to_path_buf());

            // Reuse a finished closure instead of walking that subtree again.
            if let Some(known) = self.closures.get(dep) {
                closure.extend(known.iter().cloned());
                continue;
            }

            let file = self.get(dep).ok_or_else(|| ScanError::UnresolvableDependency {
                include: dep.display().to_string(),
                from: parent.to_path_buf(),
            })?;
            for next in file.includes.iter().rev() {
                if !closure.contains(next) {
                    stack.push((next.as_path(), dep));
                }
            }
        }

        Ok(closure)
    }

    /// Translation units in discovery order.
    pub fn translation_units(&self) -> impl Iterator<Item = &SourceFile> {
        self.files
            .iter()
            .filter(|f| f.kind == SourceKind::Implementation)
    }

    /// The compile plan: every translation unit with its transitive dependencies.
    pub fn artifact_set(&mut self, layout: &SourceLayout) -> Result<BuildArtifactSet, ScanError> {
        let sources: Vec<PathBuf> = self.translation_units().map(|f| f.path.clone()).collect();

        let mut entries = Vec::with_capacity(sources.len());
        let mut owners: HashMap<PathBuf, PathBuf> = HashMap::new();
        for source in sources {
            let unit = layout.unit(&source);
            if let Some(first) = owners.insert(unit.object.clone(), source.clone()) {
                return Err(ScanError::ObjectCollision {
                    object: unit.object,
                    first,
                    second: source,
                });
            }
            let dependencies = self.transitive_dependencies(&source)?.clone();
            entries.push(PlannedUnit { unit, dependencies });
        }

        Ok(BuildArtifactSet { entries })
    }

    /// Include cycles, each as the set of files taking part in it.
    pub fn cycles(&self) -> Vec<Vec<PathBuf>> {
        let mut graph: DiGraph<&Path, ()> = DiGraph::new();
        let nodes: HashMap<&Path, _> = self
            .files
            .iter()
            .map(|f| (f.path.as_path(), graph.add_node(f.path.as_path())))
            .collect();

        for file in &self.files {
            for dep in &file.includes {
                if let Some(&to) = nodes.get(dep.as_path()) {
                    graph.add_edge(nodes[file.path.as_path()], to, ());
                }
            }
        }

        tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.iter().any(|&n| graph.contains_edge(n, n))
            })
            .map(|scc| {
                let mut members: Vec<PathBuf> =
                    scc.into_iter().map(|n| graph[n].to_path_buf()).collect();
                members.sort();
                members
            })
            .collect()
    }
}

/// One entry of the compile plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUnit {
    pub unit: TranslationUnit,
    /// Files whose change makes this unit stale (besides its own source).
    pub dependencies: HashSet<PathBuf>,
}

/// Ordered compile plan for a scanned project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildArtifactSet {
    entries: Vec<PlannedUnit>,
}

impl BuildArtifactSet {
    pub fn iter(&self) -> impl Iterator<Item = &PlannedUnit> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Object files in plan order; the link input.
    pub fn objects(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|e| e.unit.object.clone()).collect()
    }
}
