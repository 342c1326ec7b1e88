//! Implementation of `hotbuild walk`.
//!
//! Scans the project from its root component and reports what the watch
//! loop would track: every reachable file, the direct and transitive
//! include sets, the object each unit compiles to, and include cycles.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::core::graph::DependencyGraph;
use crate::core::scanner::DependencyScanner;
use crate::core::source::{SourceKind, SourceLayout};
use crate::util::context::GlobalContext;
use crate::util::fs::relative_path;

/// Options for the walk command.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Component to scan from (defaults to `project.root`)
    pub root: Option<String>,
}

/// Scan result, with paths relative to the project root.
#[derive(Debug, Clone, Serialize)]
pub struct WalkReport {
    pub root: String,
    pub files: Vec<WalkFile>,
    pub units: Vec<WalkUnit>,
    pub cycles: Vec<Vec<PathBuf>>,
}

/// A discovered file and its direct includes.
#[derive(Debug, Clone, Serialize)]
pub struct WalkFile {
    pub path: PathBuf,
    pub kind: SourceKind,
    pub includes: Vec<PathBuf>,
}

/// A translation unit with its full dependency set.
#[derive(Debug, Clone, Serialize)]
pub struct WalkUnit {
    pub source: PathBuf,
    pub object: PathBuf,
    /// Transitive dependencies, sorted.
    pub dependencies: Vec<PathBuf>,
}

/// Scan the project and build a [`WalkReport`].
pub fn walk(ctx: &GlobalContext, opts: &WalkOptions) -> Result<WalkReport> {
    let config = ctx.config();
    let root = opts
        .root
        .clone()
        .unwrap_or_else(|| config.project.root.clone());
    let layout = SourceLayout::from_config(ctx.project_root(), &config.project);

    let mut graph = DependencyScanner::new(&layout).scan(&root)?;
    let plan = graph.artifact_set(&layout)?;
    tracing::debug!("walked {} file(s) from `{}`", graph.len(), root);

    let base = ctx.project_root();
    let files = graph
        .source_files()
        .iter()
        .map(|file| WalkFile {
            path: relative_path(base, &file.path),
            kind: file.kind,
            includes: file.includes.iter().map(|p| relative_path(base, p)).collect(),
        })
        .collect();

    let units = plan
        .iter()
        .map(|entry| {
            let mut dependencies: Vec<PathBuf> = entry
                .dependencies
                .iter()
                .map(|p| relative_path(base, p))
                .collect();
            dependencies.sort();
            WalkUnit {
                source: relative_path(base, &entry.unit.source),
                object: relative_path(base, &entry.unit.object),
                dependencies,
            }
        })
        .collect();

    Ok(WalkReport {
        root,
        files,
        units,
        cycles: relative_cycles(&graph, base),
    })
}

fn relative_cycles(graph: &DependencyGraph, base: &Path) -> Vec<Vec<PathBuf>> {
    graph
        .cycles()
        .into_iter()
        .map(|cycle| cycle.iter().map(|p| relative_path(base, p)).collect())
        .collect()
}

impl WalkReport {
    /// Human-readable rendering.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} ({} file(s))", self.root, self.files.len());

        for file in &self.files {
            let _ = writeln!(out, "  {}", file.path.display());
            for include in &file.includes {
                let _ = writeln!(out, "    -> {}", include.display());
            }
        }

        let _ = writeln!(out, "units:");
        for unit in &self.units {
            let _ = writeln!(
                out,
                "  {} => {} ({} dependenc{})",
                unit.source.display(),
                unit.object.display(),
                unit.dependencies.len(),
                if unit.dependencies.len() == 1 { "y" } else { "ies" }
            );
            for dep in &unit.dependencies {
                let _ = writeln!(out, "    {}", dep.display());
            }
        }

        if !self.cycles.is_empty() {
            let _ = writeln!(out, "include cycles:");
            for cycle in &self.cycles {
                let names: Vec<String> = cycle.iter().map(|p| p.display().to_string()).collect();
                let _ = writeln!(out, "  {}", names.join(" <-> "));
            }
        }

        out
    }

    /// Pretty-printed JSON rendering.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
