//! Rebuild scheduling.
//!
//! The scheduler owns the current dependency graph, the change watcher and
//! the compile plan. Each poll cycle it rescans when something changed,
//! recompiles the stale translation units one at a time and relinks the
//! artifact if any of them compiled. Every external step runs with the
//! [`ExclusiveBuildLock`] held.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{bail, Result};

use crate::builder::lock::ExclusiveBuildLock;
use crate::builder::toolchain::{LinkMode, StepOutcome, Toolchain};
use crate::builder::watcher::ChangeWatcher;
use crate::core::graph::{BuildArtifactSet, DependencyGraph, PlannedUnit};
use crate::core::scanner::DependencyScanner;
use crate::core::source::{SourceLayout, TranslationUnit};
use crate::util::context::GlobalContext;
use crate::util::fs::{modified_time_opt, relative_path};
use crate::util::shell::{Shell, Status, Thresholds};

/// What one triggered poll cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Files whose timestamp moved forward.
    pub changed: BTreeSet<PathBuf>,
    /// Sources compiled successfully.
    pub compiled: Vec<PathBuf>,
    /// Sources whose compile failed; they stay stale.
    pub failed: Vec<PathBuf>,
    /// `Some(success)` if a link was attempted.
    pub linked: Option<bool>,
    pub elapsed: Duration,
}

/// Result of a one-shot build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOnceReport {
    pub compiled: Vec<PathBuf>,
    pub linked: bool,
    pub artifact: PathBuf,
}

/// Whether a planned unit must be recompiled this cycle.
///
/// A unit is stale if its own source or any transitive dependency changed,
/// if its object file is missing, or if a full rebuild was requested.
pub fn needs_rebuild(entry: &PlannedUnit, changed: &BTreeSet<PathBuf>, force: bool) -> bool {
    force
        || changed.contains(&entry.unit.source)
        || entry.dependencies.iter().any(|dep| changed.contains(dep))
        || !entry.unit.object.exists()
}

/// Drives scanning, compiling and linking for one root component.
pub struct BuildScheduler<T: Toolchain> {
    layout: SourceLayout,
    project_root: PathBuf,
    root: String,
    artifact: PathBuf,
    link_mode: LinkMode,
    poll_interval: Duration,
    toolchain: T,
    lock: ExclusiveBuildLock,
    shell: Arc<Shell>,
    watcher: ChangeWatcher,
    graph: DependencyGraph,
    plan: BuildArtifactSet,
    force_rebuild: bool,
    relink_pending: bool,
    relink_backoff_initial: Duration,
    relink_backoff: Duration,
    relink_at: Option<Instant>,
}

/// Upper bound for the delay between automatic link retries.
const MAX_RELINK_BACKOFF: Duration = Duration::from_secs(30);

impl<T: Toolchain> BuildScheduler<T> {
    /// Scheduler for the watch loop: the project root component, linked as a
    /// shared library into the configured artifact.
    pub fn for_watch(ctx: &GlobalContext, toolchain: T, shell: Arc<Shell>) -> Self {
        let config = ctx.config();
        Self::new(
            ctx,
            config.project.root.clone(),
            ctx.artifact_path(),
            LinkMode::Shared,
            toolchain,
            shell,
        )
    }

    /// Scheduler for `run`: the run root component, linked as an executable.
    pub fn for_run(ctx: &GlobalContext, toolchain: T, shell: Arc<Shell>) -> Self {
        let config = ctx.config();
        Self::new(
            ctx,
            config.run_root().to_string(),
            ctx.executable_path(),
            LinkMode::Executable,
            toolchain,
            shell,
        )
    }

    fn new(
        ctx: &GlobalContext,
        root: String,
        artifact: PathBuf,
        link_mode: LinkMode,
        toolchain: T,
        shell: Arc<Shell>,
    ) -> Self {
        let config = ctx.config();
        BuildScheduler {
            layout: SourceLayout::from_config(ctx.project_root(), &config.project),
            project_root: ctx.project_root().to_path_buf(),
            root,
            artifact,
            link_mode,
            poll_interval: config.watch.poll_interval(),
            toolchain,
            lock: ExclusiveBuildLock::for_artifact(&ctx.artifact_path()),
            shell,
            watcher: ChangeWatcher::new(),
            graph: DependencyGraph::default(),
            plan: BuildArtifactSet::default(),
            force_rebuild: false,
            relink_pending: false,
            relink_backoff_initial: Duration::from_secs(1),
            relink_backoff: Duration::from_secs(1),
            relink_at: None,
        }
    }

    /// Delay before the first automatic retry of a failed link.
    pub fn relink_backoff(mut self, delay: Duration) -> Self {
        self.relink_backoff_initial = delay;
        self.relink_backoff = delay;
        self
    }

    /// Rebuild everything on the next triggered cycle.
    pub fn force_rebuild(mut self, force: bool) -> Self {
        self.force_rebuild = force;
        self
    }

    pub fn lock(&self) -> &ExclusiveBuildLock {
        &self.lock
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn plan(&self) -> &BuildArtifactSet {
        &self.plan
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Whether the last link failed and has not been retried successfully.
    pub fn relink_pending(&self) -> bool {
        self.relink_pending
    }

    /// Scan the project and take the initial timestamp snapshot.
    ///
    /// Translation units start from their object file's timestamp (or the
    /// epoch when there is none), so sources edited while nobody was watching
    /// are rebuilt on the first poll.
    pub fn start(&mut self) -> Result<()> {
        self.rescan()?;
        self.watcher.initialize(self.graph.files());
        self.watcher
            .seed_from_objects(self.plan.iter().map(|entry| &entry.unit));
        tracing::debug!(
            "tracking {} file(s), {} translation unit(s)",
            self.watcher.len(),
            self.plan.len()
        );
        Ok(())
    }

    /// Replace the graph and plan with a fresh scan. Newly discovered files
    /// start being tracked; files that left the graph stop.
    fn rescan(&mut self) -> Result<()> {
        let mut graph = DependencyScanner::new(&self.layout).scan(&self.root)?;
        let plan = graph.artifact_set(&self.layout)?;
        let dropped = self.watcher.retain_only(graph.files());
        if dropped > 0 {
            tracing::debug!("no longer tracking {} file(s)", dropped);
        }
        let added = self.watcher.track_new(graph.files());
        if added > 0 {
            tracing::debug!("tracking {} newly discovered file(s)", added);
        }
        self.graph = graph;
        self.plan = plan;
        Ok(())
    }

    /// Run one poll cycle. Returns `None` when there was nothing to do.
    ///
    /// Compile and link failures are reported and recorded in the report;
    /// only scan errors are returned as `Err`. A failed link is retried on
    /// later cycles with exponential back-off even if no source changes, so
    /// a link broken by something outside the sources (a locked artifact, a
    /// missing library) heals once the cause goes away.
    pub fn run_cycle(&mut self) -> Result<Option<CycleReport>> {
        let changed = self.watcher.poll();
        if changed.is_empty() && !self.force_rebuild {
            if self.relink_due() {
                return Ok(Some(self.retry_link()));
            }
            return Ok(None);
        }

        let start = Instant::now();
        if !changed.is_empty() {
            self.shell
                .status(Status::Changed, format!("{} file(s)", changed.len()));
            for file in &changed {
                self.shell.verbose(self.display(file));
            }
        }

        self.rescan()?;

        let force = self.force_rebuild;
        let mut report = CycleReport {
            changed,
            ..CycleReport::default()
        };

        for entry in self.plan.iter() {
            if !needs_rebuild(entry, &report.changed, force) {
                continue;
            }
            if self.compile(&entry.unit) {
                report.compiled.push(entry.unit.source.clone());
            } else {
                report.failed.push(entry.unit.source.clone());
            }
        }

        let retry_link = self.relink_pending && report.failed.is_empty();
        if !report.compiled.is_empty() || retry_link {
            let linked = self.link();
            self.record_link(linked);
            report.linked = Some(linked);
        }

        self.force_rebuild = false;
        report.elapsed = start.elapsed();

        if report.linked.is_some() || !report.failed.is_empty() {
            self.shell.timed(
                Status::Finished,
                "Total build time:",
                report.elapsed,
                Thresholds::BUILD,
            );
        }

        Ok(Some(report))
    }

    fn relink_due(&self) -> bool {
        self.relink_pending && self.relink_at.map_or(true, |at| Instant::now() >= at)
    }

    fn retry_link(&mut self) -> CycleReport {
        let start = Instant::now();
        self.shell.note("retrying failed link");
        let linked = self.link();
        self.record_link(linked);
        CycleReport {
            linked: Some(linked),
            elapsed: start.elapsed(),
            ..CycleReport::default()
        }
    }

    fn record_link(&mut self, linked: bool) {
        if linked {
            self.relink_pending = false;
            self.relink_at = None;
            self.relink_backoff = self.relink_backoff_initial;
        } else {
            self.relink_pending = true;
            self.relink_at = Some(Instant::now() + self.relink_backoff);
            self.relink_backoff = (self.relink_backoff * 2).min(MAX_RELINK_BACKOFF);
        }
    }

    /// Poll forever. Returns only if a scan fails.
    pub fn watch(&mut self) -> Result<()> {
        self.start()?;
        self.shell.status(
            Status::Watching,
            format!(
                "{} ({} file(s)) -> {}",
                self.root,
                self.graph.len(),
                self.display(&self.artifact)
            ),
        );

        loop {
            self.run_cycle()?;
            std::thread::sleep(self.poll_interval);
        }
    }

    /// Bring the artifact up to date once, comparing object timestamps with
    /// their inputs. Stops at the first failing step.
    pub fn build_once(&mut self) -> Result<BuildOnceReport> {
        self.rescan()?;

        let stale: Vec<TranslationUnit> = self
            .plan
            .iter()
            .filter(|entry| self.out_of_date(entry))
            .map(|entry| entry.unit.clone())
            .collect();

        let progress = self.shell.progress(stale.len() as u64, "compiling");
        let mut compiled = Vec::new();
        for unit in &stale {
            let ok = self.compile(unit);
            progress.inc(1);
            if !ok {
                progress.finish();
                bail!("could not compile {}", self.display(&unit.source));
            }
            compiled.push(unit.source.clone());
        }
        progress.finish();

        let linked = if !compiled.is_empty() || !self.artifact.exists() {
            if !self.link() {
                bail!("could not link {}", self.display(&self.artifact));
            }
            true
        } else {
            self.shell
                .status(Status::Finished, format!("{} is up to date", self.display(&self.artifact)));
            false
        };

        Ok(BuildOnceReport {
            compiled,
            linked,
            artifact: self.artifact.clone(),
        })
    }

    /// Missing object, or object older than its source or any dependency.
    fn out_of_date(&self, entry: &PlannedUnit) -> bool {
        let Some(object_time) = modified_time_opt(&entry.unit.object) else {
            return true;
        };
        let newer = |path: &Path| -> bool {
            let time = self
                .graph
                .get(path)
                .and_then(|f| f.modified)
                .unwrap_or(SystemTime::now());
            time > object_time
        };
        newer(&entry.unit.source) || entry.dependencies.iter().any(|dep| newer(dep))
    }

    fn compile(&self, unit: &TranslationUnit) -> bool {
        self.shell
            .status(Status::Compiling, self.display(&unit.object));
        let result = self
            .lock
            .with(|| self.toolchain.compile(&unit.source, &unit.object))
            .and_then(|r| r);
        self.report_step("compile", &unit.source, result)
    }

    fn link(&self) -> bool {
        let objects = self.plan.objects();
        self.shell.status(
            Status::Linking,
            format!("{} ({} object(s))", self.display(&self.artifact), objects.len()),
        );
        let result = self
            .lock
            .with(|| self.toolchain.link(&objects, &self.artifact, self.link_mode))
            .and_then(|r| r);
        self.report_step("link", &self.artifact, result)
    }

    fn report_step(&self, what: &str, path: &Path, result: Result<StepOutcome>) -> bool {
        match result {
            Ok(outcome) if outcome.success => {
                self.shell
                    .timed(Status::Ok, self.display(path), outcome.elapsed, Thresholds::COMMAND);
                true
            }
            Ok(outcome) => {
                let code = outcome
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                self.shell.error(format!(
                    "{} of {} failed (exit code={})",
                    what,
                    self.display(path),
                    code
                ));
                false
            }
            Err(e) => {
                self.shell
                    .error(format!("{} of {} failed: {:#}", what, self.display(path), e));
                false
            }
        }
    }

    fn display(&self, path: &Path) -> String {
        relative_path(&self.project_root, path).display().to_string()
    }
}
