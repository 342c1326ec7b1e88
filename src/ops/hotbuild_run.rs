//! Implementation of `hotbuild run`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::builder::lock::ExclusiveBuildLock;
use crate::builder::{BuildScheduler, GccToolchain, Toolchain};
use crate::ops::startup::prepare_output;
use crate::util::context::GlobalContext;
use crate::util::fs::relative_path;
use crate::util::process::ProcessBuilder;
use crate::util::shell::{Shell, Status, Thresholds};

/// Build the `run` root component into an executable and launch it.
///
/// Returns the program's exit code.
pub fn build_and_run(ctx: &GlobalContext, shell: Arc<Shell>) -> Result<i32> {
    let config = ctx.config();
    let toolchain = GccToolchain::from_config(&config.toolchain, &config.watch)?;
    build_and_run_with(ctx, shell, toolchain)
}

/// [`build_and_run`] with a caller-provided toolchain.
pub fn build_and_run_with<T: Toolchain>(
    ctx: &GlobalContext,
    shell: Arc<Shell>,
    toolchain: T,
) -> Result<i32> {
    let _span = shell.span();
    let lock = prepare_output(ctx, &shell)?;

    let report = BuildScheduler::for_run(ctx, toolchain, Arc::clone(&shell)).build_once()?;
    launch(ctx, &shell, &lock, &report.artifact)
}

/// Run a built executable from the output directory with the lock held.
pub fn launch(
    ctx: &GlobalContext,
    shell: &Shell,
    lock: &ExclusiveBuildLock,
    executable: &Path,
) -> Result<i32> {
    let cmd = ProcessBuilder::new(executable)
        .args(&ctx.config().run.args)
        .cwd(ctx.out_dir());
    shell.status(
        Status::Running,
        relative_path(ctx.project_root(), executable).display(),
    );

    let run = lock
        .with(|| cmd.timed())?
        .with_context(|| format!("failed to launch {}", executable.display()))?;

    let code = run.status.code().unwrap_or(1);
    if run.status.success() {
        shell.timed(Status::Finished, "program exited in", run.elapsed, Thresholds::COMMAND);
    } else {
        shell.error(format!("program exited with code={}", code));
    }
    Ok(code)
}
