//! Shared start-up steps of the build commands.

use anyhow::{Context, Result};

use crate::builder::lock::ExclusiveBuildLock;
use crate::util::context::GlobalContext;
use crate::util::shell::Shell;

/// Create the output directory and clear a lock marker left behind by a
/// previous run that crashed mid-build. Must run before the first build step.
pub fn prepare_output(ctx: &GlobalContext, shell: &Shell) -> Result<ExclusiveBuildLock> {
    ctx.ensure_out_dir()?;

    let lock = ExclusiveBuildLock::for_artifact(&ctx.artifact_path());
    let cleared = lock
        .clear_stale()
        .with_context(|| format!("failed to clear lock marker {}", lock.path().display()))?;
    if cleared {
        shell.verbose(format!("removed stale {}", lock.path().display()));
    }

    Ok(lock)
}
