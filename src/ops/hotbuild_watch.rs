//! Implementation of `hotbuild watch`.

use std::sync::Arc;

use anyhow::Result;

use crate::builder::{BuildScheduler, GccToolchain, Toolchain};
use crate::ops::startup::prepare_output;
use crate::util::context::GlobalContext;
use crate::util::shell::Shell;

/// Options for the watch command.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Rebuild every translation unit on the first cycle.
    pub force_build: bool,
}

/// Watch the project and rebuild the shared artifact on every change.
///
/// Only returns on a fatal scan error; otherwise runs until the process
/// is terminated.
pub fn watch(ctx: &GlobalContext, shell: Arc<Shell>, opts: &WatchOptions) -> Result<()> {
    let config = ctx.config();
    let toolchain = GccToolchain::from_config(&config.toolchain, &config.watch)?;
    watch_with(ctx, shell, opts, toolchain)
}

/// [`watch`] with a caller-provided toolchain.
pub fn watch_with<T: Toolchain>(
    ctx: &GlobalContext,
    shell: Arc<Shell>,
    opts: &WatchOptions,
    toolchain: T,
) -> Result<()> {
    let _span = shell.span();
    prepare_output(ctx, &shell)?;

    BuildScheduler::for_watch(ctx, toolchain, Arc::clone(&shell))
        .force_rebuild(opts.force_build)
        .watch()
}
