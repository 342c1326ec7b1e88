//! Command implementations

use std::sync::Arc;

use anyhow::Result;

use crate::cli::GlobalArgs;
use hotbuild::util::shell::{ColorChoice, Shell};
use hotbuild::util::GlobalContext;

pub mod run;
pub mod walk;
pub mod watch;

/// Load the project context, honoring `--config`.
pub fn context(global: &GlobalArgs) -> Result<GlobalContext> {
    match &global.config {
        Some(path) => GlobalContext::with_config_file(path),
        None => GlobalContext::new(),
    }
}

/// Build the output shell for a command from the global flags.
pub fn shell(global: &GlobalArgs, command: &str) -> Result<Arc<Shell>> {
    let color: ColorChoice = global.color.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    Ok(Arc::new(
        Shell::from_flags(global.quiet, global.verbose, color).for_command(command),
    ))
}
