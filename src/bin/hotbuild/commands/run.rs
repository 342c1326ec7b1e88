//! `hotbuild run` command

use anyhow::Result;

use crate::cli::{GlobalArgs, RunArgs};
use hotbuild::ops::build_and_run;

pub fn execute(args: RunArgs, global: &GlobalArgs) -> Result<i32> {
    let mut ctx = super::context(global)?;
    let shell = super::shell(global, "run")?;

    let config = ctx.config_mut();
    if args.root.is_some() {
        config.run.root = args.root;
    }
    if !args.args.is_empty() {
        config.run.args = args.args;
    }

    build_and_run(&ctx, shell)
}
