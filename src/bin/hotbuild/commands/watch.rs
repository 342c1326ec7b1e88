//! `hotbuild watch` command

use anyhow::Result;

use crate::cli::{GlobalArgs, WatchArgs};
use hotbuild::ops::{watch, WatchOptions};

pub fn execute(args: WatchArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;
    let shell = super::shell(global, "watch")?;

    let opts = WatchOptions {
        force_build: args.force_build,
    };
    watch(&ctx, shell, &opts)
}
