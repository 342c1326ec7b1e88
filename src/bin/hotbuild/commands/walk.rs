//! `hotbuild walk` command

use anyhow::Result;

use crate::cli::{GlobalArgs, WalkArgs};
use hotbuild::ops::{walk, WalkOptions};

pub fn execute(args: WalkArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = super::context(global)?;

    let report = walk(&ctx, &WalkOptions { root: args.root })?;

    // The report is the command's output, so it goes to stdout.
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render());
    }

    Ok(())
}
