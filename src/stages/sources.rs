//! Copy the source tree into the builder stage.

use anyhow::{bail, Result};

use crate::workspace;

use super::StageContext;

pub fn run(ctx: &StageContext) -> Result<u64> {
    if !ctx.source_dir.is_dir() {
        bail!("Source tree not found: {}", ctx.source_dir.display());
    }

    let dest = ctx.layout.builder_src();
    workspace::prepare_dir(&dest)?;

    let skip = [ctx.layout.work_dir.clone()];
    let copied = workspace::copy_tree(ctx.source_dir, &dest, &skip)?;
    tracing::info!(files = copied, dest = %dest.display(), "sources staged");
    Ok(copied)
}
