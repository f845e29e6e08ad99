//! Run the fuzz driver inside the staged fuzz crate.

use anyhow::{bail, Result};

use crate::process::Cmd;

use super::StageContext;

pub fn run(ctx: &StageContext) -> Result<()> {
    let fuzz_dir = ctx.layout.builder_src().join(&ctx.env.fuzz_dir);
    if !fuzz_dir.is_dir() {
        bail!("Fuzz directory not found: {}", fuzz_dir.display());
    }

    let cmd = Cmd::new(&ctx.env.driver.program)
        .args(ctx.env.driver_args())
        .dir(&fuzz_dir)
        .error_msg("fuzz driver failed");
    tracing::info!(command = %cmd.display(), "building fuzz targets");
    cmd.run_interactive()?;
    Ok(())
}
