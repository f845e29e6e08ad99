//! Build command - runs the full pipeline.

use anyhow::Result;
use std::path::Path;
use std::time::Instant;

use crate::config::BuildEnv;
use crate::pipeline::Pipeline;
use crate::preflight;

pub struct BuildOptions {
    pub skip_provision: bool,
    pub skip_preflight: bool,
}

/// Execute the build command.
pub fn cmd_build(source_dir: &Path, env: BuildEnv, opts: &BuildOptions) -> Result<()> {
    let start = Instant::now();
    let pipeline = Pipeline::new(env, source_dir)?.skip_provision(opts.skip_provision);

    if !opts.skip_preflight {
        preflight::run_preflight_or_fail(
            source_dir,
            pipeline.env(),
            pipeline.layout(),
            opts.skip_provision,
        )?;
    }

    println!("=== Fuzz Harness Build ===\n");
    let record = pipeline.run()?;

    println!();
    record.print();
    println!(
        "\nImage root: {} ({:.1}s)",
        pipeline.layout().runtime().display(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
