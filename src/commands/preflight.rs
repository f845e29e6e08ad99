//! Preflight command - runs preflight checks.

use anyhow::Result;
use std::path::Path;

use crate::config::BuildEnv;
use crate::preflight;
use crate::workspace::Layout;

/// Execute the preflight command.
pub fn cmd_preflight(
    source_dir: &Path,
    env: &BuildEnv,
    strict: bool,
    skip_provision: bool,
) -> Result<()> {
    let layout = Layout::new(env.work_dir_for(source_dir));
    if strict {
        preflight::run_preflight_or_fail(source_dir, env, &layout, skip_provision)?;
    } else {
        let report = preflight::run_preflight(source_dir, env, &layout, skip_provision);
        report.print();
        if !report.all_passed() {
            println!("Some checks failed. Use --strict to fail with a non-zero exit.");
        }
    }
    Ok(())
}
