//! Preflight checks.
//!
//! Validates host tools, the source tree and the work directory before a
//! build. Run with `fuzzpack preflight` to check everything is ready.

mod environment;
mod host_tools;
mod source;
mod types;
mod validators;

use std::path::Path;

use anyhow::{bail, Result};

use crate::config::BuildEnv;
use crate::workspace::Layout;

pub use types::{CheckResult, CheckStatus, PreflightReport};
pub use validators::declared_fuzz_targets;

/// Run all preflight checks.
pub fn run_preflight(
    source_dir: &Path,
    env: &BuildEnv,
    layout: &Layout,
    skip_provision: bool,
) -> PreflightReport {
    let mut checks = Vec::new();

    tracing::info!("checking host tools");
    checks.extend(host_tools::check_host_tools(env, skip_provision));

    tracing::info!("checking source tree");
    checks.extend(source::check_sources(source_dir, env));

    tracing::info!("checking work directory");
    checks.push(environment::check_work_dir(layout));

    PreflightReport { checks }
}

/// Run preflight and bail if any checks fail.
pub fn run_preflight_or_fail(
    source_dir: &Path,
    env: &BuildEnv,
    layout: &Layout,
    skip_provision: bool,
) -> Result<()> {
    let report = run_preflight(source_dir, env, layout, skip_provision);
    report.print();

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before building.",
            report.fail_count()
        );
    }

    println!("All preflight checks passed!\n");
    Ok(())
}
