//! Patch command - applies the manifest patch in place.

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

use crate::config::BuildEnv;
use crate::manifest::{self, PatchOutcome, PatchStrategy};

/// Execute the patch command.
pub fn cmd_patch(
    manifest_path: &Path,
    env: &BuildEnv,
    strategy: Option<PatchStrategy>,
    dry_run: bool,
) -> Result<()> {
    let Some(patch) = &env.manifest_patch else {
        bail!("No manifest patch configured");
    };
    let strategy = strategy.unwrap_or(env.patch_strategy);

    let outcome = if dry_run {
        let text = fs::read_to_string(manifest_path)?;
        manifest::patch_text(&text, patch, strategy)?
    } else {
        manifest::patch_file(manifest_path, patch, strategy)?
    };

    match outcome {
        PatchOutcome::Unchanged => {
            println!(
                "{}: declaration not present, unchanged",
                manifest_path.display()
            );
        }
        PatchOutcome::Removed { lines_removed, .. } => {
            let verb = if dry_run { "would remove" } else { "removed" };
            println!(
                "{}: {} `{}` ({} line(s))",
                manifest_path.display(),
                verb,
                patch.declaration(),
                lines_removed
            );
        }
    }
    Ok(())
}
