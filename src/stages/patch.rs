//! Patch the staged manifest.

use anyhow::{bail, Result};

use crate::manifest::{self, PatchOutcome};

use super::StageContext;

pub fn run(ctx: &StageContext) -> Result<PatchOutcome> {
    let Some(patch) = &ctx.env.manifest_patch else {
        tracing::info!("no manifest patch configured");
        return Ok(PatchOutcome::Unchanged);
    };

    let path = ctx.layout.builder_src().join(&ctx.env.manifest);
    if !path.is_file() {
        bail!("Manifest not found: {}", path.display());
    }

    let outcome = manifest::patch_file(&path, patch, ctx.env.patch_strategy)?;
    match &outcome {
        PatchOutcome::Unchanged => {
            tracing::info!(declaration = %patch.declaration(), "declaration absent, manifest unchanged")
        }
        PatchOutcome::Removed { lines_removed, .. } => tracing::info!(
            declaration = %patch.declaration(),
            lines = lines_removed,
            "declaration removed"
        ),
    }
    Ok(outcome)
}
