//! Promote fuzz-target executables into the runtime image root.
//!
//! Every named executable must exist before anything is copied. Copies go
//! to a staging directory that replaces the runtime root only once all of
//! them are in place and the image record is written. Any failure removes
//! the staging directory, the runtime root and the record.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cache;
use crate::image::{ArtifactRecord, ImageRecord};
use crate::workspace;

use super::StageContext;

#[derive(Debug, Error)]
#[error(
    "fuzz target executable(s) not found in {}: {}",
    .dir.display(),
    .missing.join(", ")
)]
pub struct MissingArtifacts {
    pub dir: PathBuf,
    pub missing: Vec<String>,
}

/// Names from `targets` with no regular file under `dir`.
pub fn missing_artifacts(dir: &Path, targets: &[String]) -> Vec<String> {
    targets
        .iter()
        .filter(|t| !dir.join(t.as_str()).is_file())
        .cloned()
        .collect()
}

pub fn run(ctx: &StageContext) -> Result<ImageRecord> {
    let artifact_dir = ctx.layout.builder_src().join(ctx.env.artifact_subdir());

    let missing = missing_artifacts(&artifact_dir, &ctx.env.targets);
    if !missing.is_empty() {
        return Err(MissingArtifacts {
            dir: artifact_dir,
            missing,
        }
        .into());
    }

    let staging = ctx.layout.runtime_staging();
    workspace::prepare_dir(&staging)?;

    promote(ctx, &artifact_dir, &staging)
}

/// Remove everything export may have produced. Run on export failure.
pub fn discard_image(ctx: &StageContext) {
    let layout = ctx.layout;
    for dir in [layout.runtime_staging(), layout.runtime()] {
        if let Err(e) = workspace::remove_dir(&dir) {
            tracing::warn!(path = %dir.display(), error = %format!("{:#}", e), "failed to remove partial image");
        }
    }
    let record = layout.image_record();
    if let Err(e) = workspace::remove_file(&record) {
        tracing::warn!(path = %record.display(), error = %format!("{:#}", e), "failed to remove image record");
    }
}

fn promote(ctx: &StageContext, artifact_dir: &Path, staging: &Path) -> Result<ImageRecord> {
    let mut artifacts = Vec::with_capacity(ctx.env.targets.len());

    for name in &ctx.env.targets {
        let src = artifact_dir.join(name);
        let dest = staging.join(name);
        let size = fs::copy(&src, &dest).with_context(|| {
            format!("Failed to copy {} to {}", src.display(), dest.display())
        })?;
        let sha256 = cache::hash_file(&dest)?;
        tracing::info!(artifact = %name, size, "exported /{}", name);

        artifacts.push(ArtifactRecord {
            name: name.clone(),
            path: format!("/{}", name),
            size,
            sha256,
        });
    }

    // The record goes first: a runtime root never exists without one.
    let record = ImageRecord {
        runtime_image: ctx.env.runtime_image.clone(),
        target_triple: ctx.env.target_triple.clone(),
        profile: ctx.env.profile,
        artifacts,
    };
    record.write(&ctx.layout.image_record())?;

    let runtime = ctx.layout.runtime();
    workspace::remove_dir(&runtime)?;
    fs::rename(staging, &runtime).with_context(|| {
        format!(
            "Failed to move {} to {}",
            staging.display(),
            runtime.display()
        )
    })?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_artifacts_lists_all() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("parser"), b"\x7fELF").unwrap();
        fs::create_dir(dir.path().join("filename")).unwrap();

        let targets = vec![
            "filename".to_string(),
            "parser".to_string(),
            "selectors".to_string(),
        ];
        // A directory named like a target does not count.
        assert_eq!(
            missing_artifacts(dir.path(), &targets),
            vec!["filename", "selectors"]
        );
    }

    #[test]
    fn test_missing_artifacts_message() {
        let err = MissingArtifacts {
            dir: PathBuf::from("/w/fuzz/target/x86_64-unknown-linux-gnu/release"),
            missing: vec!["filename".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("filename"));
        assert!(msg.contains("x86_64-unknown-linux-gnu/release"));
    }
}
