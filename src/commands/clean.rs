//! Clean command - removes parts of the work directory.

use anyhow::Result;
use std::path::Path;

use crate::clean;
use crate::config::BuildEnv;
use crate::workspace::Layout;

pub enum CleanTarget {
    /// Builder stage only (default)
    Builder,
    /// Runtime image and record
    Runtime,
    /// Whole work directory
    All,
}

/// Execute the clean command.
pub fn cmd_clean(source_dir: &Path, target: CleanTarget, env: &BuildEnv) -> Result<()> {
    let layout = Layout::new(env.work_dir_for(source_dir));
    match target {
        CleanTarget::Builder => clean::clean_builder(&layout),
        CleanTarget::Runtime => clean::clean_runtime(&layout),
        CleanTarget::All => clean::clean_all(&layout),
    }
}
