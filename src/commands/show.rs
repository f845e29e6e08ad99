//! Show command - displays information.

use anyhow::{bail, Result};
use std::path::Path;

use crate::config::BuildEnv;
use crate::image::ImageRecord;
use crate::workspace::Layout;

pub enum ShowTarget {
    /// Effective configuration
    Config,
    /// Image record of the last successful build
    Image,
}

/// Execute the show command.
pub fn cmd_show(source_dir: &Path, target: ShowTarget, env: &BuildEnv) -> Result<()> {
    match target {
        ShowTarget::Config => env.print(),
        ShowTarget::Image => {
            let layout = Layout::new(env.work_dir_for(source_dir));
            let record = layout.image_record();
            if !record.exists() {
                bail!("No runtime image found. Run 'fuzzpack build' first.");
            }
            ImageRecord::load(&record)?.print();
        }
    }
    Ok(())
}
