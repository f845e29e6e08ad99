//! Work directory cleaning.

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::workspace::Layout;

fn remove_path(path: &Path, what: &str) -> Result<bool> {
    if path.is_dir() {
        println!("Removing {}...", what);
        fs::remove_dir_all(path)?;
        Ok(true)
    } else if path.exists() {
        println!("Removing {}...", what);
        fs::remove_file(path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Remove the builder stage (staged sources and build output).
pub fn clean_builder(layout: &Layout) -> Result<()> {
    if remove_path(&layout.builder(), "builder stage")? {
        println!("Builder stage cleaned.");
    } else {
        println!("No builder stage to clean.");
    }
    Ok(())
}

/// Remove the runtime image and its record.
pub fn clean_runtime(layout: &Layout) -> Result<()> {
    let mut cleaned = remove_path(&layout.runtime(), "runtime image")?;
    cleaned |= remove_path(&layout.runtime_staging(), "export staging")?;
    cleaned |= remove_path(&layout.image_record(), "image record")?;

    if cleaned {
        println!("Runtime image cleaned.");
    } else {
        println!("No runtime image to clean.");
    }
    Ok(())
}

/// Remove the whole work directory, including the provisioning stamp.
pub fn clean_all(layout: &Layout) -> Result<()> {
    if remove_path(&layout.work_dir, "work directory")? {
        println!("Clean complete.");
    } else {
        println!("Nothing to clean.");
    }
    Ok(())
}
