//! Content checks for the source tree.
//!
//! A manifest that merely exists can still be unparseable, and a fuzz
//! crate can exist without declaring the configured targets.

use std::fs;
use std::path::Path;

use toml_edit::{DocumentMut, Item};

fn read_manifest(path: &Path) -> Result<DocumentMut, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("Cannot read: {}", e))?;
    text.parse::<DocumentMut>()
        .map_err(|e| format!("Not valid TOML: {}", e))
}

/// Validate the root manifest parses and describes a package or workspace.
pub fn validate_manifest(path: &Path) -> Result<(), String> {
    let doc = read_manifest(path)?;
    if doc.get("package").is_none() && doc.get("workspace").is_none() {
        return Err("No [package] or [workspace] table".to_string());
    }
    Ok(())
}

/// Names of the `[[bin]]` targets declared by a fuzz crate manifest.
pub fn declared_fuzz_targets(path: &Path) -> Result<Vec<String>, String> {
    let doc = read_manifest(path)?;
    let Some(bins) = doc.get("bin").and_then(Item::as_array_of_tables) else {
        return Ok(Vec::new());
    };
    Ok(bins
        .iter()
        .filter_map(|bin| bin.get("name").and_then(Item::as_str))
        .map(str::to_string)
        .collect())
}
