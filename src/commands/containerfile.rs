//! Containerfile command - prints or writes the equivalent Containerfile.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::BuildEnv;
use crate::containerfile;

pub fn cmd_containerfile(env: &BuildEnv, output: Option<&Path>) -> Result<()> {
    let text = containerfile::render(env);
    match output {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
