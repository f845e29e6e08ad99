//! Image record: what the runtime image contains.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::Profile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub name: String,
    /// Location inside the image, e.g. `/parser`.
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub runtime_image: String,
    pub target_triple: String,
    pub profile: Profile,
    pub artifacts: Vec<ArtifactRecord>,
}

impl ImageRecord {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read image record {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid image record {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write image record {}", path.display()))
    }

    pub fn artifact(&self, name: &str) -> Option<&ArtifactRecord> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    pub fn print(&self) {
        println!("Runtime image: {}", self.runtime_image);
        println!("  target: {} ({})", self.target_triple, self.profile);
        for artifact in &self.artifacts {
            println!(
                "  {:<24} {:>10} bytes  sha256:{}",
                artifact.path, artifact.size, artifact.sha256
            );
        }
    }
}
