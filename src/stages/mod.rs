//! Pipeline stages, in execution order:
//!
//! - `provision` - install system packages and build tools
//! - `sources` - copy the source tree into the builder stage
//! - `patch` - remove the known-bad manifest declaration
//! - `build` - run the fuzz driver
//! - `export` - promote named executables into the runtime image root

pub mod build;
pub mod export;
pub mod patch;
pub mod provision;
pub mod sources;

use std::fmt;
use std::path::Path;

use crate::config::BuildEnv;
use crate::workspace::Layout;

pub use export::MissingArtifacts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Provision,
    StageSources,
    PatchManifest,
    Build,
    Export,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Provision => "provision",
            Stage::StageSources => "stage-sources",
            Stage::PatchManifest => "patch-manifest",
            Stage::Build => "build",
            Stage::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a stage needs to read.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub env: &'a BuildEnv,
    pub source_dir: &'a Path,
    pub layout: &'a Layout,
}
