//! CLI command handlers.
//!
//! - `build` - run the whole pipeline
//! - `patch` - patch a manifest in place
//! - `preflight` - run preflight checks
//! - `show` - display configuration or the last image
//! - `clean` - remove parts of the work directory
//! - `containerfile` - render an equivalent Containerfile

pub mod build;
pub mod clean;
mod containerfile;
pub mod patch;
mod preflight;
pub mod show;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use containerfile::cmd_containerfile;
pub use patch::cmd_patch;
pub use preflight::cmd_preflight;
pub use show::cmd_show;
