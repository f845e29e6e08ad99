//! fuzzpack - builds cargo-fuzz targets and promotes them into a minimal
//! runtime image.
//!
//! The pipeline runs five stages strictly in order (provision, stage
//! sources, patch manifest, build, export). Any failure aborts the run and
//! leaves no runtime image behind.

pub mod cache;
pub mod clean;
pub mod commands;
pub mod config;
pub mod containerfile;
pub mod image;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod stages;
pub mod timing;
pub mod workspace;

pub use config::BuildEnv;
pub use image::ImageRecord;
pub use pipeline::{Pipeline, PipelineError};
