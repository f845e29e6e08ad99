//! The build orchestrator.
//!
//! Runs provision, stage-sources, patch-manifest, build and export strictly
//! in order. The first failure ends the run; no runtime image exists
//! afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use thiserror::Error;

use crate::config::BuildEnv;
use crate::image::ImageRecord;
use crate::stages::{self, Stage, StageContext};
use crate::timing::Timer;
use crate::workspace::{self, Layout};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to prepare work directory")]
    Workspace(#[source] anyhow::Error),
    #[error("{stage} stage failed")]
    Stage {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    /// The stage that failed, if the failure happened inside one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            PipelineError::Workspace(_) => None,
        }
    }
}

pub struct Pipeline {
    env: BuildEnv,
    source_dir: PathBuf,
    layout: Layout,
    skip_provision: bool,
}

impl Pipeline {
    /// Prepare a pipeline for the source tree at `source_dir`.
    pub fn new(env: BuildEnv, source_dir: &Path) -> anyhow::Result<Self> {
        let source_dir = fs::canonicalize(source_dir)
            .with_context(|| format!("Source tree not found: {}", source_dir.display()))?;
        let layout = Layout::new(env.work_dir_for(&source_dir));
        Ok(Self {
            env,
            source_dir,
            layout,
            skip_provision: false,
        })
    }

    pub fn skip_provision(mut self, skip: bool) -> Self {
        self.skip_provision = skip;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn env(&self) -> &BuildEnv {
        &self.env
    }

    pub fn run(&self) -> Result<ImageRecord, PipelineError> {
        self.discard_previous_image()
            .map_err(PipelineError::Workspace)?;

        let ctx = StageContext {
            env: &self.env,
            source_dir: &self.source_dir,
            layout: &self.layout,
        };

        if self.skip_provision {
            tracing::info!("provisioning skipped");
        } else {
            self.step(Stage::Provision, || stages::provision::run(&ctx))?;
        }
        self.step(Stage::StageSources, || stages::sources::run(&ctx))?;
        self.step(Stage::PatchManifest, || stages::patch::run(&ctx))?;
        self.step(Stage::Build, || stages::build::run(&ctx))?;
        let record = self
            .step(Stage::Export, || stages::export::run(&ctx))
            .inspect_err(|_| stages::export::discard_image(&ctx))?;

        if self.env.keep_builder {
            tracing::info!(path = %self.layout.builder().display(), "builder stage kept");
        } else if let Err(e) = workspace::remove_dir(&self.layout.builder()) {
            tracing::warn!(error = %e, "failed to discard builder stage");
        }

        Ok(record)
    }

    fn step<T>(
        &self,
        stage: Stage,
        f: impl FnOnce() -> anyhow::Result<T>,
    ) -> Result<T, PipelineError> {
        tracing::info!(%stage, "stage starting");
        let timer = Timer::start(stage.name());

        match f() {
            Ok(value) => {
                timer.finish();
                Ok(value)
            }
            Err(source) => {
                tracing::error!(%stage, error = %format!("{:#}", source), "stage failed");
                let staging = self.layout.runtime_staging();
                if let Err(e) = workspace::remove_dir(&staging) {
                    tracing::warn!(path = %staging.display(), error = %format!("{:#}", e), "failed to remove export staging");
                }
                Err(PipelineError::Stage { stage, source })
            }
        }
    }

    /// A run either ends with a fresh image or with none at all.
    fn discard_previous_image(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.layout.work_dir).with_context(|| {
            format!("Failed to create {}", self.layout.work_dir.display())
        })?;
        workspace::remove_dir(&self.layout.runtime())?;
        workspace::remove_dir(&self.layout.runtime_staging())?;
        workspace::remove_file(&self.layout.image_record())?;
        Ok(())
    }
}
