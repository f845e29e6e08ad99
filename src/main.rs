//! fuzzpack - fuzz harness build orchestrator.
//!
//! Builds the fuzz targets of a source tree in a builder stage and copies
//! only the named executables into a clean runtime image root.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fuzzpack::commands;
use fuzzpack::config::BuildEnv;
use fuzzpack::logging::{self, LogFormat};
use fuzzpack::manifest::PatchStrategy;

#[derive(Parser)]
#[command(name = "fuzzpack")]
#[command(about = "Fuzz harness build orchestrator")]
#[command(
    after_help = "QUICK START:\n  fuzzpack preflight       Check host tools and source tree\n  fuzzpack build           Provision, patch, build, export\n  fuzzpack show image      List exported executables\n  fuzzpack containerfile   Print the equivalent Containerfile"
)]
struct Cli {
    /// Source tree of the project being fuzzed
    #[arg(long, short = 's', global = true, default_value = ".")]
    source: PathBuf,

    /// JSON config file (default: <source>/fuzzpack.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the work directory
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and produce the runtime image
    Build {
        /// Assume the toolchain and tools are already installed
        #[arg(long)]
        skip_provision: bool,

        /// Don't run preflight checks first
        #[arg(long)]
        no_preflight: bool,
    },

    /// Remove the known-bad declaration from a manifest in place
    Patch {
        /// Manifest to patch (default: the configured manifest in --source)
        #[arg(long)]
        manifest: Option<PathBuf>,

        #[arg(long, value_enum)]
        strategy: Option<PatchStrategy>,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Run preflight checks
    Preflight {
        /// Fail if any checks fail (exit code 1)
        #[arg(long)]
        strict: bool,

        /// Check as if provisioning will be skipped
        #[arg(long)]
        skip_provision: bool,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },

    /// Clean the work directory (default: builder stage only)
    Clean {
        #[command(subcommand)]
        what: Option<CleanTarget>,
    },

    /// Print a two-stage Containerfile equivalent to the pipeline
    Containerfile {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show effective configuration
    Config,
    /// Show the last exported runtime image
    Image,
}

#[derive(Subcommand)]
enum CleanTarget {
    /// Remove staged sources and build output
    Builder,
    /// Remove the runtime image and its record
    Runtime,
    /// Remove the whole work directory
    All,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();
    logging::init(cli.verbose, cli.log_format);

    let mut env = BuildEnv::load(&cli.source, cli.config.as_deref())?;
    if let Some(work_dir) = cli.work_dir {
        env.work_dir = work_dir;
    }

    match cli.command {
        Commands::Build {
            skip_provision,
            no_preflight,
        } => {
            let opts = commands::build::BuildOptions {
                skip_provision,
                skip_preflight: no_preflight,
            };
            commands::cmd_build(&cli.source, env, &opts)?;
        }

        Commands::Patch {
            manifest,
            strategy,
            dry_run,
        } => {
            let manifest = manifest.unwrap_or_else(|| cli.source.join(&env.manifest));
            commands::cmd_patch(&manifest, &env, strategy, dry_run)?;
        }

        Commands::Preflight {
            strict,
            skip_provision,
        } => {
            commands::cmd_preflight(&cli.source, &env, strict, skip_provision)?;
        }

        Commands::Show { what } => {
            let show_target = match what {
                ShowTarget::Config => commands::show::ShowTarget::Config,
                ShowTarget::Image => commands::show::ShowTarget::Image,
            };
            commands::cmd_show(&cli.source, show_target, &env)?;
        }

        Commands::Clean { what } => {
            let clean_target = match what {
                None | Some(CleanTarget::Builder) => commands::clean::CleanTarget::Builder,
                Some(CleanTarget::Runtime) => commands::clean::CleanTarget::Runtime,
                Some(CleanTarget::All) => commands::clean::CleanTarget::All,
            };
            commands::cmd_clean(&cli.source, clean_target, &env)?;
        }

        Commands::Containerfile { output } => {
            commands::cmd_containerfile(&env, output.as_deref())?;
        }
    }

    Ok(())
}
