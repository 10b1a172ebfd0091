//! Command-line entry: run the capture or comparison pipeline over JSON
//! manifests and print the result as JSON on stdout.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;

use crate::config::{ConfigError, InspectionConfig};
use crate::models::{CaptureManifest, ComparisonInput};
use crate::pipeline::inspection::{run_capture_pipeline, run_comparison_pipeline, InspectionEvent};
use crate::pipeline::{CancelFlag, PipelineError};
use crate::vision::{VisionError, VisionProvider};

#[derive(Parser, Debug)]
#[command(
    name = "walkthru",
    version,
    about = "Quality-gate, coverage-review and compare rental walkthrough photos"
)]
pub struct Cli {
    /// JSON config file. Falls back to $WALKTHRU_CONFIG, then built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Quality gate then coverage review for one room capture.
    Capture(CaptureArgs),
    /// Compare a move-in capture with a move-out capture of the same room.
    Compare(CompareArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    /// Capture manifest: {capture_id, room, images: [{id, file_path, orientation_hint, seq}]}
    pub manifest: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long)]
    pub room: String,

    /// Move-in capture manifest.
    pub move_in: PathBuf,

    /// Move-out capture manifest.
    pub move_out: PathBuf,

    /// Defaults to a fresh UUID.
    #[arg(long)]
    pub comparison_id: Option<String>,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Could not write output: {0}")]
    Output(#[from] serde_json::Error),
}

pub fn load_config(path: Option<&Path>) -> Result<InspectionConfig, ConfigError> {
    match path {
        Some(path) => InspectionConfig::load(path),
        None => InspectionConfig::from_env(),
    }
}

pub fn read_manifest(path: &Path) -> Result<CaptureManifest, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the comparison input from two capture manifests.
pub fn comparison_input(args: &CompareArgs) -> Result<ComparisonInput, CliError> {
    let move_in = read_manifest(&args.move_in)?;
    let move_out = read_manifest(&args.move_out)?;
    Ok(ComparisonInput {
        comparison_id: args
            .comparison_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        room: args.room.clone(),
        move_in: move_in.images,
        move_out: move_out.images,
    })
}

pub fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    let vision = VisionProvider::from_config(&config.vision)?;
    let cancel = CancelFlag::new();
    let mut log_event = |event: InspectionEvent| {
        let stage = match &event {
            InspectionEvent::Quality(_) => "quality",
            InspectionEvent::Coverage(_) => "coverage",
            InspectionEvent::Comparison(_) => "comparison",
        };
        tracing::debug!(stage, "Stage finished");
    };

    match cli.command {
        Commands::Capture(args) => {
            let manifest = read_manifest(&args.manifest)?;
            let outcome = run_capture_pipeline(&config, &vision, &cancel, &manifest, &mut log_event)?;
            print_json(&outcome)
        }
        Commands::Compare(args) => {
            let input = comparison_input(&args)?;
            let result = run_comparison_pipeline(&config, &vision, &cancel, &input, &mut log_event)?;
            print_json(&result)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
