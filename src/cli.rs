use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::AuditConfig;
use crate::data::images::process_folder;
use crate::data::loader::save_file;
use crate::pipeline;

/// Prepare an image dataset for a privacy audit.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "pixel-audit", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Flatten a folder of images into name/type/size/pixels rows
    ImagesToCsv(ImagesToCsvArgs),

    /// Add Laplace noise to the pixels column of a file
    ApplyDp(ApplyDpArgs),

    /// Split, noise and evaluate a flattened dataset
    Run(RunArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ImagesToCsvArgs {
    /// Folder to walk for jpg/jpeg/png/bmp/tiff files
    #[arg(default_value = "dataset")]
    pub folder: PathBuf,

    /// Output file (.csv, .json or .parquet)
    #[arg(default_value = "images.csv")]
    pub output: PathBuf,

    /// JSON config file; its `grayscale` setting applies unless `--color` is given
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep RGB channels instead of converting to grayscale
    #[arg(long)]
    pub color: bool,
}

impl ImagesToCsvArgs {
    pub fn grayscale(&self) -> Result<bool> {
        if self.color {
            return Ok(false);
        }
        Ok(match &self.config {
            Some(path) => AuditConfig::load(path)?.grayscale,
            None => AuditConfig::default().grayscale,
        })
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
#[command(allow_negative_numbers = true)]
pub struct ApplyDpArgs {
    pub input: PathBuf,

    pub output: PathBuf,

    /// Privacy parameter; smaller adds more noise
    #[arg(default_value_t = 1.0)]
    pub epsilon: f64,

    /// Seed the noise for a reproducible output
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone, PartialEq, Default)]
#[command(allow_negative_numbers = true)]
pub struct RunArgs {
    /// JSON config file; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Flattened image rows to audit
    #[arg(long)]
    pub input: Option<PathBuf>,

    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Seed for the partition split and the evaluators
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub noise_seed: Option<u64>,

    #[arg(long)]
    pub control_fraction: Option<f64>,

    #[arg(long)]
    pub n_attacks: Option<usize>,
}

impl RunArgs {
    pub fn into_config(self) -> Result<AuditConfig> {
        let mut config = match &self.config {
            Some(path) => AuditConfig::load(path)?,
            None => AuditConfig::default(),
        };
        if let Some(input) = self.input {
            config.files.images = input;
        }
        if let Some(epsilon) = self.epsilon {
            config.epsilon = epsilon;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(seed) = self.noise_seed {
            config.noise_seed = Some(seed);
        }
        if let Some(fraction) = self.control_fraction {
            config.control_fraction = fraction;
        }
        if let Some(n) = self.n_attacks {
            config.n_attacks = n;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::ImagesToCsv(args) => {
            let rows = process_folder(&args.folder, args.grayscale()?)?;
            save_file(&rows, &args.output)?;
            log::info!(
                "Saved {} images to {} with columns: {}",
                rows.len(),
                args.output.display(),
                rows.columns.join(", ")
            );
        }
        Command::ApplyDp(args) => {
            pipeline::apply_dp(&args.input, &args.output, args.epsilon, args.seed)?;
        }
        Command::Run(args) => {
            let config = args.into_config()?;
            let run = pipeline::run(&config)?;
            for outcome in &run.evaluation.outcomes {
                match &outcome.result {
                    Ok(estimate) => log::info!("{}: {:.4}", outcome.dimension, estimate.risk),
                    Err(e) => log::info!("{}: failed ({e})", outcome.dimension),
                }
            }
        }
    }
    Ok(())
}
