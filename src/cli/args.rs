//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::pipeline::{ForestConfig, PipelineConfig, DEFAULT_LABEL_NOISE, DEFAULT_NUM_FEATURES};
use crate::server::DEFAULT_ALLOWED_ORIGIN;

/// dietrec - Recommend a diet from a patient profile with a model trained at startup
#[derive(Parser, Debug)]
#[command(name = "dietrec")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train on the dataset, then serve POST /predict
    Serve {
        #[command(flatten)]
        training: TrainingArgs,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        /// Port to bind
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Origin allowed by CORS (repeatable)
        #[arg(long = "allow-origin", default_values_t = vec![DEFAULT_ALLOWED_ORIGIN.to_string()])]
        allow_origins: Vec<String>,
    },

    /// Train on the dataset and print the feature ranking and model summary
    Inspect {
        #[command(flatten)]
        training: TrainingArgs,

        /// Write the training report as JSON to this path
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

/// Options shared by every command that trains a model
#[derive(Args, Debug, Clone)]
pub struct TrainingArgs {
    /// Dataset path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Fraction of labels replaced with random labels before training (0.0 to 1.0)
    #[arg(long, default_value_t = DEFAULT_LABEL_NOISE, value_parser = validate_fraction)]
    pub label_noise: f64,

    /// Disable label noise entirely
    #[arg(long, default_value = "false")]
    pub no_label_noise: bool,

    /// Seed for label noise (random when omitted)
    #[arg(long)]
    pub noise_seed: Option<u64>,

    /// Number of features kept after information-gain ranking
    #[arg(long, default_value_t = DEFAULT_NUM_FEATURES, value_parser = validate_positive)]
    pub num_features: usize,

    /// Number of trees in the forest
    #[arg(long, default_value = "100", value_parser = validate_positive)]
    pub trees: usize,

    /// Seed for bootstrap and feature sampling
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

impl TrainingArgs {
    /// Pipeline settings derived from the arguments
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            label_noise: if self.no_label_noise {
                0.0
            } else {
                self.label_noise
            },
            noise_seed: self.noise_seed,
            num_features: self.num_features,
            forest: ForestConfig {
                n_trees: self.trees,
                seed: self.seed,
                ..Default::default()
            },
        }
    }
}

impl Commands {
    /// Training options of whichever command was chosen
    pub fn training(&self) -> &TrainingArgs {
        match self {
            Commands::Serve { training, .. } | Commands::Inspect { training, .. } => training,
        }
    }
}

/// Validator for fraction parameters
fn validate_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!("label_noise must be between 0.0 and 1.0, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for counts that must be at least one
fn validate_positive(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid count", s))?;

    if value == 0 {
        Err("value must be at least 1".to_string())
    } else {
        Ok(value)
    }
}
