//! Command-line types: [`Cli`], [`Command`] and per-command arguments

use super::AaeSpec;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Latente: adversarial autoencoder with a searchable latent space
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "latente")]
#[command(version)]
#[command(about = "Train an adversarial autoencoder, index its latent space and search it")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Train the autoencoder from YAML configuration
    Train(TrainArgs),

    /// Encode the training set and build the latent index
    Index(IndexArgs),

    /// Find the images nearest to a latent coordinate
    Search(SearchArgs),

    /// Decode a latent vector to an image
    Generate(GenerateArgs),

    /// Validate a configuration file without training
    Validate(ValidateArgs),
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override checkpoint directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Resume training from checkpoint
    #[arg(short, long)]
    pub resume: Option<PathBuf>,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override batch size
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f32>,

    /// Save checkpoint every N epochs
    #[arg(long)]
    pub save_every: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the index command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct IndexArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Checkpoint whose encoder produces the latent codes
    #[arg(short, long)]
    pub checkpoint: PathBuf,

    /// Override number of trees
    #[arg(long)]
    pub trees: Option<usize>,
}

/// Arguments for the search command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct SearchArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Query coordinate, comma separated (e.g. `0.1,-0.4,1.2`)
    #[arg(long, required = true, value_delimiter = ',', allow_hyphen_values = true)]
    pub coordinate: Vec<f32>,

    /// Number of neighbours
    #[arg(short)]
    pub k: Option<usize>,

    /// Directory neighbour images are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the generate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct GenerateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Checkpoint whose decoder renders the image
    #[arg(short, long)]
    pub checkpoint: PathBuf,

    /// Latent vector, comma separated
    #[arg(short, long, required = true, value_delimiter = ',', allow_hyphen_values = true)]
    pub z: Vec<f32>,

    /// Output image file
    #[arg(short, long, default_value = "generated.png")]
    pub output: PathBuf,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Output format (text, json, yaml); json and yaml print the resolved config
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for the validate command
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            _ => Err(format!(
                "Unknown output format: {s}. Valid formats: text, json, yaml"
            )),
        }
    }
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to an AaeSpec
pub fn apply_overrides(spec: &mut AaeSpec, args: &TrainArgs) {
    if let Some(output_dir) = &args.output_dir {
        spec.training.output_dir = output_dir.clone();
    }
    if let Some(epochs) = args.epochs {
        spec.training.epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        spec.data.batch_size = batch_size;
    }
    if let Some(lr) = args.lr {
        spec.optimizer.lr = lr;
    }
    if let Some(save_every) = args.save_every {
        spec.training.save_every = save_every;
    }
    if let Some(seed) = args.seed {
        spec.training.seed = Some(seed);
    }
}
