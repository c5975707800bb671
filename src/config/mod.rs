//! Declarative YAML configuration and command-line surface
//!
//! An [`AaeSpec`] describes the model, the image folder to train on, the
//! optimizer, the training schedule and where index artefacts live. Every
//! section has defaults, so a config only names what it changes.

mod cli;
mod loader;
mod schema;
mod validate;

pub use cli::{
    apply_overrides, parse_args, Cli, Command, GenerateArgs, IndexArgs, OutputFormat, SearchArgs,
    TrainArgs, ValidateArgs,
};
pub use loader::load_config;
pub use schema::{AaeSpec, DataSpec, IndexSpec, ModelSpec, OptimSpec, TrainingSpec};
pub use validate::{validate_config, ValidationError};
