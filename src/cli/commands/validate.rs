//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, AaeSpec, OutputFormat, ValidateArgs};

/// Format model information as a string
pub fn format_model_info(spec: &AaeSpec) -> String {
    let image = spec.model.image_shape();
    format!(
        "  Latent dim: {}\n  Hidden width: {}\n  Image: {}x{}x{}",
        spec.model.z_dim, spec.model.h_dim, image.channels, image.height, image.width
    )
}

/// Format training configuration as a string
pub fn format_training_info(spec: &AaeSpec) -> String {
    let mut lines = vec![
        format!("  Training data: {}", spec.data.train.display()),
        format!("  Batch size: {}", spec.data.batch_size),
        format!("  Learning rate: {}", spec.optimizer.lr),
        format!("  Epochs: {}", spec.training.epochs),
    ];
    if spec.training.save_every > 0 {
        lines.push(format!("  Save every: {} epochs", spec.training.save_every));
    }
    lines.push(format!(
        "  Output dir: {}",
        spec.training.output_dir.display()
    ));
    lines.join("\n")
}

/// Format index configuration as a string
pub fn format_index_info(spec: &AaeSpec) -> String {
    format!(
        "  Index: {} ({} trees)\n  Store: {}",
        spec.index.index_path.display(),
        spec.index.n_trees,
        spec.index.store_path.display()
    )
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, "Configuration is valid");
            log(level, LogLevel::Normal, &format_model_info(&spec));
            log(level, LogLevel::Normal, &format_training_info(&spec));
            log(level, LogLevel::Normal, &format_index_info(&spec));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&spec)
                .map_err(|e| format!("JSON error: {e}"))?;
            log(level, LogLevel::Normal, &json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&spec).map_err(|e| format!("YAML error: {e}"))?;
            log(level, LogLevel::Normal, &yaml);
        }
    }
    Ok(())
}
