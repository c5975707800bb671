//! Reading configuration files

use super::{validate_config, AaeSpec};
use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Load and validate a YAML configuration file
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<AaeSpec> {
    let yaml_content = fs::read_to_string(config_path.as_ref()).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {}",
            config_path.as_ref().display(),
            e
        ))
    })?;

    let spec: AaeSpec = serde_yaml::from_str(&yaml_content)
        .map_err(|e| Error::Config(format!("Failed to parse YAML config: {e}")))?;

    validate_config(&spec).map_err(|e| Error::Config(format!("Invalid config: {e}")))?;

    Ok(spec)
}
