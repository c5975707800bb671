//! Generate command implementation

use crate::aae::{AaeSession, LatentCode};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, GenerateArgs};

pub fn run_generate(args: GenerateArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    let mut session = AaeSession::new(spec.aae_config());
    session
        .load(&args.checkpoint)
        .map_err(|e| format!("Checkpoint error: {e}"))?;

    let image = session
        .generate(&LatentCode::new(args.z))
        .map_err(|e| format!("Generate error: {e}"))?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| format!("Output error: {e}"))?;
    }
    image
        .save(&args.output)
        .map_err(|e| format!("Output error: {e}"))?;

    log(
        level,
        LogLevel::Normal,
        &format!("Wrote {}", args.output.display()),
    );
    Ok(())
}
