//! Train command implementation

use crate::aae::AaeSession;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, load_config, TrainArgs};
use crate::data::ImageFolderLoader;

pub fn run_train(args: TrainArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Latente: Training from {}", args.config.display()),
    );

    let mut spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    apply_overrides(&mut spec, &args);

    let mut loader = ImageFolderLoader::open(
        &spec.data.train,
        spec.model.image_shape(),
        spec.data.batch_size,
    )
    .map_err(|e| format!("Data error: {e}"))?;
    if spec.data.shuffle {
        loader = loader.with_shuffle(spec.training.seed.unwrap_or_else(rand::random));
    }

    let mut session = AaeSession::new(spec.aae_config());
    if let Some(resume) = &args.resume {
        match session.load(resume) {
            Ok(()) => log(
                level,
                LogLevel::Normal,
                &format!("Resumed at epoch {}", session.start_epoch()),
            ),
            // Already reported by `load`; train from fresh weights
            Err(e) if e.is_missing_resource() => {}
            Err(e) => return Err(format!("Checkpoint error: {e}")),
        }
    }

    let epochs = spec.training.epochs;
    let every = spec.training.save_every;
    let name = spec.training.checkpoint_name.as_str();
    let mut last_saved = None;

    for epoch in session.start_epoch()..epochs {
        let report = session
            .train(&mut loader, epoch)
            .map_err(|e| format!("Training error: {e}"))?;
        log(
            level,
            LogLevel::Verbose,
            &format!("Epoch {epoch} mean\t{}", report.mean()),
        );

        if every > 0 && (epoch + 1) % every == 0 {
            session
                .save(epoch, name)
                .map_err(|e| format!("Checkpoint error: {e}"))?;
            last_saved = Some(epoch);
        }
    }

    if let Some(final_epoch) = epochs.checked_sub(1) {
        if final_epoch >= session.start_epoch() && last_saved != Some(final_epoch) {
            let path = session
                .save(final_epoch, name)
                .map_err(|e| format!("Checkpoint error: {e}"))?;
            log(
                level,
                LogLevel::Verbose,
                &format!("Final checkpoint: {}", path.display()),
            );
        }
    }

    log(level, LogLevel::Normal, "Training complete!");
    Ok(())
}
