//! Index command implementation

use crate::aae::AaeSession;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, IndexArgs};
use crate::data::ImageFolderLoader;
use crate::index::{IndexBuilder, TSne};

pub fn run_index(args: IndexArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    let mut session = AaeSession::new(spec.aae_config());
    session
        .load(&args.checkpoint)
        .map_err(|e| format!("Checkpoint error: {e}"))?;

    let mut loader = ImageFolderLoader::open(
        &spec.data.train,
        spec.model.image_shape(),
        spec.data.batch_size,
    )
    .map_err(|e| format!("Data error: {e}"))?;

    let seed = spec.training.seed.unwrap_or(0);
    let tsne = TSne::new()
        .with_perplexity(spec.index.perplexity)
        .with_iterations(spec.index.tsne_iterations)
        .with_seed(seed);
    let artifacts = IndexBuilder::new(&spec.index.index_path, &spec.index.store_path)
        .with_trees(args.trees.unwrap_or(spec.index.n_trees))
        .with_seed(seed)
        .with_tsne(tsne)
        .build(session.encoder(), &mut loader)
        .map_err(|e| format!("Index error: {e}"))?;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Indexed {} images\n  Index: {}\n  Store: {}",
            artifacts.index.len(),
            artifacts.index_path.display(),
            artifacts.store_path.display()
        ),
    );
    Ok(())
}
