//! Search command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, SearchArgs};
use crate::index::SimilaritySearch;

pub fn run_search(args: SearchArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    let mut search = match args.output_dir.or(spec.index.output_dir) {
        Some(dir) => SimilaritySearch::new(dir),
        None => SimilaritySearch::default(),
    };
    search
        .load_index(&spec.index.index_path)
        .map_err(|e| format!("Index error: {e}"))?;
    search
        .load_store(&spec.index.store_path)
        .map_err(|e| format!("Store error: {e}"))?;

    let k = args.k.unwrap_or(spec.index.k);
    let result = search
        .search(&args.coordinate, k)
        .map_err(|e| format!("Search error: {e}"))?;

    if result.is_empty() {
        log(level, LogLevel::Normal, "No neighbours found");
        return Ok(());
    }
    for rank in 0..result.len() {
        log(
            level,
            LogLevel::Normal,
            &format!(
                "{rank:>3}  id={:<6} distance={:.4}  z={:?}  {}",
                result.ids[rank],
                result.distances[rank],
                result.coordinates[rank],
                result.image_paths[rank].display()
            ),
        );
    }
    Ok(())
}
