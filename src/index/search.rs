//! Nearest-neighbour lookup over a persisted index and store

use super::{LatentIndex, PairedStore};
use crate::imaging::tensor_to_rgb;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Default number of neighbours returned
pub const DEFAULT_K: usize = 50;

/// Neighbours of one query, closest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    /// Item ids
    pub ids: Vec<usize>,
    /// Raw latent vectors from the store
    pub coordinates: Vec<Vec<f32>>,
    /// Euclidean distances in index space
    pub distances: Vec<f32>,
    /// Rendered neighbour images, one per rank
    pub image_paths: Vec<PathBuf>,
}

impl SearchResult {
    /// Number of neighbours
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing was found
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Similarity search over a loaded [`LatentIndex`] and [`PairedStore`]
#[derive(Debug)]
pub struct SimilaritySearch {
    output_dir: PathBuf,
    index: Option<LatentIndex>,
    store: Option<PairedStore>,
}

impl Default for SimilaritySearch {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl SimilaritySearch {
    /// Service that renders neighbour images into `output_dir`
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            index: None,
            store: None,
        }
    }

    /// Attach the index at `path`
    pub fn load_index(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let index = LatentIndex::load(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), items = index.len(), "loaded latent index");
        self.index = Some(index);
        Ok(())
    }

    /// Attach the paired store at `path`
    pub fn load_store(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let store = PairedStore::open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), rows = store.len(), "loaded paired store");
        self.store = Some(store);
        Ok(())
    }

    /// Attach already-built artefacts
    pub fn attach(&mut self, index: LatentIndex, store: PairedStore) {
        self.index = Some(index);
        self.store = Some(store);
    }

    /// Whether both artefacts are attached
    pub fn is_ready(&self) -> bool {
        self.index.is_some() && self.store.is_some()
    }

    /// Directory neighbour images are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the image rendered for `rank`
    pub fn image_path(&self, rank: usize) -> PathBuf {
        self.output_dir.join(format!("image{rank}.png"))
    }

    /// The `k` nearest items to `coordinate`
    ///
    /// Each neighbour's image is written to [`SimilaritySearch::image_path`]
    /// for its rank, overwriting earlier searches.
    pub fn search(&self, coordinate: &[f32], k: usize) -> Result<SearchResult> {
        let index = self.index.as_ref().ok_or(Error::NotInitialized("index"))?;
        let store = self.store.as_ref().ok_or(Error::NotInitialized("data store"))?;
        if index.len() != store.len() {
            return Err(Error::Index(format!(
                "index holds {} items but the data store holds {}",
                index.len(),
                store.len()
            )));
        }

        if index.is_empty() {
            tracing::warn!("latent index is empty, no neighbours to return");
            return Ok(SearchResult::default());
        }

        let neighbours = index.get_nns_by_vector(coordinate, k, None)?;
        if !neighbours.is_empty() {
            std::fs::create_dir_all(&self.output_dir)?;
        }

        let mut result = SearchResult::default();
        for (rank, (id, distance)) in neighbours.into_iter().enumerate() {
            let image = tensor_to_rgb(store.image(id)?, store.image_shape())?;
            let path = self.image_path(rank);
            image.save(&path)?;

            result.ids.push(id);
            result.coordinates.push(store.coordinate(id)?.to_vec());
            result.distances.push(distance);
            result.image_paths.push(path);
        }

        tracing::info!(k, found = result.len(), "similarity search complete");
        Ok(result)
    }
}
