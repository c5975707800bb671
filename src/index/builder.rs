//! Encode a dataset once and persist the latent index with its paired store

use super::{LatentIndex, PairedStore, TSne, DEFAULT_TREES, INDEX_DIM};
use crate::autograd::no_grad;
use crate::data::DataLoader;
use crate::nn::Encoder;
use crate::Result;
use std::path::{Path, PathBuf};

/// Default index file name
pub const DEFAULT_INDEX_FILE: &str = "aae.ann";

/// Default paired store file name
pub const DEFAULT_STORE_FILE: &str = "ann_data.safetensors";

/// Everything produced by one [`IndexBuilder::build`]
#[derive(Debug)]
pub struct IndexArtifacts {
    /// The built index
    pub index: LatentIndex,
    /// Rows paired with index ids
    pub store: PairedStore,
    /// Where the index was saved
    pub index_path: PathBuf,
    /// Where the store was written
    pub store_path: PathBuf,
}

/// Builds a [`LatentIndex`] and [`PairedStore`] from an encoder and a loader
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    index_path: PathBuf,
    store_path: PathBuf,
    n_trees: usize,
    seed: u64,
    tsne: TSne,
}

impl IndexBuilder {
    /// Builder writing to the given paths with [`DEFAULT_TREES`] trees
    pub fn new(index_path: impl AsRef<Path>, store_path: impl AsRef<Path>) -> Self {
        Self {
            index_path: index_path.as_ref().to_path_buf(),
            store_path: store_path.as_ref().to_path_buf(),
            n_trees: DEFAULT_TREES,
            seed: 0,
            tsne: TSne::default(),
        }
    }

    /// Builder writing the default file names into `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(DEFAULT_INDEX_FILE), dir.join(DEFAULT_STORE_FILE))
    }

    /// Set the tree count
    #[must_use]
    pub fn with_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Seed tree construction and the t-SNE layout
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.tsne = self.tsne.with_seed(seed);
        self
    }

    /// Replace the reducer used when the latent space is wider than the index
    #[must_use]
    pub fn with_tsne(mut self, tsne: TSne) -> Self {
        self.tsne = tsne;
        self
    }

    /// Encode one full pass of `loader`, then build and persist both artefacts
    ///
    /// Ids are assigned from 0 in iteration order.
    pub fn build<E, L>(&self, encoder: &E, loader: &mut L) -> Result<IndexArtifacts>
    where
        E: Encoder,
        L: DataLoader + ?Sized,
    {
        let z_dim = encoder.z_dim();
        let image_shape = loader.image_shape();

        let mut images = Vec::with_capacity(loader.num_samples());
        let mut latents: Vec<Vec<f32>> = Vec::with_capacity(loader.num_samples());
        for batch in loader.batches() {
            let batch = batch?;
            let z = no_grad(|| encoder.forward(&batch.images));
            let z = z.to_vec();
            for (i, row) in z.chunks_exact(z_dim.max(1)).enumerate() {
                images.push(batch.sample(i));
                latents.push(row.to_vec());
            }
        }

        let index_coords = self.index_coordinates(&latents, z_dim);

        let mut index = LatentIndex::with_seed(INDEX_DIM, self.seed);
        let mut store = PairedStore::new(image_shape, z_dim);
        let rows = images.iter().zip(&latents).zip(&index_coords);
        for (id, ((image, latent), coord)) in rows.enumerate() {
            index.add_item(id, coord)?;
            store.push(image, latent, coord)?;
        }
        index.build(self.n_trees)?;
        index.save(&self.index_path)?;
        store.write(&self.store_path)?;

        tracing::info!(
            items = index.len(),
            z_dim,
            trees = self.n_trees,
            index = %self.index_path.display(),
            store = %self.store_path.display(),
            "latent index built"
        );

        Ok(IndexArtifacts {
            index,
            store,
            index_path: self.index_path.clone(),
            store_path: self.store_path.clone(),
        })
    }

    fn index_coordinates(&self, latents: &[Vec<f32>], z_dim: usize) -> Vec<[f32; INDEX_DIM]> {
        if z_dim > INDEX_DIM {
            tracing::info!(samples = latents.len(), z_dim, "reducing latent codes with t-SNE");
            return self.tsne.fit_transform(latents);
        }
        latents
            .iter()
            .map(|z| {
                let mut coord = [0.0; INDEX_DIM];
                coord[..z.len()].copy_from_slice(z);
                coord
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ImageBatch, ImageShape, InMemoryLoader};
    use crate::device::Device;
    use crate::nn::MlpEncoder;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    const SHAPE: ImageShape = ImageShape::new(1, 4, 4);

    fn loader(n: usize, batch_size: usize) -> InMemoryLoader {
        let samples = (0..n)
            .map(|i| {
                let pixels = (0..SHAPE.numel())
                    .map(|p| ((i * 7 + p) % 16) as f32 / 15.0)
                    .collect();
                (pixels, 0)
            })
            .collect();
        InMemoryLoader::from_samples(samples, SHAPE, batch_size).unwrap()
    }

    fn encoder(z_dim: usize) -> MlpEncoder {
        let mut rng = StdRng::seed_from_u64(3);
        MlpEncoder::new(SHAPE, 8, z_dim, Device::Cpu, &mut rng)
    }

    #[test]
    fn test_build_raw_three_dim() {
        let dir = TempDir::new().unwrap();
        let enc = encoder(3);
        let artifacts = IndexBuilder::in_dir(dir.path())
            .with_trees(4)
            .build(&enc, &mut loader(10, 3))
            .unwrap();

        assert_eq!(artifacts.index.len(), 10);
        assert_eq!(artifacts.store.len(), 10);
        assert!(artifacts.index_path.exists());
        assert!(artifacts.store_path.exists());
        for id in 0..10 {
            assert_eq!(
                artifacts.index.get_item_vector(id).unwrap(),
                artifacts.store.coordinate(id).unwrap()
            );
        }
    }

    #[test]
    fn test_ids_follow_iteration_order() {
        let dir = TempDir::new().unwrap();
        let enc = encoder(3);
        let mut data = loader(5, 2);
        let artifacts = IndexBuilder::in_dir(dir.path())
            .with_trees(2)
            .build(&enc, &mut data)
            .unwrap();

        let batches: Vec<ImageBatch> = data.batches().collect::<Result<_>>().unwrap();
        let first = batches[0].sample(1);
        assert_eq!(artifacts.store.image(1).unwrap(), first.as_slice());
        let last = batches[2].sample(0);
        assert_eq!(artifacts.store.image(4).unwrap(), last.as_slice());
    }

    #[test]
    fn test_build_pads_narrow_latents() {
        let dir = TempDir::new().unwrap();
        let enc = encoder(2);
        let artifacts = IndexBuilder::in_dir(dir.path())
            .with_trees(2)
            .build(&enc, &mut loader(4, 4))
            .unwrap();

        let coord = artifacts.store.coordinate(0).unwrap().to_vec();
        assert_eq!(coord.len(), 2);
        let indexed = artifacts.index.get_item_vector(0).unwrap();
        assert_eq!(&indexed[..2], coord.as_slice());
        assert_eq!(indexed[2], 0.0);
    }

    #[test]
    fn test_build_reduces_wide_latents() {
        let dir = TempDir::new().unwrap();
        let enc = encoder(6);
        let artifacts = IndexBuilder::in_dir(dir.path())
            .with_trees(2)
            .with_tsne(TSne::new().with_iterations(50))
            .build(&enc, &mut loader(8, 4))
            .unwrap();

        assert_eq!(artifacts.store.z_dim(), 6);
        for id in 0..8 {
            assert_eq!(
                artifacts.index.get_item_vector(id).unwrap(),
                artifacts.store.index_coordinate(id).unwrap()
            );
            assert_eq!(artifacts.store.coordinate(id).unwrap().len(), 6);
        }
    }

    #[test]
    fn test_build_zero_trees_fails() {
        let dir = TempDir::new().unwrap();
        let enc = encoder(3);
        let result = IndexBuilder::in_dir(dir.path())
            .with_trees(0)
            .build(&enc, &mut loader(2, 2));
        assert!(result.is_err());
    }
}
