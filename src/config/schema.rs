//! YAML schema for adversarial autoencoder runs

use crate::aae::{AaeConfig, DEFAULT_CHECKPOINT_NAME};
use crate::data::ImageShape;
use crate::index::{DEFAULT_INDEX_FILE, DEFAULT_K, DEFAULT_STORE_FILE, DEFAULT_TREES};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete run specification
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AaeSpec {
    /// Network geometry
    #[serde(default)]
    pub model: ModelSpec,

    /// Training images
    #[serde(default)]
    pub data: DataSpec,

    /// Optimizer settings shared by all four parameter groups
    #[serde(default)]
    pub optimizer: OptimSpec,

    /// Epochs, checkpoints and output locations
    #[serde(default)]
    pub training: TrainingSpec,

    /// Latent index and search settings
    #[serde(default)]
    pub index: IndexSpec,
}

/// Network geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSpec {
    /// Latent dimension
    pub z_dim: usize,
    /// Hidden width of every network
    pub h_dim: usize,
    /// Image channels (1 or 3)
    pub channels: usize,
    /// Image height in pixels
    pub height: usize,
    /// Image width in pixels
    pub width: usize,
}

impl Default for ModelSpec {
    fn default() -> Self {
        let image = ImageShape::default();
        Self {
            z_dim: 3,
            h_dim: 128,
            channels: image.channels,
            height: image.height,
            width: image.width,
        }
    }
}

impl ModelSpec {
    /// Geometry of the images the networks consume and produce
    pub fn image_shape(&self) -> ImageShape {
        ImageShape::new(self.channels, self.height, self.width)
    }
}

/// Training images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSpec {
    /// Image folder root; sub-directories are class labels
    pub train: PathBuf,
    /// Batch size
    pub batch_size: usize,
    /// Shuffle file order every pass
    pub shuffle: bool,
}

impl Default for DataSpec {
    fn default() -> Self {
        Self {
            train: PathBuf::from("data"),
            batch_size: 32,
            shuffle: true,
        }
    }
}

/// Optimizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimSpec {
    /// Learning rate
    pub lr: f32,
}

impl Default for OptimSpec {
    fn default() -> Self {
        Self { lr: 1e-3 }
    }
}

/// Training schedule and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSpec {
    /// Number of epochs
    pub epochs: usize,
    /// Save a checkpoint every N epochs (0 saves only at the end)
    pub save_every: usize,
    /// Directory checkpoints are written to
    pub output_dir: PathBuf,
    /// Base name of checkpoint files
    pub checkpoint_name: String,
    /// Directory for per-epoch visualisations
    pub visualize_dir: PathBuf,
    /// Fail when parameters become NaN/Inf
    pub check_finite: bool,
    /// Seed for weights, prior samples and shuffling
    pub seed: Option<u64>,
    /// Ask for a CUDA device
    pub prefer_cuda: bool,
}

impl Default for TrainingSpec {
    fn default() -> Self {
        Self {
            epochs: 10,
            save_every: 1,
            output_dir: PathBuf::from("checkpoints"),
            checkpoint_name: DEFAULT_CHECKPOINT_NAME.to_string(),
            visualize_dir: PathBuf::from("visualize"),
            check_finite: false,
            seed: None,
            prefer_cuda: false,
        }
    }
}

/// Latent index and search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSpec {
    /// Index file
    pub index_path: PathBuf,
    /// Paired image/coordinate store
    pub store_path: PathBuf,
    /// Number of trees
    pub n_trees: usize,
    /// Neighbours returned by a search
    pub k: usize,
    /// Where search results are rendered (system temp dir when unset)
    pub output_dir: Option<PathBuf>,
    /// t-SNE perplexity for latent spaces wider than the index
    pub perplexity: f64,
    /// t-SNE iterations
    pub tsne_iterations: usize,
}

impl Default for IndexSpec {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from(DEFAULT_INDEX_FILE),
            store_path: PathBuf::from(DEFAULT_STORE_FILE),
            n_trees: DEFAULT_TREES,
            k: DEFAULT_K,
            output_dir: None,
            perplexity: 30.0,
            tsne_iterations: 1000,
        }
    }
}

impl AaeSpec {
    /// Session configuration derived from this spec
    pub fn aae_config(&self) -> AaeConfig {
        AaeConfig {
            z_dim: self.model.z_dim,
            h_dim: self.model.h_dim,
            image: self.model.image_shape(),
            lr: self.optimizer.lr,
            seed: self.training.seed,
            prefer_cuda: self.training.prefer_cuda,
            check_finite: self.training.check_finite,
            visualize_dir: self.training.visualize_dir.clone(),
            checkpoint_dir: self.training.output_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_all_defaults() {
        let spec: AaeSpec = serde_yaml::from_str("{}").unwrap();
        assert_eq!(spec, AaeSpec::default());
        assert_eq!(spec.model.z_dim, 3);
        assert_eq!(spec.index.n_trees, 32);
        assert_eq!(spec.index.k, 50);
    }

    #[test]
    fn test_partial_section() {
        let yaml = "
model:
  z_dim: 8
training:
  epochs: 2
  seed: 11
";
        let spec: AaeSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.model.z_dim, 8);
        assert_eq!(spec.model.h_dim, 128);
        assert_eq!(spec.training.epochs, 2);
        assert_eq!(spec.training.seed, Some(11));
        assert_eq!(spec.data.batch_size, 32);
    }

    #[test]
    fn test_aae_config_mapping() {
        let mut spec = AaeSpec::default();
        spec.model.channels = 1;
        spec.optimizer.lr = 0.01;
        spec.training.output_dir = PathBuf::from("out");

        let config = spec.aae_config();
        assert_eq!(config.image, ImageShape::new(1, 32, 32));
        assert_eq!(config.lr, 0.01);
        assert_eq!(config.checkpoint_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let spec = AaeSpec::default();
        let yaml = serde_yaml::to_string(&spec).unwrap();
        let back: AaeSpec = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, spec);
    }
}
