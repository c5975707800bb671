//! Configuration for an adversarial autoencoder session.

use crate::data::ImageShape;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the complete adversarial autoencoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AaeConfig {
    /// Dimension of the latent space
    pub z_dim: usize,
    /// Hidden layer width shared by all three networks
    pub h_dim: usize,
    /// Input image geometry
    pub image: ImageShape,
    /// Learning rate for all four optimizers
    pub lr: f32,
    /// Seed for weight init, prior sampling and visualisation picks
    pub seed: Option<u64>,
    /// Ask for a CUDA device (falls back to CPU)
    pub prefer_cuda: bool,
    /// Check parameters for NaN/Inf after every batch
    pub check_finite: bool,
    /// Directory for per-epoch visualisation images
    pub visualize_dir: PathBuf,
    /// Directory checkpoints are written to
    pub checkpoint_dir: PathBuf,
}

impl Default for AaeConfig {
    fn default() -> Self {
        Self {
            z_dim: 3,
            h_dim: 128,
            image: ImageShape::default(),
            lr: 1e-3,
            seed: None,
            prefer_cuda: false,
            check_finite: false,
            visualize_dir: PathBuf::from("visualize"),
            checkpoint_dir: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aae_config_default() {
        let config = AaeConfig::default();
        assert_eq!(config.z_dim, 3);
        assert_eq!(config.h_dim, 128);
        assert!(config.lr > 0.0);
        assert!(!config.check_finite);
        assert_eq!(config.visualize_dir, PathBuf::from("visualize"));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: AaeConfig = serde_yaml::from_str("z_dim: 8\nseed: 7\n").unwrap();
        assert_eq!(config.z_dim, 8);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.h_dim, 128);
    }
}
