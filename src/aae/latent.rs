//! Latent codes and the standard normal prior.

use crate::Tensor;
use rand::Rng;

/// Latent code representation (vector in latent space)
#[derive(Debug, Clone, PartialEq)]
pub struct LatentCode {
    /// The latent vector
    pub vector: Vec<f32>,
}

impl LatentCode {
    /// Create a new latent code from a vector
    #[must_use]
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }

    /// Dimension of the latent code
    #[must_use]
    pub fn dim(&self) -> usize {
        self.vector.len()
    }

    /// As a `[1, dim]` tensor for decoding
    pub fn to_tensor(&self) -> Tensor {
        Tensor::from_shape(self.vector.clone(), &[1, self.dim()], false)
    }
}

/// One draw from N(0, 1) by Box-Muller
fn standard_normal<R: Rng>(rng: &mut R) -> f32 {
    let u1: f64 = rng.random::<f64>().max(1e-10);
    let u2: f64 = rng.random::<f64>();
    ((-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()) as f32
}

/// `[batch, z_dim]` tensor of i.i.d. standard normal draws
pub fn sample_prior<R: Rng>(rng: &mut R, batch: usize, z_dim: usize) -> Tensor {
    let data = (0..batch * z_dim).map(|_| standard_normal(rng)).collect();
    Tensor::from_shape(data, &[batch, z_dim], false)
}
