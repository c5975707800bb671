//! Neural network building blocks for the adversarial autoencoder
//!
//! The training session is generic over [`Encoder`], [`Decoder`] and
//! [`Discriminator`]; the MLP implementations in [`mlp`] are the defaults.
//! Parameters are exposed as shared [`Tensor`] handles, so optimizers and
//! checkpoint loads update the model in place.

mod init;
mod linear;
mod mlp;

pub use init::{weight_init, xavier_bound};
pub use linear::Linear;
pub use mlp::{MlpDecoder, MlpDiscriminator, MlpEncoder, DISCRIMINATOR_SLOPE};

use crate::data::ImageShape;
use crate::Tensor;

/// A differentiable function with named, trainable parameters
pub trait Module {
    /// Forward pass, recording the graph when gradients are enabled
    fn forward(&self, input: &Tensor) -> Tensor;

    /// Parameters in a stable order with dotted names (`fc1.weight`)
    fn named_parameters(&self) -> Vec<(String, Tensor)>;

    /// Parameter handles in the same order as [`Module::named_parameters`]
    fn parameters(&self) -> Vec<Tensor> {
        self.named_parameters().into_iter().map(|(_, t)| t).collect()
    }

    /// Drop accumulated gradients on every parameter
    fn zero_grad(&self) {
        for param in self.parameters() {
            param.zero_grad();
        }
    }

    /// Total number of scalar parameters
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(Tensor::len).sum()
    }
}

/// Maps an image batch `[B, C, H, W]` to latent codes `[B, z_dim]`
pub trait Encoder: Module {
    /// Latent dimensionality
    fn z_dim(&self) -> usize;
}

/// Maps latent codes `[B, z_dim]` to images `[B, C, H, W]` in `[0, 1]`
pub trait Decoder: Module {
    /// Latent dimensionality
    fn z_dim(&self) -> usize;

    /// Geometry of produced images
    fn image_shape(&self) -> ImageShape;
}

/// Maps latent codes `[B, z_dim]` to "drawn from the prior" probabilities `[B, 1]`
pub trait Discriminator: Module {
    /// Latent dimensionality
    fn z_dim(&self) -> usize;
}

/// Prefix every parameter name of a child module
pub(crate) fn prefixed(prefix: &str, params: Vec<(String, Tensor)>) -> Vec<(String, Tensor)> {
    params
        .into_iter()
        .map(|(name, t)| (format!("{prefix}.{name}"), t))
        .collect()
}
