//! Fully connected encoder, decoder and discriminator

use super::{prefixed, Decoder, Discriminator, Encoder, Linear, Module};
use crate::autograd::{leaky_relu, relu, sigmoid};
use crate::data::ImageShape;
use crate::device::Device;
use crate::Tensor;
use rand::Rng;

/// Negative slope of the discriminator's hidden activations
pub const DISCRIMINATOR_SLOPE: f32 = 0.2;

/// Image `[B, C, H, W]` → `fc → relu → fc → relu → fc` → latent `[B, z_dim]`
#[derive(Debug)]
pub struct MlpEncoder {
    fc1: Linear,
    fc2: Linear,
    fc3: Linear,
    z_dim: usize,
    device: Device,
}

impl MlpEncoder {
    /// Create an encoder for `image` with hidden width `h_dim`
    pub fn new<R: Rng>(
        image: ImageShape,
        h_dim: usize,
        z_dim: usize,
        device: Device,
        rng: &mut R,
    ) -> Self {
        Self {
            fc1: Linear::new(image.numel(), h_dim, rng),
            fc2: Linear::new(h_dim, h_dim, rng),
            fc3: Linear::new(h_dim, z_dim, rng),
            z_dim,
            device,
        }
    }

    /// Device the parameters live on
    pub fn device(&self) -> Device {
        self.device
    }
}

impl Module for MlpEncoder {
    fn forward(&self, input: &Tensor) -> Tensor {
        let h = relu(&self.fc1.forward(input));
        let h = relu(&self.fc2.forward(&h));
        self.fc3.forward(&h)
    }

    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        let mut params = prefixed("fc1", self.fc1.named_parameters());
        params.extend(prefixed("fc2", self.fc2.named_parameters()));
        params.extend(prefixed("fc3", self.fc3.named_parameters()));
        params
    }
}

impl Encoder for MlpEncoder {
    fn z_dim(&self) -> usize {
        self.z_dim
    }
}

/// Latent `[B, z_dim]` → `fc → relu → fc → relu → fc → sigmoid` → image `[B, C, H, W]`
#[derive(Debug)]
pub struct MlpDecoder {
    fc1: Linear,
    fc2: Linear,
    fc3: Linear,
    image: ImageShape,
    z_dim: usize,
    device: Device,
}

impl MlpDecoder {
    /// Create a decoder producing `image` from `z_dim` latents
    pub fn new<R: Rng>(
        image: ImageShape,
        h_dim: usize,
        z_dim: usize,
        device: Device,
        rng: &mut R,
    ) -> Self {
        Self {
            fc1: Linear::new(z_dim, h_dim, rng),
            fc2: Linear::new(h_dim, h_dim, rng),
            fc3: Linear::new(h_dim, image.numel(), rng),
            image,
            z_dim,
            device,
        }
    }

    /// Device the parameters live on
    pub fn device(&self) -> Device {
        self.device
    }
}

impl Module for MlpDecoder {
    fn forward(&self, input: &Tensor) -> Tensor {
        let h = relu(&self.fc1.forward(input));
        let h = relu(&self.fc2.forward(&h));
        let out = sigmoid(&self.fc3.forward(&h));
        let batch = out.len() / self.image.numel();
        out.reshape(&self.image.batch_dims(batch))
    }

    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        let mut params = prefixed("fc1", self.fc1.named_parameters());
        params.extend(prefixed("fc2", self.fc2.named_parameters()));
        params.extend(prefixed("fc3", self.fc3.named_parameters()));
        params
    }
}

impl Decoder for MlpDecoder {
    fn z_dim(&self) -> usize {
        self.z_dim
    }

    fn image_shape(&self) -> ImageShape {
        self.image
    }
}

/// Latent `[B, z_dim]` → `fc → leaky → fc → leaky → fc → sigmoid` → `[B, 1]`
#[derive(Debug)]
pub struct MlpDiscriminator {
    fc1: Linear,
    fc2: Linear,
    fc3: Linear,
    z_dim: usize,
    device: Device,
}

impl MlpDiscriminator {
    /// Create a discriminator over `z_dim` latents
    pub fn new<R: Rng>(h_dim: usize, z_dim: usize, device: Device, rng: &mut R) -> Self {
        Self {
            fc1: Linear::new(z_dim, h_dim, rng),
            fc2: Linear::new(h_dim, h_dim, rng),
            fc3: Linear::new(h_dim, 1, rng),
            z_dim,
            device,
        }
    }

    /// Device the parameters live on
    pub fn device(&self) -> Device {
        self.device
    }
}

impl Module for MlpDiscriminator {
    fn forward(&self, input: &Tensor) -> Tensor {
        let h = leaky_relu(&self.fc1.forward(input), DISCRIMINATOR_SLOPE);
        let h = leaky_relu(&self.fc2.forward(&h), DISCRIMINATOR_SLOPE);
        sigmoid(&self.fc3.forward(&h))
    }

    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        let mut params = prefixed("fc1", self.fc1.named_parameters());
        params.extend(prefixed("fc2", self.fc2.named_parameters()));
        params.extend(prefixed("fc3", self.fc3.named_parameters()));
        params
    }
}

impl Discriminator for MlpDiscriminator {
    fn z_dim(&self) -> usize {
        self.z_dim
    }
}
