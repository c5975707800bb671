//! AAE training session: models, optimizers and randomness in one owner.

use super::{AaeConfig, AaeStats, LatentCode};
use crate::autograd::no_grad;
use crate::device::Device;
use crate::imaging::tensor_to_rgb;
use crate::nn::{
    Decoder, Discriminator, Encoder, MlpDecoder, MlpDiscriminator, MlpEncoder, Module,
};
use crate::optim::Adam;
use crate::{Error, Result, Tensor};
use image::RgbImage;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Adversarial autoencoder session
///
/// Owns the encoder, decoder and discriminator together with one Adam
/// optimizer per parameter group (encoder, decoder, discriminator and the
/// joint encoder+decoder group). The session RNG drives prior sampling and
/// visualisation picks.
pub struct AaeSession<E = MlpEncoder, D = MlpDecoder, C = MlpDiscriminator> {
    /// Configuration
    pub config: AaeConfig,
    pub(super) encoder: E,
    pub(super) decoder: D,
    pub(super) discrim: C,
    pub(super) optim_enc: Adam,
    pub(super) optim_dec: Adam,
    pub(super) optim_dis: Adam,
    pub(super) optim_gen: Adam,
    pub(super) rng: StdRng,
    pub(super) device: Device,
    pub(super) start_epoch: usize,
    /// Training statistics
    pub stats: AaeStats,
}

impl AaeSession {
    /// Create a session with the default MLP networks
    ///
    /// Weights are initialized from `config.seed` when set, otherwise from OS
    /// entropy.
    pub fn new(config: AaeConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let device = Device::resolve(config.prefer_cuda);
        let encoder = MlpEncoder::new(config.image, config.h_dim, config.z_dim, device, &mut rng);
        let decoder = MlpDecoder::new(config.image, config.h_dim, config.z_dim, device, &mut rng);
        let discrim = MlpDiscriminator::new(config.h_dim, config.z_dim, device, &mut rng);

        tracing::debug!(
            z_dim = config.z_dim,
            h_dim = config.h_dim,
            encoder_params = encoder.num_parameters(),
            decoder_params = decoder.num_parameters(),
            discrim_params = discrim.num_parameters(),
            %device,
            "initialized AAE networks"
        );

        Self::assemble(config, encoder, decoder, discrim, rng, device)
    }
}

impl<E: Encoder, D: Decoder, C: Discriminator> AaeSession<E, D, C> {
    /// Create a session around caller-built networks
    ///
    /// All three must agree on the latent dimension, and the decoder must
    /// produce images of `config.image`.
    pub fn from_models(
        config: AaeConfig,
        encoder: E,
        decoder: D,
        discrim: C,
        rng: StdRng,
    ) -> Result<Self> {
        let z = encoder.z_dim();
        if decoder.z_dim() != z || discrim.z_dim() != z || config.z_dim != z {
            return Err(Error::shape(
                "latent dimension",
                vec![config.z_dim],
                vec![z, decoder.z_dim(), discrim.z_dim()],
            ));
        }
        if decoder.image_shape() != config.image {
            let s = decoder.image_shape();
            return Err(Error::shape(
                "decoder image",
                vec![config.image.channels, config.image.height, config.image.width],
                vec![s.channels, s.height, s.width],
            ));
        }
        let device = Device::resolve(config.prefer_cuda);
        Ok(Self::assemble(config, encoder, decoder, discrim, rng, device))
    }

    fn assemble(
        config: AaeConfig,
        encoder: E,
        decoder: D,
        discrim: C,
        rng: StdRng,
        device: Device,
    ) -> Self {
        let lr = config.lr;
        Self {
            config,
            encoder,
            decoder,
            discrim,
            optim_enc: Adam::default_params(lr),
            optim_dec: Adam::default_params(lr),
            optim_dis: Adam::default_params(lr),
            optim_gen: Adam::default_params(lr),
            rng,
            device,
            start_epoch: 0,
            stats: AaeStats::default(),
        }
    }

    /// Encoder network
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Decoder network
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Discriminator network
    pub fn discriminator(&self) -> &C {
        &self.discrim
    }

    /// Resolved device
    pub fn device(&self) -> Device {
        self.device
    }

    /// Epoch to resume from (set by loading a checkpoint)
    pub fn start_epoch(&self) -> usize {
        self.start_epoch
    }

    /// Latent dimension
    pub fn z_dim(&self) -> usize {
        self.encoder.z_dim()
    }

    /// All parameters of the three networks, with model-prefixed names
    pub fn named_parameters(&self) -> Vec<(String, Tensor)> {
        let mut params = crate::nn::prefixed("encoder", self.encoder.named_parameters());
        params.extend(crate::nn::prefixed("decoder", self.decoder.named_parameters()));
        params.extend(crate::nn::prefixed("discrim", self.discrim.named_parameters()));
        params
    }

    /// Check every parameter for NaN/Inf
    pub fn check_finite(&self) -> Result<()> {
        let params = self.named_parameters();
        crate::autograd::check_finite(params.iter().map(|(n, t)| (n.as_str(), t)))
    }

    /// Drop gradients on all three networks
    pub fn reset_gradients(&self) {
        self.encoder.zero_grad();
        self.decoder.zero_grad();
        self.discrim.zero_grad();
    }

    /// Encode a batch `[B, C, H, W]` without recording a graph
    pub fn encode(&self, images: &Tensor) -> Tensor {
        no_grad(|| self.encoder.forward(images))
    }

    /// Decode an arbitrary latent coordinate to an image
    pub fn generate(&self, z: &LatentCode) -> Result<RgbImage> {
        if z.dim() != self.z_dim() {
            return Err(Error::shape("latent code", vec![self.z_dim()], vec![z.dim()]));
        }
        let decoded = no_grad(|| self.decoder.forward(&z.to_tensor()));
        tensor_to_rgb(&decoded.to_vec(), self.decoder.image_shape())
    }

    /// Encode one channel-first image and decode it back
    pub fn reconstruct(&self, pixels: &[f32]) -> Result<RgbImage> {
        let shape = self.config.image;
        if pixels.len() != shape.numel() {
            return Err(Error::shape(
                "image",
                vec![shape.channels, shape.height, shape.width],
                vec![pixels.len()],
            ));
        }
        let image = Tensor::from_shape(pixels.to_vec(), &shape.batch_dims(1), false);
        let z = self.encode(&image);
        self.generate(&LatentCode::new(z.to_vec()))
    }
}
