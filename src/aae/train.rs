//! The four-phase adversarial training loop.
//!
//! Each phase rebuilds its graph from the current parameters, backpropagates,
//! steps only its own optimizer group and then clears the gradients of all
//! three networks before the next phase runs.

use super::latent::sample_prior;
use super::{AaeSession, EpochReport, StepLosses};
use crate::autograd::{
    add, add_scalar, backward, binary_cross_entropy, log_eps, mean, scale,
    sum_squared_error_per_sample,
};
use crate::data::{DataLoader, ImageBatch};
use crate::nn::{Decoder, Discriminator, Encoder, Module};
use crate::optim::Optimizer;
use crate::{Result, Tensor};

/// `-mean(ln(D(z_real) + ε) + ln(1 - D(z_fake) + ε))`
fn discriminator_loss(d_real: &Tensor, d_fake: &Tensor) -> Tensor {
    let one_minus_fake = add_scalar(&scale(d_fake, -1.0), 1.0);
    scale(&mean(&add(&log_eps(d_real), &log_eps(&one_minus_fake))), -1.0)
}

/// `-mean(ln(D(z_fake) + ε))`
fn encoder_adversarial_loss(d_fake: &Tensor) -> Tensor {
    scale(&mean(&log_eps(d_fake)), -1.0)
}

impl<E: Encoder, D: Decoder, C: Discriminator> AaeSession<E, D, C> {
    /// Phase 1: binary cross-entropy reconstruction; steps encoder and decoder
    pub fn reconstruction_phase(&mut self, batch: &ImageBatch) -> f32 {
        let z = self.encoder.forward(&batch.images);
        let reconstructed = self.decoder.forward(&z);
        let loss = binary_cross_entropy(&reconstructed, &batch.images);
        backward(&loss, None);

        self.optim_enc.step(&self.encoder.parameters());
        self.optim_dec.step(&self.decoder.parameters());
        self.reset_gradients();
        loss.item()
    }

    /// Phase 2: discriminator separates prior draws from encoded codes;
    /// steps the discriminator only
    pub fn discriminator_phase(&mut self, batch: &ImageBatch) -> f32 {
        let z_fake = self.encoder.forward(&batch.images);
        let z_real = sample_prior(&mut self.rng, batch.size(), self.encoder.z_dim());

        let d_fake = self.discrim.forward(&z_fake);
        let d_real = self.discrim.forward(&z_real);
        let loss = discriminator_loss(&d_real, &d_fake);
        backward(&loss, None);

        self.optim_dis.step(&self.discrim.parameters());
        self.reset_gradients();
        loss.item()
    }

    /// Phase 3: encoder tries to fool the discriminator; steps the encoder only
    ///
    /// Returns the loss and the (detached) latent codes of this phase, which
    /// the epoch's visualisation decodes.
    pub fn encoder_phase(&mut self, batch: &ImageBatch) -> (f32, Tensor) {
        let z_fake = self.encoder.forward(&batch.images);
        let d_fake = self.discrim.forward(&z_fake);
        let loss = encoder_adversarial_loss(&d_fake);
        backward(&loss, None);

        self.optim_enc.step(&self.encoder.parameters());
        self.reset_gradients();
        (loss.item(), z_fake.detach())
    }

    /// Phase 4: per-sample summed squared error through encoder and decoder;
    /// steps the joint encoder+decoder group
    pub fn generator_phase(&mut self, batch: &ImageBatch) -> f32 {
        let reconstructed = self.decoder.forward(&self.encoder.forward(&batch.images));
        let loss = sum_squared_error_per_sample(&reconstructed, &batch.images, batch.size());
        backward(&loss, None);

        let mut generator_params = self.encoder.parameters();
        generator_params.extend(self.decoder.parameters());
        self.optim_gen.step(&generator_params);
        self.reset_gradients();
        loss.item()
    }

    /// Run all four phases on one batch
    pub fn train_step(&mut self, batch: &ImageBatch) -> StepLosses {
        self.run_phases(batch).0
    }

    fn run_phases(&mut self, batch: &ImageBatch) -> (StepLosses, Tensor) {
        let dec_loss = self.reconstruction_phase(batch);
        let disc_loss = self.discriminator_phase(batch);
        let (enc_loss, z_fake) = self.encoder_phase(batch);
        let gen_loss = self.generator_phase(batch);

        let losses = StepLosses {
            dec_loss,
            disc_loss,
            enc_loss,
            gen_loss,
        };
        self.stats.record(&losses);
        (losses, z_fake)
    }

    /// Train for one epoch over every batch of `loader`
    ///
    /// Each batch logs its four losses (NaN is reported as-is). After the last
    /// batch one random sample is visualised; a failed visualisation is logged
    /// and does not fail the epoch. Loader and finite-check errors do.
    pub fn train<L: DataLoader + ?Sized>(
        &mut self,
        loader: &mut L,
        epoch: usize,
    ) -> Result<EpochReport> {
        let mut losses = Vec::new();
        let mut last = None;

        for (idx, batch) in loader.batches().enumerate() {
            let batch = batch?;
            let (step, z_fake) = self.run_phases(&batch);
            tracing::info!(
                epoch,
                batch = idx,
                dec_loss = step.dec_loss,
                disc_loss = step.disc_loss,
                enc_loss = step.enc_loss,
                gen_loss = step.gen_loss,
                "Epoch: {epoch}\t{step}"
            );
            if self.config.check_finite {
                self.check_finite()?;
            }
            losses.push(step);
            last = Some((z_fake, batch));
        }

        let visualization = match last {
            Some((z_fake, batch)) => match self.visualize(&z_fake, &batch.images, epoch) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(epoch, error = %e, "visualization failed");
                    None
                }
            },
            None => {
                tracing::warn!(epoch, "loader yielded no batches, nothing to train on");
                None
            }
        };

        Ok(EpochReport {
            epoch,
            batches: losses.len(),
            losses,
            visualization,
        })
    }
}
