//! Results of training steps and epochs.

use std::fmt;
use std::path::PathBuf;

/// Scalar losses of one four-phase step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepLosses {
    /// Reconstruction (binary cross-entropy) loss
    pub dec_loss: f32,
    /// Discriminator loss
    pub disc_loss: f32,
    /// Encoder adversarial loss
    pub enc_loss: f32,
    /// Joint encoder+decoder squared-error loss
    pub gen_loss: f32,
}

impl StepLosses {
    /// Whether all four losses are finite
    pub fn is_finite(&self) -> bool {
        [self.dec_loss, self.disc_loss, self.enc_loss, self.gen_loss]
            .iter()
            .all(|v| v.is_finite())
    }
}

impl fmt::Display for StepLosses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Decoder_Loss: {:.4}\tDiscrim_Loss: {:.4}\tEncoder_Loss: {:.4}\tGenerator_Loss: {:.4}",
            self.dec_loss, self.disc_loss, self.enc_loss, self.gen_loss
        )
    }
}

/// Summary of one epoch of training
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// Epoch number as passed to `train`
    pub epoch: usize,
    /// Batches processed
    pub batches: usize,
    /// Losses of every batch, in order
    pub losses: Vec<StepLosses>,
    /// Visualisation written after the last batch, if any
    pub visualization: Option<PathBuf>,
}

impl EpochReport {
    /// Losses of the final batch
    pub fn last(&self) -> Option<StepLosses> {
        self.losses.last().copied()
    }

    /// Mean of each loss over the epoch
    pub fn mean(&self) -> StepLosses {
        let n = self.losses.len().max(1) as f32;
        let mut total = StepLosses::default();
        for l in &self.losses {
            total.dec_loss += l.dec_loss;
            total.disc_loss += l.disc_loss;
            total.enc_loss += l.enc_loss;
            total.gen_loss += l.gen_loss;
        }
        StepLosses {
            dec_loss: total.dec_loss / n,
            disc_loss: total.disc_loss / n,
            enc_loss: total.enc_loss / n,
            gen_loss: total.gen_loss / n,
        }
    }
}
