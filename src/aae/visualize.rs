//! Per-epoch training visualisation.

use super::AaeSession;
use crate::autograd::{no_grad, select_rows};
use crate::imaging::{side_by_side, tensor_to_rgb};
use crate::nn::{Decoder, Discriminator, Encoder, Module};
use crate::{Error, Result, Tensor};
use rand::Rng;
use std::fs;
use std::path::PathBuf;

impl<E: Encoder, D: Decoder, C: Discriminator> AaeSession<E, D, C> {
    /// Render one random sample as original | decoded
    ///
    /// Picks an index into the batch with the session RNG, decodes `z` at that
    /// index and writes `{visualize_dir}/{epoch}.png`, creating the directory
    /// if needed.
    pub fn visualize(&mut self, z: &Tensor, origin: &Tensor, epoch: usize) -> Result<PathBuf> {
        let batch = z.rows();
        if batch == 0 || origin.rows() != batch {
            return Err(Error::shape(
                "visualization batch",
                vec![batch],
                vec![origin.rows()],
            ));
        }
        let idx = self.rng.random_range(0..batch);

        let decoded = no_grad(|| self.decoder.forward(&select_rows(z, &[idx])));
        let shape = self.decoder.image_shape();
        let original = select_rows(origin, &[idx]);

        let panel = side_by_side(&[
            tensor_to_rgb(&original.to_vec(), shape)?,
            tensor_to_rgb(&decoded.to_vec(), shape)?,
        ]);

        fs::create_dir_all(&self.config.visualize_dir)?;
        let path = self.config.visualize_dir.join(format!("{epoch}.png"));
        panel.save(&path)?;
        tracing::debug!(epoch, sample = idx, path = %path.display(), "wrote visualization");
        Ok(path)
    }
}
