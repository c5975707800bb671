//! Checkpoint save/load for a training session.
//!
//! A checkpoint is one SafeTensors file holding the three parameter groups
//! under `encoder.*`, `decoder.*` and `discrim.*`, with the next epoch number
//! in the header.

use super::AaeSession;
use crate::io::{read_safetensors, write_safetensors, NamedTensor, TensorFile};
use crate::nn::{Decoder, Discriminator, Encoder};
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Base file name used when none is given
pub const DEFAULT_CHECKPOINT_NAME: &str = "aae.safetensors";

/// Value of the `format` metadata entry
pub const CHECKPOINT_FORMAT: &str = "latente-aae-v1";

/// File name for the checkpoint of `epoch`
pub fn checkpoint_file_name(epoch: usize, base_name: &str) -> String {
    format!("epoch{epoch}_{base_name}")
}

impl<E: Encoder, D: Decoder, C: Discriminator> AaeSession<E, D, C> {
    /// Save all three networks after `epoch`
    ///
    /// Writes `{checkpoint_dir}/epoch{epoch}_{base_name}`; the stored next
    /// epoch is `epoch + 1`.
    pub fn save(&self, epoch: usize, base_name: &str) -> Result<PathBuf> {
        let path = self
            .config
            .checkpoint_dir
            .join(checkpoint_file_name(epoch, base_name));

        let tensors: Vec<NamedTensor> = self
            .named_parameters()
            .into_iter()
            .map(|(name, t)| NamedTensor::new(name, t.shape().to_vec(), t.to_vec()))
            .collect();

        let mut metadata = HashMap::new();
        metadata.insert("epoch".to_string(), (epoch + 1).to_string());
        metadata.insert("z_dim".to_string(), self.z_dim().to_string());
        metadata.insert("format".to_string(), CHECKPOINT_FORMAT.to_string());

        write_safetensors(&path, &tensors, metadata)?;
        tracing::info!(epoch, path = %path.display(), "Saved model state");
        Ok(path)
    }

    /// Restore all three networks and the start epoch from `path`
    ///
    /// A missing file yields [`Error::CheckpointNotFound`]. Every tensor is
    /// checked against the current networks before any parameter is written,
    /// so on error the session is unchanged.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !path.is_file() {
            tracing::warn!(path = %path.display(), "Cant find checkpoint file");
            return Err(Error::CheckpointNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = read_safetensors(path)?;
        let next_epoch: usize = file.meta("epoch")?;
        let z_dim: usize = file.meta("z_dim")?;
        if z_dim != self.z_dim() {
            return Err(Error::shape("checkpoint z_dim", vec![self.z_dim()], vec![z_dim]));
        }

        let params = self.named_parameters();
        let mut updates = Vec::with_capacity(params.len());
        for (name, tensor) in &params {
            updates.push((tensor, validated(&file, name, tensor.len())?));
        }
        if file.tensors.len() != params.len() {
            return Err(Error::Serialization(format!(
                "checkpoint holds {} tensors, session has {}",
                file.tensors.len(),
                params.len()
            )));
        }

        for (tensor, values) in updates {
            for (dst, src) in tensor.data_mut().iter_mut().zip(values) {
                *dst = *src;
            }
        }
        self.start_epoch = next_epoch;

        tracing::info!(path = %path.display(), start_epoch = next_epoch, "Model state loaded");
        Ok(())
    }
}

fn validated<'a>(file: &'a TensorFile, name: &str, len: usize) -> Result<&'a [f32]> {
    let (_, values) = file.get(name)?;
    if values.len() != len {
        return Err(Error::shape(name, vec![len], vec![values.len()]));
    }
    Ok(values)
}
