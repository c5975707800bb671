//! Latente: adversarial autoencoders with a searchable latent space
//!
//! Train an encoder/decoder pair whose latent codes are pushed toward a
//! standard normal prior by a discriminator, then index the encoded
//! training set and look up the images nearest to any latent coordinate.
//!
//! # Modules
//!
//! - [`autograd`]: tape-based reverse-mode differentiation
//! - [`nn`]: linear layers and the MLP encoder, decoder and discriminator
//! - [`optim`]: Adam
//! - [`aae`]: the four-phase training session, checkpoints and visualisation
//! - [`data`]: image batches and loaders
//! - [`index`]: random-projection forest, t-SNE, paired store and search
//! - [`io`]: SafeTensors persistence
//! - [`config`] / [`cli`]: YAML configuration and the `latente` binary

pub mod aae;
pub mod autograd;
pub mod cli;
pub mod config;
pub mod data;
pub mod device;
pub mod error;
pub mod imaging;
pub mod index;
pub mod io;
pub mod nn;
pub mod optim;

pub use autograd::Tensor;
pub use error::{Error, Result};
