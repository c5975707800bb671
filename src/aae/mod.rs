//! Adversarial autoencoder
//!
//! An encoder maps images to a low-dimensional latent space, a decoder maps
//! latent codes back to images, and a discriminator pushes the distribution of
//! encoded codes toward a standard normal prior.
//!
//! # Architecture
//!
//! ```text
//! image ─► Encoder ─► z_fake ─┬─► Decoder ─► reconstruction
//!                             │
//!                             └─► Discriminator ◄── z_real ~ N(0, I)
//! ```
//!
//! Every batch runs four phases in order, each with its own optimizer:
//! reconstruction (encoder + decoder), discriminator, encoder adversarial and
//! joint generator (encoder + decoder group).
//!
//! # Example
//!
//! ```
//! use latente::aae::{AaeConfig, AaeSession};
//! use latente::data::{ImageBatch, ImageShape};
//!
//! let image = ImageShape::new(3, 4, 4);
//! let config = AaeConfig { image, h_dim: 8, seed: Some(42), ..Default::default() };
//! let mut session = AaeSession::new(config);
//!
//! let batch = ImageBatch::from_pixels(vec![0.5; 2 * image.numel()], image, vec![0, 0]).unwrap();
//! let losses = session.train_step(&batch);
//! assert!(losses.is_finite());
//! ```

mod checkpoint;
mod config;
mod latent;
mod session;
mod stats;
mod train;
mod training_result;
mod visualize;


pub use checkpoint::{checkpoint_file_name, CHECKPOINT_FORMAT, DEFAULT_CHECKPOINT_NAME};
pub use config::AaeConfig;
pub use latent::{sample_prior, LatentCode};
pub use session::AaeSession;
pub use stats::{AaeStats, HISTORY_LEN};
pub use training_result::{EpochReport, StepLosses};
