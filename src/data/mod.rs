//! Image data for training and indexing
//!
//! A [`DataLoader`] yields one full pass of [`ImageBatch`]es per call. Training
//! and index building both consume a loader; neither retains batches.

mod batch;
mod loader;

pub use batch::{ImageBatch, ImageShape};
pub use loader::{Batches, DataLoader, ImageFolderLoader, InMemoryLoader, IMAGE_EXTENSIONS};
