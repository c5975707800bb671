//! SafeTensors persistence shared by checkpoints and the paired data store
//!
//! All tensors are little-endian `F32`. Writes go to a temporary sibling
//! file that is renamed into place, so a reader never sees a half-written
//! artefact.

mod load;
mod save;

pub use load::{read_safetensors, TensorFile};
pub use save::{write_safetensors, NamedTensor};
