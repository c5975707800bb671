//! Latent-space index: build once from a trained encoder, then query
//!
//! ```text
//! loader ──► encoder ──► z [N, z_dim] ──► (t-SNE if z_dim > 3) ──► LatentIndex (3-D)
//!    │                      │                                         │ ids 0..N
//!    └──── images ──────────┴──────────────► PairedStore ◄────────────┘
//! ```
//!
//! [`SimilaritySearch`] reloads both artefacts and answers k-nearest queries,
//! rendering each neighbour's image to disk.

mod builder;
mod forest;
mod search;
mod store;
mod tsne;

pub use builder::{IndexArtifacts, IndexBuilder, DEFAULT_INDEX_FILE, DEFAULT_STORE_FILE};
pub use forest::{LatentIndex, DEFAULT_TREES, INDEX_DIM, LEAF_SIZE};
pub use search::{SearchResult, SimilaritySearch, DEFAULT_K};
pub use store::{PairedStore, STORE_FORMAT};
pub use tsne::{TSne, TSNE_DIM};
