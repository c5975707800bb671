//! Paired image / latent-coordinate store
//!
//! Rows share ids with the latent index: row `i` of every array belongs to
//! index item `i`.

use super::INDEX_DIM;
use crate::data::ImageShape;
use crate::io::{read_safetensors, write_safetensors, NamedTensor};
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Format tag written into the store metadata
pub const STORE_FORMAT: &str = "latente-store-v1";

const IMAGE: &str = "image";
const COORDINATE: &str = "coordinate";
const INDEX_COORDINATE: &str = "index_coordinate";

/// Images, raw latent vectors and index coordinates, addressed by id
#[derive(Debug, Clone, PartialEq)]
pub struct PairedStore {
    image_shape: ImageShape,
    z_dim: usize,
    images: Vec<f32>,
    coordinates: Vec<f32>,
    index_coordinates: Vec<f32>,
}

impl PairedStore {
    /// Empty store for images of `image_shape` and latent vectors of `z_dim`
    pub fn new(image_shape: ImageShape, z_dim: usize) -> Self {
        Self {
            image_shape,
            z_dim,
            images: Vec::new(),
            coordinates: Vec::new(),
            index_coordinates: Vec::new(),
        }
    }

    /// Append one row; returns its id
    pub fn push(
        &mut self,
        image: &[f32],
        coordinate: &[f32],
        index_coordinate: &[f32],
    ) -> Result<usize> {
        let shape = self.image_shape;
        if image.len() != shape.numel() {
            return Err(Error::shape(
                "store image",
                vec![shape.channels, shape.height, shape.width],
                vec![image.len()],
            ));
        }
        if coordinate.len() != self.z_dim {
            return Err(Error::shape("store coordinate", vec![self.z_dim], vec![coordinate.len()]));
        }
        if index_coordinate.len() != INDEX_DIM {
            return Err(Error::shape(
                "store index coordinate",
                vec![INDEX_DIM],
                vec![index_coordinate.len()],
            ));
        }
        let id = self.len();
        self.images.extend_from_slice(image);
        self.coordinates.extend_from_slice(coordinate);
        self.index_coordinates.extend_from_slice(index_coordinate);
        Ok(id)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        if self.z_dim == 0 {
            self.index_coordinates.len() / INDEX_DIM
        } else {
            self.coordinates.len() / self.z_dim
        }
    }

    /// Whether the store holds no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Geometry of stored images
    pub fn image_shape(&self) -> ImageShape {
        self.image_shape
    }

    /// Width of the raw latent vectors
    pub fn z_dim(&self) -> usize {
        self.z_dim
    }

    /// Channel-first pixels of row `id`
    pub fn image(&self, id: usize) -> Result<&[f32]> {
        self.row(&self.images, self.image_shape.numel(), id)
    }

    /// Raw latent vector of row `id`
    pub fn coordinate(&self, id: usize) -> Result<&[f32]> {
        self.row(&self.coordinates, self.z_dim, id)
    }

    /// The 3-D vector inserted into the index for row `id`
    pub fn index_coordinate(&self, id: usize) -> Result<&[f32]> {
        self.row(&self.index_coordinates, INDEX_DIM, id)
    }

    fn row<'a>(&self, data: &'a [f32], width: usize, id: usize) -> Result<&'a [f32]> {
        if id >= self.len() {
            return Err(Error::Index(format!(
                "id {id} out of range for store of {} rows",
                self.len()
            )));
        }
        Ok(&data[id * width..(id + 1) * width])
    }

    /// Persist as SafeTensors
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let n = self.len();
        let shape = self.image_shape;
        let tensors = [
            NamedTensor::new(IMAGE, shape.batch_dims(n).to_vec(), self.images.clone()),
            NamedTensor::new(COORDINATE, vec![n, self.z_dim], self.coordinates.clone()),
            NamedTensor::new(
                INDEX_COORDINATE,
                vec![n, INDEX_DIM],
                self.index_coordinates.clone(),
            ),
        ];
        let metadata = HashMap::from([
            ("format".to_string(), STORE_FORMAT.to_string()),
            ("count".to_string(), n.to_string()),
        ]);
        write_safetensors(path.as_ref(), &tensors, metadata)?;
        tracing::debug!(path = %path.as_ref().display(), rows = n, "wrote paired store");
        Ok(())
    }

    /// Read a store written by [`PairedStore::write`]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = read_safetensors(path.as_ref())?;
        let format: String = file.meta("format")?;
        if format != STORE_FORMAT {
            return Err(Error::Serialization(format!(
                "unexpected store format '{format}'"
            )));
        }
        let count: usize = file.meta("count")?;

        let (image_dims, images) = file.get(IMAGE)?;
        let image_shape = match image_dims.as_slice() {
            [n, c, h, w] if *n == count => ImageShape::new(*c, *h, *w),
            other => {
                return Err(Error::shape(
                    "store image array",
                    vec![count, 0, 0, 0],
                    other.to_vec(),
                ))
            }
        };

        let (coord_dims, coordinates) = file.get(COORDINATE)?;
        let z_dim = match coord_dims.as_slice() {
            [n, z] if *n == count => *z,
            other => {
                return Err(Error::shape(
                    "store coordinate array",
                    vec![count, 0],
                    other.to_vec(),
                ))
            }
        };

        let (index_dims, index_coordinates) = file.get(INDEX_COORDINATE)?;
        if index_dims.as_slice() != [count, INDEX_DIM] {
            return Err(Error::shape(
                "store index coordinate array",
                vec![count, INDEX_DIM],
                index_dims.clone(),
            ));
        }

        Ok(Self {
            image_shape,
            z_dim,
            images: images.clone(),
            coordinates: coordinates.clone(),
            index_coordinates: index_coordinates.clone(),
        })
    }
}
