//! Image batch data structures

use crate::{Error, Result, Tensor};
use serde::{Deserialize, Serialize};

/// Channel-first image geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    /// Number of channels (1 = grayscale, 3 = RGB)
    pub channels: usize,
    /// Height in pixels
    pub height: usize,
    /// Width in pixels
    pub width: usize,
}

impl ImageShape {
    /// Create a new shape
    pub const fn new(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
        }
    }

    /// Elements per image
    pub const fn numel(&self) -> usize {
        self.channels * self.height * self.width
    }

    /// Tensor shape for a batch of `batch` images
    pub fn batch_dims(&self, batch: usize) -> [usize; 4] {
        [batch, self.channels, self.height, self.width]
    }
}

impl Default for ImageShape {
    fn default() -> Self {
        Self::new(3, 32, 32)
    }
}

/// A batch of fixed-shape images in `[0, 1]` with (ignored) labels
#[derive(Clone, Debug)]
pub struct ImageBatch {
    /// Images, shape `[B, C, H, W]`
    pub images: Tensor,
    /// Class labels; carried for completeness, unused by training
    pub labels: Vec<usize>,
}

impl ImageBatch {
    /// Build a batch from flat channel-first pixel data
    pub fn from_pixels(pixels: Vec<f32>, shape: ImageShape, labels: Vec<usize>) -> Result<Self> {
        let batch = labels.len();
        if pixels.len() != batch * shape.numel() {
            return Err(Error::shape(
                "image batch",
                shape.batch_dims(batch).to_vec(),
                vec![pixels.len()],
            ));
        }
        let images = Tensor::from_shape(pixels, &shape.batch_dims(batch), false);
        Ok(Self { images, labels })
    }

    /// Number of images in the batch
    pub fn size(&self) -> usize {
        self.images.rows()
    }

    /// Geometry of the images, if the tensor is 4-D
    pub fn image_shape(&self) -> Option<ImageShape> {
        match self.images.shape() {
            [_, c, h, w] => Some(ImageShape::new(*c, *h, *w)),
            _ => None,
        }
    }

    /// Flat pixels of sample `i`
    pub fn sample(&self, i: usize) -> Vec<f32> {
        let row = self.images.row_len();
        self.images.data().iter().skip(i * row).take(row).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_creation() {
        let shape = ImageShape::new(1, 2, 2);
        let batch = ImageBatch::from_pixels(vec![0.5; 8], shape, vec![0, 1]).unwrap();
        assert_eq!(batch.size(), 2);
        assert_eq!(batch.image_shape(), Some(shape));
        assert_eq!(batch.images.shape(), &[2, 1, 2, 2]);
    }

    #[test]
    fn test_batch_size_mismatch() {
        let shape = ImageShape::new(3, 2, 2);
        let result = ImageBatch::from_pixels(vec![0.0; 10], shape, vec![0]);
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_sample_extracts_row() {
        let shape = ImageShape::new(1, 1, 2);
        let batch =
            ImageBatch::from_pixels(vec![0.1, 0.2, 0.3, 0.4], shape, vec![0, 0]).unwrap();
        assert_eq!(batch.sample(1), vec![0.3, 0.4]);
    }

    #[test]
    fn test_default_shape() {
        assert_eq!(ImageShape::default().numel(), 3 * 32 * 32);
    }
}
