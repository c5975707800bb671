//! Batch loaders: in-memory and image-folder backed

use super::{ImageBatch, ImageShape};
use crate::imaging::image_to_tensor;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions picked up by [`ImageFolderLoader`]
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// One pass over a loader, yielding batches as they are produced
pub type Batches<'a> = Box<dyn Iterator<Item = Result<ImageBatch>> + 'a>;

/// Source of image batches
pub trait DataLoader {
    /// Batches for one full pass over the data, in iteration order
    ///
    /// Each batch is built when the iterator reaches it and is not kept by
    /// the loader afterwards.
    fn batches(&mut self) -> Batches<'_>;

    /// Geometry of every image yielded
    fn image_shape(&self) -> ImageShape;

    /// Number of samples per pass
    fn num_samples(&self) -> usize;
}

/// Loader over batches that are already in memory
#[derive(Debug, Clone)]
pub struct InMemoryLoader {
    batches: Vec<ImageBatch>,
    shape: ImageShape,
}

impl InMemoryLoader {
    /// Wrap pre-built batches
    ///
    /// Every batch must share `shape`.
    pub fn new(batches: Vec<ImageBatch>, shape: ImageShape) -> Result<Self> {
        for batch in &batches {
            if batch.image_shape() != Some(shape) {
                return Err(Error::shape(
                    "loader batch",
                    shape.batch_dims(batch.size()).to_vec(),
                    batch.images.shape().to_vec(),
                ));
            }
        }
        Ok(Self { batches, shape })
    }

    /// Chunk flat per-sample pixels into batches of `batch_size`
    ///
    /// The last batch is smaller when the sample count is not a multiple.
    pub fn from_samples(
        samples: Vec<(Vec<f32>, usize)>,
        shape: ImageShape,
        batch_size: usize,
    ) -> Result<Self> {
        let batch_size = batch_size.max(1);
        let mut batches = Vec::with_capacity(samples.len().div_ceil(batch_size));
        for chunk in samples.chunks(batch_size) {
            let mut pixels = Vec::with_capacity(chunk.len() * shape.numel());
            let mut labels = Vec::with_capacity(chunk.len());
            for (sample, label) in chunk {
                pixels.extend_from_slice(sample);
                labels.push(*label);
            }
            batches.push(ImageBatch::from_pixels(pixels, shape, labels)?);
        }
        Ok(Self { batches, shape })
    }

    /// Number of batches per pass
    pub fn num_batches(&self) -> usize {
        self.batches.len()
    }
}

impl DataLoader for InMemoryLoader {
    fn batches(&mut self) -> Batches<'_> {
        Box::new(self.batches.iter().cloned().map(Ok))
    }

    fn image_shape(&self) -> ImageShape {
        self.shape
    }

    fn num_samples(&self) -> usize {
        self.batches.iter().map(ImageBatch::size).sum()
    }
}

/// Loader over an on-disk image tree
///
/// Images directly under `root` get label 0. Each sub-directory is a class,
/// labelled by its position in sorted order, as torchvision's `ImageFolder`
/// does. Files are decoded, resized to the configured shape and converted to
/// channel-first `[0, 1]` floats one batch at a time on every pass.
#[derive(Debug)]
pub struct ImageFolderLoader {
    files: Vec<(PathBuf, usize)>,
    shape: ImageShape,
    batch_size: usize,
    rng: Option<StdRng>,
}

impl ImageFolderLoader {
    /// Scan `root` for images
    pub fn open(root: impl AsRef<Path>, shape: ImageShape, batch_size: usize) -> Result<Self> {
        let root = root.as_ref();
        let mut files = Vec::new();
        let mut class_dirs = Vec::new();

        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if path.is_dir() {
                class_dirs.push(path);
            } else if is_image(&path) {
                files.push((path, 0));
            }
        }
        files.sort();
        class_dirs.sort();

        for (label, dir) in class_dirs.iter().enumerate() {
            let mut class_files: Vec<(PathBuf, usize)> = fs::read_dir(dir)?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| is_image(p))
                .map(|p| (p, label))
                .collect();
            class_files.sort();
            files.extend(class_files);
        }

        tracing::debug!(
            root = %root.display(),
            images = files.len(),
            classes = class_dirs.len(),
            "scanned image folder"
        );

        Ok(Self {
            files,
            shape,
            batch_size: batch_size.max(1),
            rng: None,
        })
    }

    /// Shuffle sample order on every pass from a seeded RNG
    #[must_use]
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self
    }

    /// Discovered files and their labels, in unshuffled order
    pub fn files(&self) -> &[(PathBuf, usize)] {
        &self.files
    }

    fn load_batch(&self, chunk: &[usize]) -> Result<ImageBatch> {
        let mut pixels = Vec::with_capacity(chunk.len() * self.shape.numel());
        let mut labels = Vec::with_capacity(chunk.len());
        for &i in chunk {
            let (path, label) = &self.files[i];
            let img = image::open(path)?;
            pixels.extend(image_to_tensor(&img, self.shape)?);
            labels.push(*label);
        }
        ImageBatch::from_pixels(pixels, self.shape, labels)
    }
}

impl DataLoader for ImageFolderLoader {
    fn batches(&mut self) -> Batches<'_> {
        let mut order: Vec<usize> = (0..self.files.len()).collect();
        if let Some(rng) = self.rng.as_mut() {
            order.shuffle(rng);
        }

        let chunks: Vec<Vec<usize>> = order.chunks(self.batch_size).map(<[usize]>::to_vec).collect();
        let this = &*self;
        Box::new(chunks.into_iter().map(move |chunk| this.load_batch(&chunk)))
    }

    fn image_shape(&self) -> ImageShape {
        self.shape
    }

    fn num_samples(&self) -> usize {
        self.files.len()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_png(path: &Path, color: [u8; 3], size: u32) {
        RgbImage::from_pixel(size, size, Rgb(color)).save(path).unwrap();
    }

    #[test]
    fn test_from_samples_chunks_with_remainder() {
        let shape = ImageShape::new(1, 1, 2);
        let samples = (0..5).map(|i| (vec![i as f32 / 10.0; 2], i)).collect();
        let mut loader = InMemoryLoader::from_samples(samples, shape, 2).unwrap();

        let batches: Vec<ImageBatch> = loader.batches().collect::<Result<_>>().unwrap();
        let sizes: Vec<usize> = batches.iter().map(ImageBatch::size).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(loader.num_samples(), 5);
        assert_eq!(batches[2].labels, vec![4]);
    }

    #[test]
    fn test_in_memory_rejects_mismatched_batch() {
        let batch = ImageBatch::from_pixels(vec![0.0; 4], ImageShape::new(1, 2, 2), vec![0]).unwrap();
        assert!(InMemoryLoader::new(vec![batch], ImageShape::new(3, 2, 2)).is_err());
    }

    #[test]
    fn test_image_folder_labels_and_resize() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("cats")).unwrap();
        fs::create_dir(dir.path().join("dogs")).unwrap();
        write_png(&dir.path().join("cats/a.png"), [255, 0, 0], 8);
        write_png(&dir.path().join("dogs/b.png"), [0, 0, 255], 6);
        fs::write(dir.path().join("dogs/notes.txt"), "skip me").unwrap();

        let shape = ImageShape::new(3, 4, 4);
        let mut loader = ImageFolderLoader::open(dir.path(), shape, 8).unwrap();
        assert_eq!(loader.num_samples(), 2);

        let batches: Vec<ImageBatch> = loader.batches().collect::<Result<_>>().unwrap();
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert_eq!(batch.labels, vec![0, 1]);
        assert_eq!(batch.images.shape(), &[2, 3, 4, 4]);

        // First image is solid red: channel 0 ones, channel 2 zeros
        let red = batch.sample(0);
        assert!(red[..16].iter().all(|v| (*v - 1.0).abs() < 1e-6));
        assert!(red[32..].iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let dir = TempDir::new().unwrap();
        for i in 0..6u8 {
            write_png(&dir.path().join(format!("{i}.png")), [i * 40, 0, 0], 2);
        }
        let shape = ImageShape::new(3, 2, 2);
        let order = |seed| {
            let mut loader = ImageFolderLoader::open(dir.path(), shape, 1)
                .unwrap()
                .with_shuffle(seed);
            loader
                .batches()
                .map(|b| b.unwrap().sample(0)[0])
                .collect::<Vec<f32>>()
        };
        assert_eq!(order(3), order(3));
    }

    #[test]
    fn test_unreadable_image_fails_only_its_batch() {
        let dir = TempDir::new().unwrap();
        write_png(&dir.path().join("a.png"), [10, 20, 30], 2);
        fs::write(dir.path().join("b.png"), b"not a png").unwrap();
        let mut loader = ImageFolderLoader::open(dir.path(), ImageShape::new(3, 2, 2), 1).unwrap();

        let mut pass = loader.batches();
        assert_eq!(pass.next().unwrap().unwrap().size(), 1);
        assert!(pass.next().unwrap().is_err());
        assert!(pass.next().is_none());
    }
}
