//! SafeTensors writing

use crate::Result;
use safetensors::tensor::{Dtype, TensorView};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A tensor queued for serialization
#[derive(Debug, Clone)]
pub struct NamedTensor {
    /// Tensor name in the file
    pub name: String,
    /// Logical shape
    pub shape: Vec<usize>,
    /// Row-major values
    pub data: Vec<f32>,
}

impl NamedTensor {
    /// Create a named tensor
    pub fn new(name: impl Into<String>, shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            shape,
            data,
        }
    }
}

/// Serialize `tensors` with header `metadata` to `path`
///
/// The bytes land in `<path>.tmp` first and are renamed over `path`.
///
/// # Example
///
/// ```no_run
/// use latente::io::{write_safetensors, NamedTensor};
/// use std::collections::HashMap;
///
/// let tensors = vec![NamedTensor::new("weight", vec![2], vec![1.0, 2.0])];
/// write_safetensors("model.safetensors", &tensors, HashMap::new()).unwrap();
/// ```
pub fn write_safetensors(
    path: impl AsRef<Path>,
    tensors: &[NamedTensor],
    metadata: HashMap<String, String>,
) -> Result<()> {
    let path = path.as_ref();

    let bytes: Vec<Vec<u8>> = tensors
        .iter()
        .map(|t| bytemuck::cast_slice(&t.data).to_vec())
        .collect();

    let mut views = Vec::with_capacity(tensors.len());
    for (tensor, data) in tensors.iter().zip(&bytes) {
        let view = TensorView::new(Dtype::F32, tensor.shape.clone(), data)?;
        views.push((tensor.name.as_str(), view));
    }

    let serialized = safetensors::serialize(views, Some(metadata))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, serialized)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
