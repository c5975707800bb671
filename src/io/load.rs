//! SafeTensors reading

use crate::{Error, Result};
use safetensors::tensor::Dtype;
use safetensors::SafeTensors;
use std::collections::HashMap;
use std::path::Path;

/// Decoded contents of a SafeTensors file
#[derive(Debug, Clone, Default)]
pub struct TensorFile {
    /// Tensors by name: shape and values
    pub tensors: HashMap<String, (Vec<usize>, Vec<f32>)>,
    /// Header metadata
    pub metadata: HashMap<String, String>,
}

impl TensorFile {
    /// Look up a tensor, failing with a serialization error if absent
    pub fn get(&self, name: &str) -> Result<&(Vec<usize>, Vec<f32>)> {
        self.tensors
            .get(name)
            .ok_or_else(|| Error::Serialization(format!("missing tensor '{name}'")))
    }

    /// Look up and parse a metadata entry
    pub fn meta<T: std::str::FromStr>(&self, key: &str) -> Result<T> {
        self.metadata
            .get(key)
            .ok_or_else(|| Error::Serialization(format!("missing metadata '{key}'")))?
            .parse()
            .map_err(|_| Error::Serialization(format!("invalid metadata '{key}'")))
    }
}

/// Read every `F32` tensor and the header metadata of `path`
pub fn read_safetensors(path: impl AsRef<Path>) -> Result<TensorFile> {
    let data = std::fs::read(path.as_ref())?;

    let (_, header) = SafeTensors::read_metadata(&data)?;
    let metadata = header.metadata().clone().unwrap_or_default();

    let safetensors = SafeTensors::deserialize(&data)?;
    let mut tensors = HashMap::new();
    for (name, view) in safetensors.tensors() {
        if view.dtype() != Dtype::F32 {
            return Err(Error::Serialization(format!(
                "tensor '{name}' has dtype {:?}, expected F32",
                view.dtype()
            )));
        }
        // The buffer is not guaranteed to be 4-byte aligned
        let values: Vec<f32> = view
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        tensors.insert(name, (view.shape().to_vec(), values));
    }

    Ok(TensorFile { tensors, metadata })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{write_safetensors, NamedTensor};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_round_trip_data_and_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.safetensors");
        let tensors = vec![
            NamedTensor::new("w", vec![2, 3], vec![0.1, -0.2, 0.3, 1e-7, f32::MAX, -0.0]),
            NamedTensor::new("b", vec![1], vec![42.0]),
        ];
        let mut meta = HashMap::new();
        meta.insert("epoch".to_string(), "5".to_string());
        write_safetensors(&path, &tensors, meta).unwrap();

        let file = read_safetensors(&path).unwrap();
        let (shape, values) = file.get("w").unwrap();
        assert_eq!(shape, &vec![2, 3]);
        assert_eq!(values, &tensors[0].data);
        assert_eq!(file.meta::<usize>("epoch").unwrap(), 5);
        assert!(file.get("missing").is_err());
        assert!(file.meta::<usize>("z_dim").is_err());
    }

    #[test]
    fn test_invalid_data_is_serialization_error() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"not valid safetensors binary data").unwrap();
        let err = read_safetensors(f.path()).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_safetensors("/nonexistent/file.safetensors").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
