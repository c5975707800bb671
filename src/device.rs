//! Compute device placement
//!
//! The device is resolved once when a session is built and carried by the
//! models; operations never decide placement on their own.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where tensors of a session live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Host memory, CPU kernels
    #[default]
    Cpu,
}

impl Device {
    /// Resolve the device for a session
    ///
    /// The autograd backend only ships CPU kernels, so a CUDA request logs a
    /// warning and falls back.
    pub fn resolve(prefer_cuda: bool) -> Self {
        if prefer_cuda {
            tracing::warn!("CUDA requested but no GPU backend is compiled in, using CPU");
        }
        Self::Cpu
    }

    /// Check if this is a CPU device
    pub fn is_cpu(&self) -> bool {
        matches!(self, Self::Cpu)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_cpu() {
        assert_eq!(Device::resolve(false), Device::Cpu);
    }

    #[test]
    fn test_resolve_cuda_falls_back() {
        let device = Device::resolve(true);
        assert!(device.is_cpu());
        assert_eq!(device.to_string(), "cpu");
    }

    #[test]
    fn test_device_serde() {
        let yaml = serde_yaml::to_string(&Device::Cpu).unwrap();
        assert!(yaml.contains("cpu"));
        let back: Device = serde_yaml::from_str("cpu").unwrap();
        assert_eq!(back, Device::Cpu);
    }
}
