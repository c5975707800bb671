//! Range checks for [`AaeSpec`]

use super::AaeSpec;

/// Validation error type
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid latent dimension: {0} (must be > 0)")]
    InvalidZDim(usize),

    #[error("Invalid hidden width: {0} (must be > 0)")]
    InvalidHDim(usize),

    #[error("Invalid learning rate: {0} (must be > 0.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    #[error("Invalid tree count: {0} (must be > 0)")]
    InvalidTreeCount(usize),

    #[error("Invalid channel count: {0} (must be 1 or 3)")]
    InvalidChannels(usize),

    #[error("Invalid image size: {0}x{1} (must be non-zero)")]
    InvalidImageSize(usize, usize),

    #[error("Invalid perplexity: {0} (must be > 0.0)")]
    InvalidPerplexity(f64),
}

/// Validate a run specification
///
/// Paths are not checked here; missing data surfaces when it is opened.
pub fn validate_config(spec: &AaeSpec) -> Result<(), ValidationError> {
    if spec.model.z_dim == 0 {
        return Err(ValidationError::InvalidZDim(spec.model.z_dim));
    }
    if spec.model.h_dim == 0 {
        return Err(ValidationError::InvalidHDim(spec.model.h_dim));
    }
    if !matches!(spec.model.channels, 1 | 3) {
        return Err(ValidationError::InvalidChannels(spec.model.channels));
    }
    if spec.model.height == 0 || spec.model.width == 0 {
        return Err(ValidationError::InvalidImageSize(
            spec.model.height,
            spec.model.width,
        ));
    }
    // NaN fails this check too
    if !(spec.optimizer.lr > 0.0) {
        return Err(ValidationError::InvalidLearningRate(spec.optimizer.lr));
    }
    if spec.data.batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize(spec.data.batch_size));
    }
    if spec.index.n_trees == 0 {
        return Err(ValidationError::InvalidTreeCount(spec.index.n_trees));
    }
    if !(spec.index.perplexity > 0.0) {
        return Err(ValidationError::InvalidPerplexity(spec.index.perplexity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&AaeSpec::default()).is_ok());
    }

    #[test]
    fn test_zero_z_dim() {
        let mut spec = AaeSpec::default();
        spec.model.z_dim = 0;
        assert_eq!(validate_config(&spec), Err(ValidationError::InvalidZDim(0)));
    }

    #[test]
    fn test_bad_learning_rates() {
        for lr in [0.0, -1e-3, f32::NAN] {
            let mut spec = AaeSpec::default();
            spec.optimizer.lr = lr;
            assert!(matches!(
                validate_config(&spec),
                Err(ValidationError::InvalidLearningRate(_))
            ));
        }
    }

    #[test]
    fn test_zero_batch_size() {
        let mut spec = AaeSpec::default();
        spec.data.batch_size = 0;
        assert_eq!(
            validate_config(&spec),
            Err(ValidationError::InvalidBatchSize(0))
        );
    }

    #[test]
    fn test_zero_trees() {
        let mut spec = AaeSpec::default();
        spec.index.n_trees = 0;
        assert_eq!(
            validate_config(&spec),
            Err(ValidationError::InvalidTreeCount(0))
        );
    }

    #[test]
    fn test_channels() {
        let mut spec = AaeSpec::default();
        spec.model.channels = 1;
        assert!(validate_config(&spec).is_ok());
        spec.model.channels = 4;
        assert_eq!(
            validate_config(&spec),
            Err(ValidationError::InvalidChannels(4))
        );
    }
}
