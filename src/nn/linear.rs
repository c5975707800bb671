//! Fully connected layer

use super::{weight_init, Module};
use crate::autograd::{add_bias, matmul};
use crate::Tensor;
use rand::Rng;

/// Affine layer `y = x W + b`
pub struct Linear {
    /// Weight (in_features x out_features)
    pub weight: Tensor,
    /// Bias (out_features)
    pub bias: Tensor,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// Create a layer with Xavier-uniform weights and zero bias
    pub fn new<R: Rng>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        Self {
            weight: Tensor::from_shape(
                weight_init(rng, in_features, out_features),
                &[in_features, out_features],
                true,
            ),
            bias: Tensor::zeros(out_features, true),
            in_features,
            out_features,
        }
    }

    /// Input width
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Output width
    pub fn out_features(&self) -> usize {
        self.out_features
    }
}

impl Module for Linear {
    /// Forward over `[B, in_features]` (any shape whose element count is a
    /// multiple of `in_features`), producing `[B, out_features]`
    fn forward(&self, input: &Tensor) -> Tensor {
        let batch = input.len() / self.in_features;
        let projected = matmul(input, &self.weight, batch, self.in_features, self.out_features);
        add_bias(&projected, &self.bias, batch, self.out_features)
    }

    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        vec![
            ("weight".to_string(), self.weight.clone()),
            ("bias".to_string(), self.bias.clone()),
        ]
    }
}

impl std::fmt::Debug for Linear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Linear")
            .field("in_features", &self.in_features)
            .field("out_features", &self.out_features)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{backward, sum};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_forward_shape() {
        let layer = Linear::new(4, 3, &mut StdRng::seed_from_u64(0));
        let x = Tensor::from_shape(vec![0.5; 8], &[2, 4], false);
        let y = layer.forward(&x);
        assert_eq!(y.shape(), &[2, 3]);
    }

    #[test]
    fn test_zero_input_yields_bias() {
        let layer = Linear::new(2, 2, &mut StdRng::seed_from_u64(0));
        layer.bias.data_mut().assign(&ndarray::arr1(&[1.0, -1.0]));
        let y = layer.forward(&Tensor::zeros(2, false));
        assert_eq!(y.to_vec(), vec![1.0, -1.0]);
    }

    #[test]
    fn test_gradients_reach_parameters() {
        let layer = Linear::new(3, 2, &mut StdRng::seed_from_u64(0));
        let x = Tensor::from_shape(vec![1.0, 2.0, 3.0], &[1, 3], false);
        backward(&sum(&layer.forward(&x)), None);
        // d sum(xW + b)/dW_ij = x_i
        let gw = layer.weight.grad().unwrap();
        assert_eq!(gw.to_vec(), vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        assert_eq!(layer.bias.grad().unwrap().to_vec(), vec![1.0, 1.0]);

        layer.zero_grad();
        assert!(layer.weight.grad().is_none());
    }

    #[test]
    fn test_named_parameters() {
        let layer = Linear::new(5, 4, &mut StdRng::seed_from_u64(0));
        let names: Vec<String> = layer.named_parameters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["weight", "bias"]);
        assert_eq!(layer.num_parameters(), 5 * 4 + 4);
    }
}
