//! Activation function autograd operations: relu, leaky_relu, sigmoid

use super::tracks;
use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::rc::Rc;

/// ReLU activation
pub fn relu(a: &Tensor) -> Tensor {
    leaky_relu(a, 0.0)
}

/// Leaky ReLU activation: `x` for positive inputs, `slope * x` otherwise
pub fn leaky_relu(a: &Tensor, slope: f32) -> Tensor {
    let data = a.data().mapv(|x| if x > 0.0 { x } else { slope * x });
    let requires_grad = tracks(&[a]);

    let mut result = Tensor::new(data, requires_grad).reshape(a.shape());

    if requires_grad {
        result.set_backward_op(Rc::new(LeakyReluBackward {
            a: a.clone(),
            slope,
        }));
    }

    result
}

struct LeakyReluBackward {
    a: Tensor,
    slope: f32,
}

impl BackwardOp for LeakyReluBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) {
        if self.a.requires_grad() {
            // ∂L/∂a = ∂L/∂out * (a > 0 ? 1 : slope)
            let slope = self.slope;
            let mask = self.a.data().mapv(|x| if x > 0.0 { 1.0 } else { slope });
            self.a.accumulate_grad(grad * &mask);
        }
    }
}

/// Numerically stable logistic sigmoid
pub(crate) fn sigmoid_scalar(v: f32) -> f32 {
    if v >= 0.0 {
        1.0 / (1.0 + (-v).exp())
    } else {
        let exp_v = v.exp();
        exp_v / (1.0 + exp_v)
    }
}

/// Sigmoid activation σ(x) = 1 / (1 + e^(-x))
pub fn sigmoid(a: &Tensor) -> Tensor {
    let data = a.data().mapv(sigmoid_scalar);
    let requires_grad = tracks(&[a]);

    let mut result = Tensor::new(data, requires_grad).reshape(a.shape());

    if requires_grad {
        let output = result.data().clone();
        result.set_backward_op(Rc::new(SigmoidBackward {
            a: a.clone(),
            output,
        }));
    }

    result
}

struct SigmoidBackward {
    a: Tensor,
    output: Array1<f32>,
}

impl BackwardOp for SigmoidBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) {
        if self.a.requires_grad() {
            // ∂σ/∂x = σ(x) * (1 - σ(x))
            let local = self.output.mapv(|y| y * (1.0 - y));
            self.a.accumulate_grad(grad * &local);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{backward, sum};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_relu_forward_backward() {
        let x = Tensor::from_vec(vec![-1.0, 0.0, 2.0], true);
        let y = relu(&x);
        assert_eq!(y.to_vec(), vec![0.0, 0.0, 2.0]);
        backward(&sum(&y), None);
        assert_eq!(x.grad().unwrap().to_vec(), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_leaky_relu_negative_slope() {
        let x = Tensor::from_vec(vec![-2.0, 3.0], true);
        let y = leaky_relu(&x, 0.2);
        assert_abs_diff_eq!(y.data()[0], -0.4);
        backward(&sum(&y), None);
        let g = x.grad().unwrap();
        assert_abs_diff_eq!(g[0], 0.2);
        assert_abs_diff_eq!(g[1], 1.0);
    }

    #[test]
    fn test_sigmoid_extremes_stay_finite() {
        let x = Tensor::from_vec(vec![-1000.0, 0.0, 1000.0], false);
        let y = sigmoid(&x);
        assert!(y.is_finite());
        assert_abs_diff_eq!(y.data()[0], 0.0);
        assert_abs_diff_eq!(y.data()[1], 0.5);
        assert_abs_diff_eq!(y.data()[2], 1.0);
    }

    #[test]
    fn test_sigmoid_backward_at_zero() {
        let x = Tensor::from_vec(vec![0.0], true);
        backward(&sigmoid(&x), None);
        assert_abs_diff_eq!(x.grad().unwrap()[0], 0.25);
    }
}
