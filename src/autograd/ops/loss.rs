//! Loss-building operations for adversarial autoencoder training
//!
//! `log_eps` is the stabilised logarithm used by the adversarial terms:
//! `ln(x + EPS)` is finite for `x = 0`.

use super::tracks;
use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::rc::Rc;

/// Offset added before taking logarithms of probabilities
pub const EPS: f32 = 1e-8;

/// Lower bound on the log terms of binary cross-entropy
pub const BCE_LOG_FLOOR: f32 = -100.0;

/// Element-wise `ln(x + EPS)`
pub fn log_eps(a: &Tensor) -> Tensor {
    let data = a.data().mapv(|x| (x + EPS).ln());
    let requires_grad = tracks(&[a]);

    let mut result = Tensor::new(data, requires_grad).reshape(a.shape());

    if requires_grad {
        result.set_backward_op(Rc::new(LogEpsBackward { a: a.clone() }));
    }

    result
}

struct LogEpsBackward {
    a: Tensor,
}

impl BackwardOp for LogEpsBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) {
        if self.a.requires_grad() {
            // ∂/∂x ln(x + ε) = 1 / (x + ε)
            let local = self.a.data().mapv(|x| 1.0 / (x + EPS));
            self.a.accumulate_grad(grad * &local);
        }
    }
}

/// Mean binary cross-entropy between probabilities and targets in `[0, 1]`
///
/// `L = -mean(t·ln p + (1-t)·ln(1-p))`, each log clamped at [`BCE_LOG_FLOOR`].
/// Gradients flow only into `predictions`.
pub fn binary_cross_entropy(predictions: &Tensor, targets: &Tensor) -> Tensor {
    assert_eq!(
        predictions.len(),
        targets.len(),
        "Predictions and targets must have same length"
    );

    let n = predictions.len().max(1) as f32;
    let total: f32 = {
        let p = predictions.data();
        let t = targets.data();
        p.iter()
            .zip(t.iter())
            .map(|(&p, &t)| {
                let log_p = floor_log(p.ln());
                let log_1mp = floor_log((1.0 - p).ln());
                -(t * log_p + (1.0 - t) * log_1mp)
            })
            .sum()
    };

    let requires_grad = tracks(&[predictions]);
    let mut loss = Tensor::from_vec(vec![total / n], requires_grad);

    if requires_grad {
        loss.set_backward_op(Rc::new(BceBackward {
            predictions: predictions.clone(),
            targets: targets.data().clone(),
            n,
        }));
    }

    loss
}

/// Clamp a log at [`BCE_LOG_FLOOR`], letting NaN through
#[inline]
fn floor_log(l: f32) -> f32 {
    if l < BCE_LOG_FLOOR {
        BCE_LOG_FLOOR
    } else {
        l
    }
}

struct BceBackward {
    predictions: Tensor,
    targets: Array1<f32>,
    n: f32,
}

impl BackwardOp for BceBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.predictions.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) {
        // ∂L/∂p = (p - t) / max(p(1-p), 1e-12) / N
        let scale = grad[0] / self.n;
        let grad_p: Array1<f32> = self
            .predictions
            .data()
            .iter()
            .zip(self.targets.iter())
            .map(|(&p, &t)| (p - t) / (p * (1.0 - p)).max(1e-12) * scale)
            .collect();
        self.predictions.accumulate_grad(grad_p);
    }
}

/// Sum of squared errors per sample, averaged over the batch
///
/// `L = (1/B) Σ_b Σ_i (pred_bi - target_bi)²`. Gradients flow only into
/// `predictions`.
pub fn sum_squared_error_per_sample(predictions: &Tensor, targets: &Tensor, batch: usize) -> Tensor {
    assert_eq!(
        predictions.len(),
        targets.len(),
        "Predictions and targets must have same length"
    );
    let batch = batch.max(1) as f32;

    let diff = &*predictions.data() - &*targets.data();
    let total = diff.iter().map(|d| d * d).sum::<f32>() / batch;

    let requires_grad = tracks(&[predictions]);
    let mut loss = Tensor::from_vec(vec![total], requires_grad);

    if requires_grad {
        loss.set_backward_op(Rc::new(SseBackward {
            predictions: predictions.clone(),
            diff,
            batch,
        }));
    }

    loss
}

struct SseBackward {
    predictions: Tensor,
    diff: Array1<f32>,
    batch: f32,
}

impl BackwardOp for SseBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.predictions.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) {
        // ∂L/∂pred = 2 (pred - target) / B
        let scale = 2.0 * grad[0] / self.batch;
        self.predictions.accumulate_grad(&self.diff * scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_log_eps_zero_is_finite() {
        let x = Tensor::from_vec(vec![0.0], false);
        let y = log_eps(&x);
        assert!(y.is_finite());
        assert_abs_diff_eq!(y.item(), EPS.ln(), epsilon = 1e-4);
    }

    #[test]
    fn test_log_eps_one_is_near_zero() {
        let y = log_eps(&Tensor::from_vec(vec![1.0], false));
        assert_abs_diff_eq!(y.item(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_log_eps_gradient_at_zero_is_finite() {
        let x = Tensor::from_vec(vec![0.0], true);
        backward(&log_eps(&x), None);
        let g = x.grad().unwrap()[0];
        assert!(g.is_finite());
    }

    #[test]
    fn test_bce_perfect_prediction_near_zero() {
        let p = Tensor::from_vec(vec![1.0, 0.0], true);
        let t = Tensor::from_vec(vec![1.0, 0.0], false);
        let loss = binary_cross_entropy(&p, &t);
        assert_abs_diff_eq!(loss.item(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_bce_clamps_wrong_certain_prediction() {
        let p = Tensor::from_vec(vec![0.0], false);
        let t = Tensor::from_vec(vec![1.0], false);
        let loss = binary_cross_entropy(&p, &t);
        assert_abs_diff_eq!(loss.item(), 100.0);
    }

    #[test]
    fn test_bce_propagates_nan_prediction() {
        let p = Tensor::from_vec(vec![f32::NAN, 0.5], false);
        let t = Tensor::from_vec(vec![0.5, 0.5], false);
        assert!(binary_cross_entropy(&p, &t).item().is_nan());
    }

    #[test]
    fn test_bce_gradient_direction() {
        let p = Tensor::from_vec(vec![0.2, 0.8], true);
        let t = Tensor::from_vec(vec![1.0, 0.0], false);
        backward(&binary_cross_entropy(&p, &t), None);
        let g = p.grad().unwrap();
        assert!(g[0] < 0.0, "under-predicted target should push p up");
        assert!(g[1] > 0.0, "over-predicted target should push p down");
    }

    #[test]
    fn test_sse_per_sample_value_and_grad() {
        // 2 samples x 2 pixels, all errors 1
        let p = Tensor::from_vec(vec![1.0, 1.0, 1.0, 1.0], true);
        let t = Tensor::from_vec(vec![0.0; 4], false);
        let loss = sum_squared_error_per_sample(&p, &t, 2);
        assert_abs_diff_eq!(loss.item(), 2.0);
        backward(&loss, None);
        for g in p.grad().unwrap().iter() {
            assert_abs_diff_eq!(*g, 1.0);
        }
    }
}
