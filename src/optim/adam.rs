//! Adam optimizer

use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// Adam optimizer with bias correction
///
/// m_t = β1 m_{t-1} + (1 - β1) g
/// v_t = β2 v_{t-1} + (1 - β2) g²
/// θ_t = θ_{t-1} - lr_t m_t / (√v_t + ε),  lr_t = lr √(1 - β2^t) / (1 - β1^t)
#[derive(Debug, Clone)]
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: u64,
    m: Vec<Option<Array1<f32>>>, // First moment
    v: Vec<Option<Array1<f32>>>, // Second moment
}

impl Adam {
    /// Create a new Adam optimizer
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            epsilon,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    /// Create Adam with the usual defaults (β1 = 0.9, β2 = 0.999, ε = 1e-8)
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8)
    }

    /// Number of steps taken
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.t
    }

    /// First moment buffers, by parameter index
    #[must_use]
    pub fn first_moments(&self) -> &[Option<Array1<f32>>] {
        &self.m
    }

    fn ensure_moments(&mut self, n: usize) {
        if self.m.len() < n {
            self.m.resize(n, None);
            self.v.resize(n, None);
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &[Tensor]) {
        self.ensure_moments(params.len());
        self.t += 1;

        // Bias correction factors
        let lr_t = self.lr
            * ((1.0 - self.beta2.powi(self.t as i32)).sqrt()
                / (1.0 - self.beta1.powi(self.t as i32)));

        for (i, param) in params.iter().enumerate() {
            let Some(grad) = param.grad() else {
                continue;
            };

            let m_t = match &self.m[i] {
                Some(m) => m * self.beta1 + &grad * (1.0 - self.beta1),
                None => &grad * (1.0 - self.beta1),
            };

            let grad_sq = &grad * &grad;
            let v_t = match &self.v[i] {
                Some(v) => v * self.beta2 + &grad_sq * (1.0 - self.beta2),
                None => &grad_sq * (1.0 - self.beta2),
            };

            let update = &m_t / &(v_t.mapv(f32::sqrt) + self.epsilon) * lr_t;
            *param.data_mut() -= &update;

            self.m[i] = Some(m_t);
            self.v[i] = Some(v_t);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{backward, mul, sum};
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    #[test]
    fn test_first_step_moves_by_lr() {
        // With bias correction the first step is lr * sign(g)
        let mut opt = Adam::default_params(0.1);
        let param = Tensor::from_vec(vec![1.0, -1.0], true);
        param.set_grad(arr1(&[2.0, -0.5]));

        opt.step(std::slice::from_ref(&param));

        let data = param.to_vec();
        assert_abs_diff_eq!(data[0], 0.9, epsilon = 1e-4);
        assert_abs_diff_eq!(data[1], -0.9, epsilon = 1e-4);
        assert_eq!(opt.step_count(), 1);
    }

    #[test]
    fn test_params_without_grad_untouched() {
        let mut opt = Adam::default_params(0.1);
        let with_grad = Tensor::from_vec(vec![1.0], true);
        let without = Tensor::from_vec(vec![1.0], true);
        with_grad.set_grad(arr1(&[1.0]));

        opt.step(&[with_grad.clone(), without.clone()]);

        assert_ne!(with_grad.to_vec(), vec![1.0]);
        assert_eq!(without.to_vec(), vec![1.0]);
        assert!(opt.first_moments()[1].is_none());
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut opt = Adam::default_params(0.1);
        let x = Tensor::from_vec(vec![3.0, -2.0], true);

        for _ in 0..300 {
            x.zero_grad();
            backward(&sum(&mul(&x, &x)), None);
            opt.step(std::slice::from_ref(&x));
        }

        for v in x.to_vec() {
            assert!(v.abs() < 0.1, "expected convergence toward 0, got {v}");
        }
    }

    #[test]
    fn test_set_lr() {
        let mut opt = Adam::new(0.01, 0.9, 0.999, 1e-8);
        opt.set_lr(0.001);
        assert_abs_diff_eq!(opt.lr(), 0.001);
    }
}
