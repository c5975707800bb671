//! Optimizer trait

use crate::Tensor;

/// Trait for optimization algorithms
///
/// An optimizer is bound to one parameter group: callers pass the same
/// parameters, in the same order, on every step so per-parameter state lines
/// up by index.
pub trait Optimizer {
    /// Apply one update using the currently populated gradients
    ///
    /// Parameters without a gradient are left untouched.
    fn step(&mut self, params: &[Tensor]);

    /// Zero out all gradients
    fn zero_grad(&mut self, params: &[Tensor]) {
        for param in params {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}
