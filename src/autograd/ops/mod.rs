//! Autograd operations with backward passes
//!
//! This module provides differentiable operations for automatic differentiation.

mod activations;
mod basic;
mod loss;
mod matmul;

use super::{is_grad_enabled, Tensor};

// Re-export all public operations
pub use activations::{leaky_relu, relu, sigmoid};
pub use basic::{add, add_scalar, mean, mul, scale, sub, sum};
pub use loss::{binary_cross_entropy, log_eps, sum_squared_error_per_sample, BCE_LOG_FLOOR, EPS};
pub use matmul::{add_bias, matmul, matmul_compute, select_rows, transpose};

/// Whether an op over `inputs` must record a backward node
fn tracks(inputs: &[&Tensor]) -> bool {
    is_grad_enabled() && inputs.iter().any(|t| t.requires_grad())
}
