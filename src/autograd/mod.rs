//! Tape-based autograd engine
//!
//! Tensors record the operation that produced them; [`backward`] walks the
//! recorded graph in topological order so each node propagates its gradient
//! exactly once, even when it feeds several consumers.
//!
//! ```
//! use latente::autograd::{backward, mean, mul, Tensor};
//!
//! let x = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
//! let loss = mean(&mul(&x, &x));
//! backward(&loss, None);
//!
//! // d/dx mean(x²) = 2x / n
//! let grad = x.grad().unwrap();
//! assert!((grad[2] - 2.0).abs() < 1e-6);
//! ```

mod backward;
mod context;
mod ops;
mod tensor;

#[cfg(test)]
mod tests;

pub use backward::BackwardOp;
pub use context::{is_grad_enabled, no_grad};
pub use ops::*;
pub use tensor::Tensor;

use ndarray::Array1;

/// Perform backward pass on a tensor
///
/// `grad_output` seeds the root gradient; `None` seeds with ones, which is
/// the usual case for a scalar loss.
pub fn backward(tensor: &Tensor, grad_output: Option<Array1<f32>>) {
    let seed = grad_output.unwrap_or_else(|| Array1::ones(tensor.len()));
    tensor.accumulate_grad(seed);

    for node in backward::topological_order(tensor) {
        let Some(op) = node.backward_op() else {
            continue;
        };
        if let Some(grad) = node.grad() {
            op.backward(&grad);
        }
    }
}

/// Check named parameters for NaN/Inf entries
///
/// Returns the first offending parameter. Not called from the training hot
/// path unless the caller opts in.
pub fn check_finite<'a, I>(params: I) -> crate::Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a Tensor)>,
{
    for (name, tensor) in params {
        let count = tensor.non_finite_count();
        if count > 0 {
            return Err(crate::Error::NonFinite {
                name: name.to_string(),
                count,
            });
        }
    }
    Ok(())
}
