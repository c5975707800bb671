//! Basic autograd operations: add, sub, mul, scale, add_scalar, sum, mean

use super::tracks;
use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::rc::Rc;

fn assert_same_len(a: &Tensor, b: &Tensor, op: &str) {
    assert_eq!(a.len(), b.len(), "{op}: operands must have the same length");
}

fn output(data: Array1<f32>, like: &Tensor, requires_grad: bool) -> Tensor {
    Tensor::new(data, requires_grad).reshape(like.shape())
}

/// Add two tensors element-wise
pub fn add(a: &Tensor, b: &Tensor) -> Tensor {
    assert_same_len(a, b, "add");
    let data = &*a.data() + &*b.data();
    let requires_grad = tracks(&[a, b]);

    let mut result = output(data, a, requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(AddBackward {
            a: a.clone(),
            b: b.clone(),
            sign_b: 1.0,
        }));
    }

    result
}

/// Subtract two tensors element-wise (`a - b`)
pub fn sub(a: &Tensor, b: &Tensor) -> Tensor {
    assert_same_len(a, b, "sub");
    let data = &*a.data() - &*b.data();
    let requires_grad = tracks(&[a, b]);

    let mut result = output(data, a, requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(AddBackward {
            a: a.clone(),
            b: b.clone(),
            sign_b: -1.0,
        }));
    }

    result
}

struct AddBackward {
    a: Tensor,
    b: Tensor,
    sign_b: f32,
}

impl BackwardOp for AddBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) {
        if self.a.requires_grad() {
            self.a.accumulate_grad(grad.clone());
        }
        if self.b.requires_grad() {
            self.b.accumulate_grad(grad * self.sign_b);
        }
    }
}

/// Multiply two tensors element-wise
pub fn mul(a: &Tensor, b: &Tensor) -> Tensor {
    assert_same_len(a, b, "mul");
    let data = &*a.data() * &*b.data();
    let requires_grad = tracks(&[a, b]);

    let mut result = output(data, a, requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(MulBackward {
            a: a.clone(),
            b: b.clone(),
        }));
    }

    result
}

struct MulBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for MulBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) {
        if self.a.requires_grad() {
            // ∂L/∂a = ∂L/∂out * b
            let grad_a = grad * &*self.b.data();
            self.a.accumulate_grad(grad_a);
        }
        if self.b.requires_grad() {
            // ∂L/∂b = ∂L/∂out * a
            let grad_b = grad * &*self.a.data();
            self.b.accumulate_grad(grad_b);
        }
    }
}

/// Scale tensor by a scalar
pub fn scale(a: &Tensor, factor: f32) -> Tensor {
    let data = &*a.data() * factor;
    let requires_grad = tracks(&[a]);

    let mut result = output(data, a, requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(ScaleBackward {
            a: a.clone(),
            factor,
        }));
    }

    result
}

struct ScaleBackward {
    a: Tensor,
    factor: f32,
}

impl BackwardOp for ScaleBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) {
        if self.a.requires_grad() {
            self.a.accumulate_grad(grad * self.factor);
        }
    }
}

/// Add a scalar to every element
pub fn add_scalar(a: &Tensor, value: f32) -> Tensor {
    let data = &*a.data() + value;
    let requires_grad = tracks(&[a]);

    let mut result = output(data, a, requires_grad);

    if requires_grad {
        // Shift has unit derivative, same as scaling by one
        result.set_backward_op(Rc::new(ScaleBackward {
            a: a.clone(),
            factor: 1.0,
        }));
    }

    result
}

/// Sum all elements
pub fn sum(a: &Tensor) -> Tensor {
    reduce(a, 1.0)
}

/// Mean of all elements
pub fn mean(a: &Tensor) -> Tensor {
    let n = a.len().max(1) as f32;
    reduce(a, 1.0 / n)
}

fn reduce(a: &Tensor, factor: f32) -> Tensor {
    let data = Array1::from(vec![a.data().sum() * factor]);
    let requires_grad = tracks(&[a]);

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(ReduceBackward {
            a: a.clone(),
            factor,
        }));
    }

    result
}

struct ReduceBackward {
    a: Tensor,
    factor: f32,
}

impl BackwardOp for ReduceBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) {
        if self.a.requires_grad() {
            // ∂L/∂a_i = ∂L/∂out * factor (broadcast)
            let grad_a = Array1::from_elem(self.a.len(), grad[0] * self.factor);
            self.a.accumulate_grad(grad_a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_add_keeps_shape() {
        let a = Tensor::from_shape(vec![1.0, 2.0, 3.0, 4.0], &[2, 2], false);
        let b = Tensor::from_shape(vec![1.0, 1.0, 1.0, 1.0], &[2, 2], false);
        let c = add(&a, &b);
        assert_eq!(c.shape(), &[2, 2]);
        assert_eq!(c.to_vec(), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_sub_backward_negates_rhs() {
        let a = Tensor::from_vec(vec![3.0, 4.0], true);
        let b = Tensor::from_vec(vec![1.0, 1.0], true);
        let loss = sum(&sub(&a, &b));
        backward(&loss, None);
        assert_eq!(a.grad().unwrap().to_vec(), vec![1.0, 1.0]);
        assert_eq!(b.grad().unwrap().to_vec(), vec![-1.0, -1.0]);
    }

    #[test]
    fn test_shared_input_counts_both_paths() {
        // loss = sum(x * x) shares x between both operands
        let x = Tensor::from_vec(vec![1.0, -2.0, 3.0], true);
        let loss = sum(&mul(&x, &x));
        backward(&loss, None);
        assert_eq!(x.grad().unwrap().to_vec(), vec![2.0, -4.0, 6.0]);
    }

    #[test]
    fn test_diamond_intermediate_counts_once() {
        // y = 2x is consumed twice; d/dx sum(y + y) = 4
        let x = Tensor::from_vec(vec![1.0, 1.0], true);
        let y = scale(&x, 2.0);
        let loss = sum(&add(&y, &y));
        backward(&loss, None);
        assert_eq!(x.grad().unwrap().to_vec(), vec![4.0, 4.0]);
    }

    #[test]
    fn test_mean_backward() {
        let x = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], true);
        let loss = mean(&x);
        assert_abs_diff_eq!(loss.item(), 2.5);
        backward(&loss, None);
        for g in x.grad().unwrap().iter() {
            assert_abs_diff_eq!(*g, 0.25);
        }
    }

    #[test]
    fn test_add_scalar_backward() {
        let x = Tensor::from_vec(vec![0.25], true);
        let one_minus = add_scalar(&scale(&x, -1.0), 1.0);
        assert_abs_diff_eq!(one_minus.item(), 0.75);
        backward(&one_minus, None);
        assert_abs_diff_eq!(x.grad().unwrap()[0], -1.0);
    }

    #[test]
    fn test_no_grad_records_nothing() {
        let x = Tensor::from_vec(vec![1.0, 2.0], true);
        let y = crate::autograd::no_grad(|| scale(&x, 3.0));
        assert!(!y.requires_grad());
        assert!(y.backward_op().is_none());
    }
}
