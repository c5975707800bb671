//! Matrix autograd operations: matmul, bias broadcast, row gather
//!
//! Matrices are row-major and flattened; callers pass the dimensions.

use super::tracks;
use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::rc::Rc;

/// Transpose a row-major matrix (rows x cols) to (cols x rows)
/// Uses cache-efficient blocked transpose for large matrices
#[inline]
pub fn transpose(data: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    let mut transposed = vec![0.0f32; rows * cols];

    const BLOCK_SIZE: usize = 32;
    if rows >= BLOCK_SIZE && cols >= BLOCK_SIZE {
        transpose_blocked(data, &mut transposed, rows, cols, BLOCK_SIZE);
    } else {
        transpose_simple(data, &mut transposed, rows, cols);
    }

    transposed
}

#[inline]
fn transpose_blocked(src: &[f32], dst: &mut [f32], rows: usize, cols: usize, block: usize) {
    for r_block in (0..rows).step_by(block) {
        for c_block in (0..cols).step_by(block) {
            let r_end = (r_block + block).min(rows);
            let c_end = (c_block + block).min(cols);
            for r in r_block..r_end {
                for c in c_block..c_end {
                    dst[c * rows + r] = src[r * cols + c];
                }
            }
        }
    }
}

#[inline]
fn transpose_simple(src: &[f32], dst: &mut [f32], rows: usize, cols: usize) {
    for r in 0..rows {
        for c in 0..cols {
            dst[c * rows + r] = src[r * cols + c];
        }
    }
}

/// Compute C = A @ B on the CPU (A is m×k, B is k×n)
///
/// i-p-j loop order keeps the inner loop streaming over contiguous rows of B and C.
pub fn matmul_compute(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    let mut c = vec![0.0f32; m * n];
    for i in 0..m {
        let c_row = &mut c[i * n..(i + 1) * n];
        for p in 0..k {
            let a_ip = a[i * k + p];
            if a_ip == 0.0 {
                continue;
            }
            let b_row = &b[p * n..(p + 1) * n];
            for (c_ij, &b_pj) in c_row.iter_mut().zip(b_row) {
                *c_ij += a_ip * b_pj;
            }
        }
    }
    c
}

/// Matrix multiplication
///
/// Computes C = A @ B where:
/// - A is m×k (flattened to length m*k)
/// - B is k×n (flattened to length k*n)
/// - C is m×n, returned with shape `[m, n]`
pub fn matmul(a: &Tensor, b: &Tensor, m: usize, k: usize, n: usize) -> Tensor {
    assert_eq!(a.len(), m * k, "Matrix A size mismatch");
    assert_eq!(b.len(), k * n, "Matrix B size mismatch");

    let result_data = {
        let a_data = a.data();
        let b_data = b.data();
        matmul_compute(
            a_data.as_slice().expect("matrix A must be contiguous"),
            b_data.as_slice().expect("matrix B must be contiguous"),
            m,
            k,
            n,
        )
    };

    let requires_grad = tracks(&[a, b]);
    let mut result = Tensor::from_shape(result_data, &[m, n], requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(MatmulBackward {
            a: a.clone(),
            b: b.clone(),
            m,
            k,
            n,
        }));
    }

    result
}

struct MatmulBackward {
    a: Tensor,
    b: Tensor,
    m: usize,
    k: usize,
    n: usize,
}

impl BackwardOp for MatmulBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) {
        // ∂L/∂A = ∂L/∂C @ B^T  (m×n) @ (n×k) = (m×k)
        // ∂L/∂B = A^T @ ∂L/∂C  (k×m) @ (m×n) = (k×n)
        let grad_c = grad.as_slice().expect("gradient output must be contiguous");

        if self.a.requires_grad() {
            let b_t = {
                let b_data = self.b.data();
                transpose(
                    b_data.as_slice().expect("matrix B must be contiguous"),
                    self.k,
                    self.n,
                )
            };
            let grad_a = matmul_compute(grad_c, &b_t, self.m, self.n, self.k);
            self.a.accumulate_grad(Array1::from(grad_a));
        }

        if self.b.requires_grad() {
            let a_t = {
                let a_data = self.a.data();
                transpose(
                    a_data.as_slice().expect("matrix A must be contiguous"),
                    self.m,
                    self.k,
                )
            };
            let grad_b = matmul_compute(&a_t, grad_c, self.k, self.m, self.n);
            self.b.accumulate_grad(Array1::from(grad_b));
        }
    }
}

/// Add a bias row vector to every row of a `rows × cols` matrix
pub fn add_bias(x: &Tensor, bias: &Tensor, rows: usize, cols: usize) -> Tensor {
    assert_eq!(x.len(), rows * cols, "add_bias: input size mismatch");
    assert_eq!(bias.len(), cols, "add_bias: bias length mismatch");

    let mut data = x.data().clone();
    {
        let bias_data = bias.data();
        for (i, v) in data.iter_mut().enumerate() {
            *v += bias_data[i % cols];
        }
    }

    let requires_grad = tracks(&[x, bias]);
    let mut result = Tensor::new(data, requires_grad).reshape(&[rows, cols]);

    if requires_grad {
        result.set_backward_op(Rc::new(AddBiasBackward {
            x: x.clone(),
            bias: bias.clone(),
            cols,
        }));
    }

    result
}

struct AddBiasBackward {
    x: Tensor,
    bias: Tensor,
    cols: usize,
}

impl BackwardOp for AddBiasBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.x.clone(), self.bias.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) {
        if self.x.requires_grad() {
            self.x.accumulate_grad(grad.clone());
        }
        if self.bias.requires_grad() {
            // Column sums: each bias entry was added to every row
            let mut grad_bias = Array1::zeros(self.cols);
            for (i, g) in grad.iter().enumerate() {
                grad_bias[i % self.cols] += g;
            }
            self.bias.accumulate_grad(grad_bias);
        }
    }
}

/// Gather rows of a batched tensor (leading dimension) into a new batch
///
/// # Panics
///
/// Panics if any index is out of range.
pub fn select_rows(a: &Tensor, indices: &[usize]) -> Tensor {
    let rows = a.rows();
    let row_len = a.row_len();
    let mut data = Vec::with_capacity(indices.len() * row_len);
    {
        let src = a.data();
        for &r in indices {
            assert!(r < rows, "select_rows: row {r} out of range for {rows} rows");
            data.extend(src.iter().skip(r * row_len).take(row_len));
        }
    }

    let mut shape = a.shape().to_vec();
    if shape.is_empty() {
        shape.push(indices.len());
    } else {
        shape[0] = indices.len();
    }

    let requires_grad = tracks(&[a]);
    let mut result = Tensor::from_shape(data, &shape, requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(SelectRowsBackward {
            a: a.clone(),
            indices: indices.to_vec(),
            row_len,
        }));
    }

    result
}

struct SelectRowsBackward {
    a: Tensor,
    indices: Vec<usize>,
    row_len: usize,
}

impl BackwardOp for SelectRowsBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) {
        if self.a.requires_grad() {
            let mut grad_a = Array1::zeros(self.a.len());
            for (out_row, &src_row) in self.indices.iter().enumerate() {
                for j in 0..self.row_len {
                    grad_a[src_row * self.row_len + j] += grad[out_row * self.row_len + j];
                }
            }
            self.a.accumulate_grad(grad_a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{backward, sum};

    #[test]
    fn test_transpose_2x3() {
        // [1, 2, 3]
        // [4, 5, 6]
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let result = transpose(&data, 2, 3);
        assert_eq!(result, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_transpose_blocked_matches_simple() {
        let rows = 40;
        let cols = 33;
        let data: Vec<f32> = (0..rows * cols).map(|v| v as f32).collect();
        let t = transpose(&data, rows, cols);
        for r in 0..rows {
            for c in 0..cols {
                assert_eq!(t[c * rows + r], data[r * cols + c]);
            }
        }
    }

    #[test]
    fn test_matmul_compute_2x3_3x2() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let c = matmul_compute(&a, &b, 2, 3, 2);
        assert_eq!(c, vec![58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_matmul_backward() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], true);
        let b = Tensor::from_vec(vec![5.0, 6.0, 7.0, 8.0], true);
        let c = matmul(&a, &b, 2, 2, 2);
        assert_eq!(c.shape(), &[2, 2]);
        backward(&sum(&c), None);

        // grad_A = 1 @ B^T: row sums of B
        assert_eq!(a.grad().unwrap().to_vec(), vec![11.0, 15.0, 11.0, 15.0]);
        // grad_B = A^T @ 1: column sums of A
        assert_eq!(b.grad().unwrap().to_vec(), vec![4.0, 4.0, 6.0, 6.0]);
    }

    #[test]
    fn test_add_bias_broadcast_and_grad() {
        let x = Tensor::from_vec(vec![0.0; 6], true);
        let bias = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
        let y = add_bias(&x, &bias, 2, 3);
        assert_eq!(y.to_vec(), vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
        backward(&sum(&y), None);
        assert_eq!(bias.grad().unwrap().to_vec(), vec![2.0, 2.0, 2.0]);
        assert_eq!(x.grad().unwrap().to_vec(), vec![1.0; 6]);
    }

    #[test]
    fn test_select_rows_scatter_grad() {
        let a = Tensor::from_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[3, 2], true);
        let s = select_rows(&a, &[2, 0, 2]);
        assert_eq!(s.shape(), &[3, 2]);
        assert_eq!(s.to_vec(), vec![5.0, 6.0, 1.0, 2.0, 5.0, 6.0]);
        backward(&sum(&s), None);
        assert_eq!(a.grad().unwrap().to_vec(), vec![1.0, 1.0, 0.0, 0.0, 2.0, 2.0]);
    }
}
