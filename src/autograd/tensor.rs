//! Tensor handle with shared data and gradient cells

use super::backward::BackwardOp;
use ndarray::Array1;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Differentiable tensor
///
/// Storage is a flat `Array1<f32>`; `shape` only records how callers
/// interpret it (e.g. `[batch, features]` or `[batch, C, H, W]`). Cloning a
/// tensor clones the handle: data, gradient and backward op are shared, so a
/// parameter held by a model and by an optimizer group is the same node.
#[derive(Clone)]
pub struct Tensor {
    data: Rc<RefCell<Array1<f32>>>,
    grad: Rc<RefCell<Option<Array1<f32>>>>,
    backward_op: Option<Rc<dyn BackwardOp>>,
    shape: Vec<usize>,
    requires_grad: bool,
}

impl Tensor {
    /// Create a 1-D tensor from an array
    pub fn new(data: Array1<f32>, requires_grad: bool) -> Self {
        let shape = vec![data.len()];
        Self {
            data: Rc::new(RefCell::new(data)),
            grad: Rc::new(RefCell::new(None)),
            backward_op: None,
            shape,
            requires_grad,
        }
    }

    /// Create a 1-D tensor from a vector
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from(data), requires_grad)
    }

    /// Create a tensor with an explicit shape
    ///
    /// # Panics
    ///
    /// Panics if the product of `shape` differs from `data.len()`.
    pub fn from_shape(data: Vec<f32>, shape: &[usize], requires_grad: bool) -> Self {
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape {shape:?} does not match {} elements",
            data.len()
        );
        let mut tensor = Self::from_vec(data, requires_grad);
        tensor.shape = shape.to_vec();
        tensor
    }

    /// Zero-filled 1-D tensor
    pub fn zeros(len: usize, requires_grad: bool) -> Self {
        Self::new(Array1::zeros(len), requires_grad)
    }

    /// View of the same node under a different shape
    ///
    /// # Panics
    ///
    /// Panics if the element count changes.
    #[must_use]
    pub fn reshape(&self, shape: &[usize]) -> Self {
        assert_eq!(
            shape.iter().product::<usize>(),
            self.len(),
            "cannot reshape {:?} into {shape:?}",
            self.shape
        );
        let mut view = self.clone();
        view.shape = shape.to_vec();
        view
    }

    /// Copy of the data with no gradient history
    #[must_use]
    pub fn detach(&self) -> Self {
        let mut tensor = Self::new(self.data().clone(), false);
        tensor.shape = self.shape.clone();
        tensor
    }

    /// Borrow the underlying data
    pub fn data(&self) -> Ref<'_, Array1<f32>> {
        self.data.borrow()
    }

    /// Mutably borrow the underlying data (optimizer updates, checkpoint loads)
    pub fn data_mut(&self) -> RefMut<'_, Array1<f32>> {
        self.data.borrow_mut()
    }

    /// Copy data out as a vector
    pub fn to_vec(&self) -> Vec<f32> {
        self.data().to_vec()
    }

    /// First element; the value of a scalar loss
    pub fn item(&self) -> f32 {
        self.data()[0]
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Whether the tensor has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logical shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Leading dimension (batch size for batched tensors)
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Elements per leading-dimension row
    pub fn row_len(&self) -> usize {
        self.shape.iter().skip(1).product()
    }

    /// Whether gradients flow into this tensor
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Copy of the accumulated gradient, if any
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.borrow().clone()
    }

    /// Overwrite the gradient
    pub fn set_grad(&self, grad: Array1<f32>) {
        *self.grad.borrow_mut() = Some(grad);
    }

    /// Add into the gradient
    pub fn accumulate_grad(&self, grad: Array1<f32>) {
        let mut cell = self.grad.borrow_mut();
        match cell.as_mut() {
            Some(existing) => *existing += &grad,
            None => *cell = Some(grad),
        }
    }

    /// Drop the gradient
    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = None;
    }

    /// Shared gradient cell
    pub fn grad_cell(&self) -> Rc<RefCell<Option<Array1<f32>>>> {
        Rc::clone(&self.grad)
    }

    /// Operation that produced this tensor
    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.backward_op.clone()
    }

    /// Attach the producing operation
    pub fn set_backward_op(&mut self, op: Rc<dyn BackwardOp>) {
        self.backward_op = Some(op);
    }

    /// Node identity: handles that share a gradient cell are the same node
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.grad) as *const () as usize
    }

    /// Run backpropagation from this tensor (seeded with ones)
    pub fn backward(&self) {
        super::backward(self, None);
    }

    /// Number of NaN or infinite entries
    pub fn non_finite_count(&self) -> usize {
        self.data().iter().filter(|v| !v.is_finite()).count()
    }

    /// Whether every entry is finite
    pub fn is_finite(&self) -> bool {
        self.non_finite_count() == 0
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("requires_grad", &self.requires_grad)
            .field("has_grad", &self.grad.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_clone_shares_data() {
        let a = Tensor::from_vec(vec![1.0, 2.0], true);
        let b = a.clone();
        b.data_mut()[0] = 5.0;
        assert_eq!(a.data()[0], 5.0);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_detach_copies() {
        let a = Tensor::from_shape(vec![1.0, 2.0, 3.0, 4.0], &[2, 2], true);
        let d = a.detach();
        d.data_mut()[0] = 9.0;
        assert_eq!(a.data()[0], 1.0);
        assert!(!d.requires_grad());
        assert_eq!(d.shape(), &[2, 2]);
        assert_ne!(a.id(), d.id());
    }

    #[test]
    fn test_accumulate_grad() {
        let a = Tensor::from_vec(vec![1.0, 2.0], true);
        a.accumulate_grad(arr1(&[1.0, 1.0]));
        a.accumulate_grad(arr1(&[0.5, 2.0]));
        assert_eq!(a.grad().unwrap().to_vec(), vec![1.5, 3.0]);
        a.zero_grad();
        assert!(a.grad().is_none());
    }

    #[test]
    fn test_reshape_is_same_node() {
        let a = Tensor::from_vec(vec![0.0; 12], true);
        let r = a.reshape(&[3, 4]);
        assert_eq!(r.rows(), 3);
        assert_eq!(r.row_len(), 4);
        assert_eq!(a.id(), r.id());
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_from_shape_mismatch_panics() {
        let _ = Tensor::from_shape(vec![1.0, 2.0, 3.0], &[2, 2], false);
    }

    #[test]
    fn test_non_finite_count() {
        let a = Tensor::from_vec(vec![1.0, f32::NAN, f32::INFINITY], false);
        assert_eq!(a.non_finite_count(), 2);
        assert!(!a.is_finite());
        assert!(Tensor::zeros(4, false).is_finite());
    }
}
