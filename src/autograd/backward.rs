//! Backward operation trait and graph traversal

use super::Tensor;
use ndarray::Array1;
use std::collections::HashSet;

/// A recorded operation that can push gradients into its inputs
pub trait BackwardOp {
    /// Tensors read by the forward computation
    fn inputs(&self) -> Vec<Tensor>;

    /// Accumulate into each input the gradient of the loss, given `grad`,
    /// the gradient with respect to this operation's output
    fn backward(&self, grad: &Array1<f32>);
}

/// Nodes reachable from `root`, ordered so every node precedes its inputs
pub(crate) fn topological_order(root: &Tensor) -> Vec<Tensor> {
    let mut visited = HashSet::new();
    let mut post_order = Vec::new();
    // (node, inputs already expanded)
    let mut stack = vec![(root.clone(), false)];

    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            post_order.push(node);
            continue;
        }
        if !visited.insert(node.id()) {
            continue;
        }
        let inputs = node.backward_op().map(|op| op.inputs()).unwrap_or_default();
        stack.push((node, true));
        for input in inputs {
            if input.requires_grad() && !visited.contains(&input.id()) {
                stack.push((input, false));
            }
        }
    }

    post_order.reverse();
    post_order
}
