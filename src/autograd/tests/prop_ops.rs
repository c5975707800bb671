//! Property-based gradient checks for the operations the AAE graphs use

use super::test_utils::{assert_grad_close, finite_difference};
use crate::autograd::{
    add, add_bias, add_scalar, backward, binary_cross_entropy, log_eps, matmul, mean, mul, scale,
    sigmoid, sum, sum_squared_error_per_sample, Tensor,
};
use proptest::prelude::*;

fn adversarial_loss(p: &Tensor) -> Tensor {
    // -mean(ln(p) + ln(1 - p)): p feeds two branches
    let one_minus = add_scalar(&scale(p, -1.0), 1.0);
    scale(&mean(&add(&log_eps(p), &log_eps(&one_minus))), -1.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_mul_add_chain_gradient_check(
        xy in prop::collection::vec((-3.0f32..3.0, -3.0f32..3.0), 2..12)
    ) {
        let (x, y): (Vec<f32>, Vec<f32>) = xy.into_iter().unzip();

        let a = Tensor::from_vec(x.clone(), true);
        let b = Tensor::from_vec(y.clone(), false);
        let loss = sum(&mul(&add(&a, &b), &a));
        backward(&loss, None);
        let analytical = a.grad().expect("gradient should be available").to_vec();

        let numerical = finite_difference(
            |x_val| {
                let t_a = Tensor::from_vec(x_val.to_vec(), false);
                let t_b = Tensor::from_vec(y.clone(), false);
                sum(&mul(&add(&t_a, &t_b), &t_a)).item()
            },
            &x,
            1e-2,
        );

        for i in 0..x.len() {
            let diff = (analytical[i] - numerical[i]).abs();
            prop_assert!(diff < 0.1, "Gradient mismatch at index {}: analytical={}, numerical={}",
                        i, analytical[i], numerical[i]);
        }
    }

    #[test]
    fn prop_linear_sigmoid_gradient_check(
        x in prop::collection::vec(-1.0f32..1.0, 6),
        w in prop::collection::vec(-1.0f32..1.0, 6),
        b in prop::collection::vec(-0.5f32..0.5, 2),
    ) {
        // x: 2x3, w: 3x2, b: 2
        let forward = |w_val: &[f32]| {
            let t_x = Tensor::from_vec(x.clone(), false);
            let t_w = Tensor::from_vec(w_val.to_vec(), false);
            let t_b = Tensor::from_vec(b.clone(), false);
            mean(&sigmoid(&add_bias(&matmul(&t_x, &t_w, 2, 3, 2), &t_b, 2, 2))).item()
        };

        let t_x = Tensor::from_vec(x.clone(), false);
        let t_w = Tensor::from_vec(w.clone(), true);
        let t_b = Tensor::from_vec(b.clone(), true);
        let loss = mean(&sigmoid(&add_bias(&matmul(&t_x, &t_w, 2, 3, 2), &t_b, 2, 2)));
        backward(&loss, None);

        let numerical = finite_difference(forward, &w, 1e-2);
        assert_grad_close(&t_w.grad().expect("weight grad").to_vec(), &numerical, 1e-2);
        prop_assert_eq!(t_b.grad().expect("bias grad").len(), 2);
    }

    #[test]
    fn prop_adversarial_log_gradient_check(
        p in prop::collection::vec(0.05f32..0.95, 1..8)
    ) {
        let t_p = Tensor::from_vec(p.clone(), true);
        let loss = adversarial_loss(&t_p);
        prop_assert!(loss.item().is_finite());
        backward(&loss, None);

        let numerical = finite_difference(
            |p_val| adversarial_loss(&Tensor::from_vec(p_val.to_vec(), false)).item(),
            &p,
            1e-3,
        );
        assert_grad_close(&t_p.grad().expect("gradient").to_vec(), &numerical, 0.1);
    }

    #[test]
    fn prop_bce_gradient_check(
        pt in prop::collection::vec((0.05f32..0.95, 0.0f32..1.0), 1..10)
    ) {
        let (p, t): (Vec<f32>, Vec<f32>) = pt.into_iter().unzip();
        let t_p = Tensor::from_vec(p.clone(), true);
        let targets = Tensor::from_vec(t.clone(), false);
        backward(&binary_cross_entropy(&t_p, &targets), None);

        let numerical = finite_difference(
            |p_val| {
                binary_cross_entropy(
                    &Tensor::from_vec(p_val.to_vec(), false),
                    &Tensor::from_vec(t.clone(), false),
                )
                .item()
            },
            &p,
            1e-3,
        );
        assert_grad_close(&t_p.grad().expect("gradient").to_vec(), &numerical, 0.05);
    }

    #[test]
    fn prop_sse_loss_is_non_negative(
        pt in prop::collection::vec((-2.0f32..2.0, -2.0f32..2.0), 1..16),
        batch in 1usize..4,
    ) {
        let (p, t): (Vec<f32>, Vec<f32>) = pt.into_iter().unzip();
        let loss = sum_squared_error_per_sample(
            &Tensor::from_vec(p, false),
            &Tensor::from_vec(t, false),
            batch,
        );
        prop_assert!(loss.item() >= 0.0);
    }
}
