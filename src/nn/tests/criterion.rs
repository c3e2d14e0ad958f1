use crate::nn::{BceLoss, Criterion, Graph, L1Loss, MseLoss, VarLossOps};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_mse_and_l1_values() {
    let graph = Graph::new_with_seed(0);
    let input = graph.input(&Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2]));
    let target = graph.input(&Tensor::new(&[0.0, 2.0, 5.0, 4.0], &[1, 1, 2, 2]));

    // (1 + 0 + 4 + 0) / 4
    assert_abs_diff_eq!(MseLoss.forward(&input, &target).unwrap().item().unwrap(), 1.25);
    // (1 + 0 + 2 + 0) / 4
    assert_abs_diff_eq!(L1Loss.forward(&input, &target).unwrap().item().unwrap(), 0.75);
}

#[test]
fn test_bce_value_and_saturation() {
    let graph = Graph::new_with_seed(0);
    let p = graph.input(&Tensor::new(&[0.5, 0.5], &[1, 2]));
    let ones = graph.input(&Tensor::ones(&[1, 2]));
    assert_abs_diff_eq!(
        BceLoss.forward(&p, &ones).unwrap().item().unwrap(),
        std::f32::consts::LN_2,
        epsilon = 1e-6
    );

    // 完全错误的预测：loss 有限，梯度也有限
    let p = graph.input_requiring_grad(&Tensor::zeros(&[1, 2]));
    let loss = p.bce_loss(&ones).unwrap();
    let value = loss.backward().unwrap();
    assert!(value.is_finite() && value > 10.0);
    assert!(p.grad().unwrap().is_all_finite());
}

#[test]
fn test_loss_shape_mismatch() {
    let graph = Graph::new_with_seed(0);
    let input = graph.input(&Tensor::ones(&[1, 1, 2, 2]));
    let target = graph.input(&Tensor::ones(&[1, 1, 3, 3]));
    assert!(input.mse_loss(&target).is_err());
    assert!(input.l1_loss(&target).is_err());
}

#[test]
fn test_l1_grad_is_sign_over_count() {
    let graph = Graph::new_with_seed(0);
    let input = graph.input_requiring_grad(&Tensor::new(&[1.0, -1.0], &[1, 2]));
    let target = graph.input(&Tensor::zeros(&[1, 2]));
    input.l1_loss(&target).unwrap().backward().unwrap();
    assert_eq!(input.grad().unwrap(), Tensor::new(&[0.5, -0.5], &[1, 2]));
}
