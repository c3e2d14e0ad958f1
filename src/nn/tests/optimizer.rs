use crate::nn::{Adam, Graph, Init, Optimizer, VarLossOps};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_adam_first_step_moves_by_lr() {
    let graph = Graph::new_with_seed(0);
    let w = graph.parameter(&[1, 2], &Init::Constant(1.0), "w");
    let target = graph.input(&Tensor::new(&[0.0, 2.0], &[1, 2]));
    let mut adam = Adam::with_config(&[w.clone()], 0.1, 0.5, 0.999, 1e-8);

    adam.zero_grad();
    w.mse_loss(&target).unwrap().backward().unwrap();
    adam.step().unwrap();

    // 首步经偏差修正后 m_hat/√v_hat = sign(g)
    let moved = w.value();
    assert_abs_diff_eq!(moved.data_as_slice()[0], 0.9, epsilon = 1e-5);
    assert_abs_diff_eq!(moved.data_as_slice()[1], 1.1, epsilon = 1e-5);
}

#[test]
fn test_adam_minimizes_quadratic() {
    let graph = Graph::new_with_seed(0);
    let w = graph.parameter(&[2, 2], &Init::Normal { mean: 0.0, std: 1.0 }, "w");
    let target = graph.input(&Tensor::full(3.0, &[2, 2]));
    let mut adam = Adam::new(&[w.clone()], 0.1);

    let mut last = f32::MAX;
    for _ in 0..500 {
        adam.zero_grad();
        last = w.mse_loss(&target).unwrap().backward().unwrap();
        adam.step().unwrap();
    }
    assert!(last < 1e-2, "loss 未收敛：{last}");
}

#[test]
fn test_adam_skips_params_without_grad() {
    let graph = Graph::new_with_seed(0);
    let w = graph.parameter(&[1, 2], &Init::Constant(1.0), "w");
    let mut adam = Adam::new(&[w.clone()], 0.1);
    adam.step().unwrap();
    assert_eq!(w.value(), Tensor::ones(&[1, 2]));

    adam.set_learning_rate(0.01);
    assert_abs_diff_eq!(adam.learning_rate(), 0.01);
}
