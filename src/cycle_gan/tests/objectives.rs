use super::{LinearCritic, Scaled};
use crate::cycle_gan::{
    CycleGanOptions, DiscriminatorObjective, GeneratorObjective, LossVariantPolicy,
    MODE_SEEKING_WEIGHT, forward_pass, mode_seeking_loss,
};
use crate::networks::ImageNetwork;
use crate::nn::{Graph, Module};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

fn policy(f: fn(&mut CycleGanOptions)) -> LossVariantPolicy {
    let mut options = CycleGanOptions::default();
    f(&mut options);
    LossVariantPolicy::resolve(&options).unwrap()
}

#[test]
fn test_forward_pass_with_identity_generators() {
    let graph = Graph::new_with_seed(0);
    let g_a = Scaled::new(&graph, 1.0, "G_A");
    let g_b = Scaled::new(&graph, 1.0, "G_B");
    let real_a = graph.randn(&[2, 3, 4, 4]);
    let real_b = graph.randn(&[2, 3, 4, 4]);

    let images = forward_pass(&g_a, &g_b, &real_a, &real_b, false).unwrap();
    assert_eq!(images.rec_a.value(), real_a.value());
    assert_eq!(images.rec_b.value(), real_b.value());
    assert_eq!(images.fake_b.value(), real_a.value());
    assert!(images.idt_a.is_none() && images.idt_b.is_none());

    let images = forward_pass(&g_a, &g_b, &real_a, &real_b, true).unwrap();
    assert_eq!(images.idt_a.unwrap().value(), real_b.value());
    assert_eq!(images.idt_b.unwrap().value(), real_a.value());
}

#[test]
fn test_generator_terms_with_identity_generators() {
    let graph = Graph::new_with_seed(1);
    let g_a = Scaled::new(&graph, 1.0, "G_A");
    let g_b = Scaled::new(&graph, 1.0, "G_B");
    let d_a = LinearCritic::new(&graph, &[1, 1, 2, 2], 0.1, 0.0, "D_A");
    let d_b = LinearCritic::new(&graph, &[1, 1, 2, 2], 0.1, 0.0, "D_B");
    let real_a = graph.randn(&[1, 1, 2, 2]);
    let real_b = graph.randn(&[1, 1, 2, 2]);

    let policy = policy(|_| {});
    let images = forward_pass(&g_a, &g_b, &real_a, &real_b, false).unwrap();
    let terms = GeneratorObjective::new(&policy)
        .evaluate(&d_a, &d_b, &real_a, &real_b, &images)
        .unwrap();
    assert_eq!(terms.cycle_a.item().unwrap(), 0.0);
    assert_eq!(terms.cycle_b.item().unwrap(), 0.0);
    assert!(terms.idt_a.is_none() && terms.idt_b.is_none());

    let sum = terms.g_a.item().unwrap()
        + terms.g_b.item().unwrap()
        + terms.mode_seeking.item().unwrap();
    assert_abs_diff_eq!(terms.total.item().unwrap(), sum, epsilon = 1e-4);

    let policy = policy_with_identity();
    let images = forward_pass(&g_a, &g_b, &real_a, &real_b, true).unwrap();
    let terms = GeneratorObjective::new(&policy)
        .evaluate(&d_a, &d_b, &real_a, &real_b, &images)
        .unwrap();
    assert_eq!(terms.idt_a.unwrap().item().unwrap(), 0.0);
    assert_eq!(terms.idt_b.unwrap().item().unwrap(), 0.0);
}

fn policy_with_identity() -> LossVariantPolicy {
    policy(|o| o.lambda_identity = 0.5)
}

#[test]
fn test_identity_term_weighting() {
    let graph = Graph::new_with_seed(2);
    // G_A = 2x：idt_A = 2·real_B，L1(idt_A, real_B) = mean|real_B|
    let g_a = Scaled::new(&graph, 2.0, "G_A");
    let g_b = Scaled::new(&graph, 1.0, "G_B");
    let d = LinearCritic::new(&graph, &[1, 1, 2, 2], 0.0, 0.0, "D");
    let real_a = graph.input(&Tensor::ones(&[1, 1, 2, 2]));
    let real_b = graph.input(&Tensor::full(3.0, &[1, 1, 2, 2]));

    let policy = policy(|o| {
        o.lambda_a = 4.0;
        o.lambda_b = 2.0;
        o.lambda_identity = 0.5;
    });
    let images = forward_pass(&g_a, &g_b, &real_a, &real_b, true).unwrap();
    let terms = GeneratorObjective::new(&policy)
        .evaluate(&d, &d, &real_a, &real_b, &images)
        .unwrap();
    // 3 · λ_B · λ_idt
    assert_abs_diff_eq!(terms.idt_a.unwrap().item().unwrap(), 3.0, epsilon = 1e-6);
    assert_abs_diff_eq!(terms.idt_b.unwrap().item().unwrap(), 0.0);
    // rec_A = G_B(G_A(1)) = 2，L1 = 1，乘 λ_A
    assert_abs_diff_eq!(terms.cycle_a.item().unwrap(), 4.0, epsilon = 1e-6);
}

#[test]
fn test_mode_seeking_against_noise() {
    let graph = Graph::new_with_seed(3);
    let fake = graph.input_requiring_grad(&Tensor::zeros(&[1, 3, 64, 64]));
    let loss = mode_seeking_loss(&fake, &fake).unwrap();

    // fake = 0 时 mean|z₁| / mean|z₂ − z₁| → 1/√2，每个方向的项约为 √2
    let expected = MODE_SEEKING_WEIGHT * 2.0 * std::f32::consts::SQRT_2;
    assert_abs_diff_eq!(loss.item().unwrap(), expected, epsilon = 0.15);
    loss.backward().unwrap();
    assert!(fake.grad().unwrap().is_all_finite());
}

#[test]
fn test_discriminator_loss_does_not_reach_generator() {
    let graph = Graph::new_with_seed(4);
    let g = Scaled::new(&graph, 1.5, "G_A");
    let d = LinearCritic::new(&graph, &[1, 1, 2, 2], 0.3, 0.1, "D_A");
    let real = graph.randn(&[2, 1, 2, 2]);
    let fake = g.forward(&graph.randn(&[2, 1, 2, 2])).unwrap();
    assert!(fake.requires_grad());

    let policy = policy(|_| {});
    let loss = DiscriminatorObjective::new(&policy)
        .backward(&d, &real, &fake)
        .unwrap();
    assert!(loss.loss >= 0.0);
    assert_eq!(loss.gradient_penalty, 0.0);
    assert!(g.parameters()[0].grad().is_none());
    assert!(d.parameters().iter().all(|p| p.grad().is_some()));
}

#[test]
fn test_gradient_penalty_value_and_second_order_grad() {
    let graph = Graph::new_with_seed(5);
    // D(x) = sum(w ⊙ x) + b，∂D/∂x = w，‖w‖₂ = 2
    let d = LinearCritic::new(&graph, &[1, 1, 2, 2], 1.0, 0.0, "D_A");
    let image = graph.randn(&[1, 1, 2, 2]);

    let policy = policy(|o| {
        o.wgan = true;
        o.with_gp = true;
    });
    let loss = DiscriminatorObjective::new(&policy)
        .backward(&d, &image, &image)
        .unwrap();
    // Wasserstein 项为0，gp = 10 · (2 − 1)²
    assert_abs_diff_eq!(loss.gradient_penalty, 10.0, epsilon = 1e-4);
    assert_abs_diff_eq!(loss.loss, 10.0, epsilon = 1e-4);

    // ∂gp/∂w = 10 · 2(‖w‖ − 1) · w / ‖w‖ = 10
    let w_grad = d.parameters()[0].grad().unwrap();
    for g in w_grad.data_as_slice() {
        assert_abs_diff_eq!(*g, 10.0, epsilon = 1e-3);
    }
    let b_grad = d.parameters()[1].grad().unwrap();
    assert_abs_diff_eq!(b_grad.data_as_slice()[0], 0.0, epsilon = 1e-6);
}

#[test]
fn test_wasserstein_constant_critic() {
    let graph = Graph::new_with_seed(6);
    let d = LinearCritic::new(&graph, &[1, 3, 4, 4], 0.0, 0.7, "D_A");
    let real = graph.randn(&[2, 3, 4, 4]);
    let fake = graph.randn(&[2, 3, 4, 4]);
    let policy = policy(|o| o.wgan = true);
    let loss = DiscriminatorObjective::new(&policy)
        .backward(&d, &real, &fake)
        .unwrap();
    assert_eq!(loss.loss, 0.0);
}
