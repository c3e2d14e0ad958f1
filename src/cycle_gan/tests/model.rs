use super::{Broken, LinearCritic, Scaled};
use crate::cycle_gan::{
    CycleGanError, CycleGanModel, CycleGanOptions, Direction, LOSS_NAMES, StepPhase,
    UnpairedBatch, gate,
};
use crate::networks::ImageNetwork;
use crate::nn::{Graph, GraphError, Module};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

fn small_options() -> CycleGanOptions {
    CycleGanOptions {
        ngf: 2,
        ndf: 2,
        net_g: "resnet_1blocks".to_string(),
        net_d: "n_layers".to_string(),
        n_layers_d: 1,
        pool_size: 2,
        seed: Some(7),
        ..Default::default()
    }
}

fn image(shape: &[usize], phase: f32) -> Tensor {
    let len: usize = shape.iter().product();
    let data: Vec<f32> = (0..len)
        .map(|i| (i as f32 * 0.37 + phase).sin() * 0.8)
        .collect();
    Tensor::new(&data, shape)
}

fn small_batch() -> UnpairedBatch {
    UnpairedBatch::new(image(&[1, 3, 8, 8], 0.0), image(&[1, 3, 8, 8], 1.0))
}

/// 1 通道 2x2 图像上的玩具模型：G 为标量缩放，D 为线性打分
fn toy_model(options: CycleGanOptions) -> CycleGanModel {
    let graph = Graph::new_with_seed(11);
    let g_a = Box::new(Scaled::new(&graph, 1.0, "G_A"));
    let g_b = Box::new(Scaled::new(&graph, 1.0, "G_B"));
    let d_a: Box<dyn ImageNetwork> = Box::new(LinearCritic::new(&graph, &[1, 1, 2, 2], 1.0, 0.0, "D_A"));
    let d_b: Box<dyn ImageNetwork> = Box::new(LinearCritic::new(&graph, &[1, 1, 2, 2], 1.0, 0.0, "D_B"));
    let options = CycleGanOptions {
        input_nc: 1,
        output_nc: 1,
        seed: Some(11),
        ..options
    };
    CycleGanModel::from_networks(options, graph, g_a, g_b, Some((d_a, d_b))).unwrap()
}

fn toy_batch() -> UnpairedBatch {
    UnpairedBatch::new(image(&[1, 1, 2, 2], 0.0), image(&[1, 1, 2, 2], 2.0))
}

fn assert_invalid_operation(result: Result<(), CycleGanError>) {
    assert!(matches!(
        result,
        Err(CycleGanError::Graph(GraphError::InvalidOperation(_)))
    ));
}

#[test]
fn test_full_step_reaches_done() {
    let mut model = CycleGanModel::new(small_options()).unwrap();
    assert_eq!(model.phase(), StepPhase::Init);
    model.set_input(&small_batch());
    model.optimize_parameters().unwrap();

    assert_eq!(model.phase(), StepPhase::Done);
    let losses = model.losses();
    assert!(losses.is_finite());
    assert!(losses.d_a >= 0.0 && losses.d_b >= 0.0);
    assert_eq!(losses.idt_a, 0.0);
    assert_eq!(losses.gradient_penalty_a, 0.0);

    let names: Vec<&str> = model.current_losses().iter().map(|(n, _)| *n).collect();
    assert_eq!(names, LOSS_NAMES);
    assert_eq!(model.loss_names(), &LOSS_NAMES);
    assert_eq!(model.model_names(), ["G_A", "G_B", "D_A", "D_B"]);
    assert_eq!(model.name(), "CycleGANModel");
}

#[test]
fn test_phase_order_is_enforced() {
    let mut model = CycleGanModel::new(small_options()).unwrap();
    // 未载入数据
    assert_invalid_operation(model.forward());

    model.set_input(&small_batch());
    assert_invalid_operation(model.update_generators());
    assert_invalid_operation(model.update_discriminators());

    model.forward().unwrap();
    assert_eq!(model.phase(), StepPhase::Forwarded);
    assert_invalid_operation(model.update_discriminators());

    model.update_generators().unwrap();
    assert_eq!(model.phase(), StepPhase::GeneratorUpdated);
    let [d_a, d_b] = model.discriminators().unwrap();
    assert!(gate::is_frozen(&[d_a, d_b]));

    model.update_discriminators().unwrap();
    assert_eq!(model.phase(), StepPhase::Done);
    let [d_a, d_b] = model.discriminators().unwrap();
    assert!(gate::is_trainable(&[d_a, d_b]));

    // 重新载入会回到初始阶段
    model.set_input(&small_batch());
    assert_eq!(model.phase(), StepPhase::Init);
}

#[test]
fn test_identity_visuals() {
    let options = CycleGanOptions {
        lambda_identity: 0.5,
        ..small_options()
    };
    let mut model = CycleGanModel::new(options).unwrap();
    assert_eq!(
        model.visual_names(),
        ["real_A", "fake_B", "rec_A", "idt_A", "real_B", "fake_A", "rec_B", "idt_B"]
    );

    model.set_input(&small_batch());
    // 前向之前只有真实图像
    assert_eq!(model.current_visuals().len(), 2);

    model.optimize_parameters().unwrap();
    let visuals = model.current_visuals();
    assert_eq!(visuals.len(), 8);
    for (_, value) in &visuals {
        assert_eq!(value.shape(), &[1, 3, 8, 8]);
    }
    assert!(model.losses().idt_a > 0.0);
}

#[test]
fn test_inference_model() {
    let options = CycleGanOptions {
        is_train: false,
        lambda_identity: 0.5,
        ..small_options()
    };
    let mut model = CycleGanModel::new(options).unwrap();
    assert!(!model.is_train());
    assert!(model.discriminators().is_none());
    assert!(model.policy().is_none());
    assert_eq!(model.model_names(), ["G_A", "G_B"]);
    assert_eq!(model.visual_names().len(), 6);

    model.set_input(&small_batch());
    assert_invalid_operation(model.optimize_parameters());

    model.test().unwrap();
    let images = model.derived_images().unwrap();
    assert!(!images.fake_b.requires_grad());
    assert!(!images.rec_a.requires_grad());
    assert!(images.idt_a.is_none());
    assert!(model.graph().is_grad_enabled());
}

#[test]
fn test_direction_swaps_domains() {
    let options = CycleGanOptions {
        direction: Direction::BtoA,
        ..small_options()
    };
    let mut model = CycleGanModel::new(options).unwrap();
    let batch = small_batch().with_paths(vec!["a/0.png".to_string()], vec!["b/0.png".to_string()]);
    model.set_input(&batch);

    assert_eq!(model.image_paths(), ["b/0.png"]);
    let visuals = model.current_visuals();
    assert_eq!(visuals[0].0, "real_A");
    assert_eq!(visuals[0].1, batch.b);
    assert_eq!(visuals[1].0, "real_B");
    assert_eq!(visuals[1].1, batch.a);
}

#[test]
fn test_training_requires_discriminators() {
    let graph = Graph::new_with_seed(0);
    let g_a = Box::new(Scaled::new(&graph, 1.0, "G_A"));
    let g_b = Box::new(Scaled::new(&graph, 1.0, "G_B"));
    let result = CycleGanModel::from_networks(CycleGanOptions::default(), graph, g_a, g_b, None);
    assert!(result.is_err());
}

#[test]
fn test_injected_networks_still_validate_options() {
    let invalid = [
        CycleGanOptions {
            no_dropout: false,
            ..Default::default()
        },
        CycleGanOptions {
            lr: 0.0,
            ..Default::default()
        },
        CycleGanOptions {
            beta1: 1.0,
            ..Default::default()
        },
        CycleGanOptions {
            with_gp: true,
            ..Default::default()
        },
    ];
    for options in invalid {
        let graph = Graph::new_with_seed(0);
        let g_a = Box::new(Scaled::new(&graph, 1.0, "G_A"));
        let g_b = Box::new(Scaled::new(&graph, 1.0, "G_B"));
        let d_a: Box<dyn ImageNetwork> = Box::new(LinearCritic::new(&graph, &[1, 1, 2, 2], 1.0, 0.0, "D_A"));
        let d_b: Box<dyn ImageNetwork> = Box::new(LinearCritic::new(&graph, &[1, 1, 2, 2], 1.0, 0.0, "D_B"));
        let result = CycleGanModel::from_networks(options, graph, g_a, g_b, Some((d_a, d_b)));
        assert!(matches!(result, Err(CycleGanError::Config(_))));
    }

    // 推理模式不解析损失策略，也不需要判别器
    let graph = Graph::new_with_seed(0);
    let g_a = Box::new(Scaled::new(&graph, 1.0, "G_A"));
    let g_b = Box::new(Scaled::new(&graph, 1.0, "G_B"));
    let options = CycleGanOptions {
        is_train: false,
        ..Default::default()
    };
    let model = CycleGanModel::from_networks(options, graph, g_a, g_b, None).unwrap();
    assert!(!model.is_train());
    assert!(model.policy().is_none());
}

#[test]
fn test_generator_failure_leaves_discriminators_trainable() {
    let graph = Graph::new_with_seed(3);
    let g_a = Box::new(Scaled::new(&graph, 1.0, "G_A"));
    let g_b = Box::new(Scaled::new(&graph, 1.0, "G_B"));
    let d_a: Box<dyn ImageNetwork> = Box::new(Broken::new(&graph));
    let d_b: Box<dyn ImageNetwork> = Box::new(Broken::new(&graph));
    let options = CycleGanOptions {
        input_nc: 1,
        output_nc: 1,
        seed: Some(3),
        ..Default::default()
    };
    let mut model = CycleGanModel::from_networks(options, graph, g_a, g_b, Some((d_a, d_b))).unwrap();
    model.set_input(&toy_batch());
    model.forward().unwrap();

    assert!(model.update_generators().is_err());
    assert_eq!(model.phase(), StepPhase::Forwarded);
    let [d_a, d_b] = model.discriminators().unwrap();
    assert!(gate::is_trainable(&[d_a, d_b]));
    // 优化器没有 step
    for g in model.generators() {
        assert_eq!(g.parameters()[0].value().data_as_slice(), [1.0]);
    }
}

#[test]
fn test_generator_step_leaves_discriminator_grads_untouched() {
    let mut model = toy_model(CycleGanOptions::default());
    model.set_input(&toy_batch());
    model.optimize_parameters().unwrap();

    let [d_a, d_b] = model.discriminators().unwrap();
    let snapshot: Vec<Tensor> = d_a
        .parameters()
        .iter()
        .chain(&d_b.parameters())
        .map(|p| p.grad().unwrap())
        .collect();

    model.set_input(&toy_batch());
    model.forward().unwrap();
    model.update_generators().unwrap();

    let [d_a, d_b] = model.discriminators().unwrap();
    let after: Vec<Tensor> = d_a
        .parameters()
        .iter()
        .chain(&d_b.parameters())
        .map(|p| p.grad().unwrap())
        .collect();
    assert_eq!(snapshot, after);
    for g in model.generators() {
        assert!(g.parameters()[0].grad().is_some());
    }
}

#[test]
fn test_gradient_penalty_is_reported() {
    let options = CycleGanOptions {
        wgan: true,
        with_gp: true,
        ..Default::default()
    };
    let mut model = toy_model(options);
    model.set_input(&toy_batch());
    model.optimize_parameters().unwrap();

    // 线性打分的梯度恒为 w（全1），‖w‖₂ = 2
    let losses = model.losses();
    assert_abs_diff_eq!(losses.gradient_penalty_a, 10.0, epsilon = 1e-3);
    assert_abs_diff_eq!(losses.gradient_penalty_b, 10.0, epsilon = 1e-3);
    assert!(losses.is_finite());
}
