use crate::nn::{
    Conv2d, ConvTranspose2d, Graph, Init, InstanceNorm2d, Module, SpectralNorm, VarReduceOps,
};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_conv2d_layer_shapes_and_params() {
    let graph = Graph::new_with_seed(0);
    let conv = Conv2d::new(&graph, 3, 8, (4, 4), (2, 2), (1, 1), true, &Init::Kaiming, "c");
    let x = graph.input(&Tensor::ones(&[2, 3, 16, 16]));
    assert_eq!(conv.forward(&x).unwrap().shape(), vec![2, 8, 8, 8]);
    assert_eq!(conv.num_params(), 8 * 3 * 4 * 4 + 8);
    assert_eq!(conv.parameters()[0].name(), "c_K");
    assert_eq!(conv.bias().unwrap().value(), Tensor::zeros(&[1, 8, 1, 1]));
}

#[test]
fn test_conv_transpose_doubles_resolution() {
    let graph = Graph::new_with_seed(0);
    let up = ConvTranspose2d::new(
        &graph,
        4,
        2,
        (3, 3),
        (2, 2),
        (1, 1),
        (1, 1),
        true,
        &Init::Normal { mean: 0.0, std: 0.02 },
        "up",
    )
    .unwrap();
    let x = graph.input(&Tensor::ones(&[1, 4, 5, 7]));
    assert_eq!(up.forward(&x).unwrap().shape(), vec![1, 2, 10, 14]);

    let bad = ConvTranspose2d::new(&graph, 4, 2, (3, 3), (2, 2), (1, 1), (2, 2), true, &Init::Zeros, "bad");
    assert!(bad.is_err());
}

#[test]
fn test_instance_norm_statistics() {
    let graph = Graph::new_with_seed(3);
    let x = graph.randn(&[2, 3, 4, 4]).scale(5.0).unwrap().add_scalar(2.0).unwrap();
    let y = InstanceNorm2d::default().forward(&x).unwrap();

    let mean = y.sum_to(&[2, 3, 1, 1]).unwrap().value();
    for m in mean.data_as_slice() {
        assert_abs_diff_eq!(*m / 16.0, 0.0, epsilon = 1e-4);
    }
    let sq = (&y * &y).sum_to(&[2, 3, 1, 1]).unwrap().value();
    for s in sq.data_as_slice() {
        assert_abs_diff_eq!(*s / 16.0, 1.0, epsilon = 1e-3);
    }
}

#[test]
fn test_instance_norm_gradient() {
    let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(4);
    let weights = Tensor::normal_with_rng(0.0, 1.0, &[1, 2, 3, 3], &mut rng);
    super::check_gradient(
        &Tensor::normal_with_rng(0.0, 1.0, &[1, 2, 3, 3], &mut rng),
        |x| {
            let y = InstanceNorm2d::default().forward(x)?;
            y.try_mul(&x.constant_like(&weights))?.sum()
        },
        3e-2,
    );
}

#[test]
fn test_spectral_norm_estimates_largest_singular_value() {
    let graph = Graph::new_with_seed(5);
    // 卷积核展平后为 [2, 4]，奇异值分别为 3 与 1
    let kernel = Tensor::new(&[3.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0], &[2, 1, 2, 2]);
    let conv = Conv2d::new(&graph, 1, 2, (2, 2), (1, 1), (0, 0), false, &Init::Zeros, "sn");
    conv.kernel().set_value(&kernel).unwrap();
    let sn = SpectralNorm::new(&graph, conv).unwrap();

    let x = graph.input(&Tensor::ones(&[1, 1, 3, 3]));
    for _ in 0..20 {
        sn.forward(&x).unwrap();
    }
    assert_abs_diff_eq!(sn.sigma().unwrap().item().unwrap(), 3.0, epsilon = 1e-3);

    // 归一化后的核最大奇异值为1：全1输入上第一个通道输出为 3/σ = 1
    let out = sn.forward(&x).unwrap().value();
    assert_abs_diff_eq!(out.data_as_slice()[0], 1.0, epsilon = 1e-3);
    assert_eq!(sn.num_params(), 8);
}
