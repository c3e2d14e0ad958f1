use crate::errors::TensorError;
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn dot(a: &Tensor, b: &Tensor) -> f32 {
    (a * b).sum().number().unwrap()
}

#[test]
fn test_conv2d_known_values() {
    // 3x3 输入，2x2 全1卷积核，步长1，无填充
    let x = Tensor::new(&[1., 2., 3., 4., 5., 6., 7., 8., 9.], &[1, 1, 3, 3]);
    let k = Tensor::ones(&[1, 1, 2, 2]);
    let y = x.conv2d(&k, (1, 1), (0, 0)).unwrap();
    assert_eq!(y, Tensor::new(&[12., 16., 24., 28.], &[1, 1, 2, 2]));
}

#[test]
fn test_conv2d_zero_padding_and_stride() {
    let x = Tensor::ones(&[1, 1, 4, 4]);
    let k = Tensor::ones(&[2, 1, 3, 3]);
    let y = x.conv2d(&k, (2, 2), (1, 1)).unwrap();
    assert_eq!(y.shape(), &[1, 2, 2, 2]);
    // 左上角窗口有一行一列落在零填充区
    assert_eq!(y.data_as_slice()[0], 4.);
    assert_eq!(y.data_as_slice()[3], 9.);
}

#[test]
fn test_conv2d_shape_errors() {
    let x = Tensor::ones(&[1, 3, 4, 4]);
    let k = Tensor::ones(&[1, 2, 3, 3]);
    assert!(matches!(
        x.conv2d(&k, (1, 1), (0, 0)),
        Err(TensorError::InvalidConvolution(_))
    ));
    let k = Tensor::ones(&[1, 3, 7, 7]);
    assert!(matches!(
        x.conv2d(&k, (1, 1), (1, 1)),
        Err(TensorError::InvalidConvolution(_))
    ));
    assert!(matches!(
        Tensor::ones(&[3, 4, 4]).conv2d(&k, (1, 1), (0, 0)),
        Err(TensorError::DimensionMismatch { expected: 4, .. })
    ));
}

/// <conv(x, K), g> == <x, convT(g, K)> == <K, wgrad(x, g)>
#[test]
fn test_conv_family_adjoint_identity() {
    let mut rng = StdRng::seed_from_u64(42);
    let configs = [((1, 1), (0, 0)), ((2, 2), (1, 1)), ((1, 1), (3, 3))];
    for (stride, padding) in configs {
        let x = Tensor::normal_with_rng(0.0, 1.0, &[2, 3, 9, 9], &mut rng);
        let k = Tensor::normal_with_rng(0.0, 1.0, &[4, 3, 4, 4], &mut rng);
        let y = x.conv2d(&k, stride, padding).unwrap();
        let g = Tensor::normal_with_rng(0.0, 1.0, y.shape(), &mut rng);

        let gx = g.conv_transpose2d(&k, stride, padding, (9, 9)).unwrap();
        let gk = x.conv2d_weight_grad(&g, (4, 4), stride, padding).unwrap();
        assert_eq!(gx.shape(), x.shape());
        assert_eq!(gk.shape(), k.shape());

        let lhs = dot(&y, &g);
        assert_abs_diff_eq!(lhs, dot(&x, &gx), epsilon = 1e-2);
        assert_abs_diff_eq!(lhs, dot(&k, &gk), epsilon = 1e-2);
    }
}

#[test]
fn test_conv_transpose2d_upsamples() {
    // 生成器上采样：3x3 核，步长2，填充1，输出 2H
    let g = Tensor::ones(&[1, 2, 4, 4]);
    let k = Tensor::ones(&[2, 1, 3, 3]);
    let up = g.conv_transpose2d(&k, (2, 2), (1, 1), (8, 8)).unwrap();
    assert_eq!(up.shape(), &[1, 1, 8, 8]);
    // 7x7 同样能卷积到 4x4，但 9x9 不行
    assert!(g.conv_transpose2d(&k, (2, 2), (1, 1), (7, 7)).is_ok());
    assert!(matches!(
        g.conv_transpose2d(&k, (2, 2), (1, 1), (9, 9)),
        Err(TensorError::InvalidConvolution(_))
    ));
}
