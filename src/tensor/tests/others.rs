use crate::errors::TensorError;
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_sum_and_mean_are_1x1() {
    let t = Tensor::new(&[1., 2., 3., 4.], &[1, 1, 2, 2]);
    assert_eq!(t.sum(), Tensor::new(&[10.], &[1, 1]));
    assert_eq!(t.mean(), Tensor::new(&[2.5], &[1, 1]));
    assert_eq!(t.mean().number(), Some(2.5));
}

#[test]
fn test_safe_reciprocal_zero() {
    let t = Tensor::new(&[0., 2., -4.], &[3]);
    assert_eq!(t.safe_reciprocal().data_as_slice(), &[0., 0.5, -0.25]);
}

#[test]
fn test_sign_and_abs() {
    let t = Tensor::new(&[-3., 0., 2.], &[3]);
    assert_eq!(t.sign().data_as_slice(), &[-1., 0., 1.]);
    assert_eq!(t.abs().data_as_slice(), &[3., 0., 2.]);
}

#[test]
fn test_sigmoid_tanh() {
    let t = Tensor::new(&[0.], &[1]);
    assert_abs_diff_eq!(t.sigmoid().data_as_slice()[0], 0.5);
    assert_abs_diff_eq!(t.tanh().data_as_slice()[0], 0.0);
}

#[test]
fn test_matmul() {
    let a = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[2, 3]);
    let b = Tensor::new(&[1., 0., 0., 1., 1., 1.], &[3, 2]);
    assert_eq!(a.matmul(&b).unwrap(), Tensor::new(&[4., 5., 10., 11.], &[2, 2]));

    let bad = Tensor::ones(&[2, 2]);
    assert!(matches!(
        a.matmul(&bad),
        Err(TensorError::OperatorError { .. })
    ));
}

#[test]
fn test_finite_check() {
    assert!(Tensor::ones(&[2, 2]).is_all_finite());
    assert!(!Tensor::new(&[1., f32::NAN], &[2]).is_all_finite());
}

#[test]
fn test_normal_with_rng_statistics() {
    use rand::SeedableRng;
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let t = Tensor::normal_with_rng(0.0, 1.0, &[100, 100], &mut rng);
    let mean = t.mean().number().unwrap();
    let var = t.powf(2.0).mean().number().unwrap() - mean * mean;
    assert_abs_diff_eq!(mean, 0.0, epsilon = 0.05);
    assert_abs_diff_eq!(var, 1.0, epsilon = 0.05);
}
