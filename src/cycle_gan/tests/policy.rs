use crate::cycle_gan::{AdversarialLossKind, CycleGanOptions, LossVariantPolicy};
use crate::errors::ConfigError;
use crate::networks::NormKind;
use crate::nn::Graph;
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

fn resolve(f: fn(&mut CycleGanOptions)) -> Result<LossVariantPolicy, ConfigError> {
    let mut options = CycleGanOptions::default();
    f(&mut options);
    LossVariantPolicy::resolve(&options)
}

#[test]
fn test_resolve_variants() {
    let lsgan = resolve(|_| {}).unwrap();
    assert_eq!(lsgan.adversarial, AdversarialLossKind::LeastSquares);
    assert!(lsgan.gradient_penalty.is_none());
    assert!(!lsgan.use_sigmoid());
    assert_eq!(lsgan.discriminator_norm(NormKind::Instance), NormKind::Instance);

    let vanilla = resolve(|o| o.no_lsgan = true).unwrap();
    assert_eq!(vanilla.adversarial, AdversarialLossKind::Vanilla);
    assert!(vanilla.use_sigmoid());

    let wgan_gp = resolve(|o| {
        o.wgan = true;
        o.with_gp = true;
        o.lambda_gp = 5.0;
    })
    .unwrap();
    assert_eq!(wgan_gp.adversarial, AdversarialLossKind::Wasserstein);
    assert_eq!(wgan_gp.gradient_penalty.unwrap().weight, 5.0);

    let sn = resolve(|o| o.sn_gan = true).unwrap();
    assert!(sn.spectral_norm);
    assert_eq!(sn.discriminator_norm(NormKind::Instance), NormKind::Spectral);
}

#[test]
fn test_resolve_conflicts() {
    let conflict = |f: fn(&mut CycleGanOptions)| matches!(resolve(f), Err(ConfigError::Conflict(_)));
    assert!(conflict(|o| {
        o.wgan = true;
        o.no_lsgan = true;
    }));
    assert!(conflict(|o| o.with_gp = true));
    assert!(conflict(|o| {
        o.sn_gan = true;
        o.wgan = true;
    }));
    assert!(conflict(|o| {
        o.sn_gan = true;
        o.wgan = true;
        o.with_gp = true;
    }));
}

#[test]
fn test_resolve_invalid_weights() {
    let invalid = |f: fn(&mut CycleGanOptions)| matches!(resolve(f), Err(ConfigError::Invalid(_)));
    assert!(invalid(|o| o.lambda_a = -1.0));
    assert!(invalid(|o| o.lambda_identity = f32::INFINITY));
    assert!(invalid(|o| {
        o.wgan = true;
        o.with_gp = true;
        o.lambda_gp = 0.0;
    }));
}

#[test]
fn test_least_squares_losses() {
    let policy = resolve(|_| {}).unwrap();
    let graph = Graph::new_with_seed(0);
    let ones = graph.input(&Tensor::ones(&[2, 1, 3, 3]));
    let zeros = graph.input(&Tensor::zeros(&[2, 1, 3, 3]));

    // 完美判别
    assert_abs_diff_eq!(policy.discriminator_loss(&ones, &zeros).unwrap().item().unwrap(), 0.0);
    // 完全判反：0.5·1 + 0.5·1
    assert_abs_diff_eq!(policy.discriminator_loss(&zeros, &ones).unwrap().item().unwrap(), 1.0);
    assert_abs_diff_eq!(policy.generator_adversarial_loss(&zeros).unwrap().item().unwrap(), 1.0);
}

#[test]
fn test_vanilla_losses() {
    let policy = resolve(|o| o.no_lsgan = true).unwrap();
    let graph = Graph::new_with_seed(0);
    let half = graph.input(&Tensor::full(0.5, &[1, 1, 2, 2]));
    let ln2 = std::f32::consts::LN_2;
    assert_abs_diff_eq!(
        policy.discriminator_loss(&half, &half).unwrap().item().unwrap(),
        ln2,
        epsilon = 1e-5
    );
    assert_abs_diff_eq!(
        policy.generator_adversarial_loss(&half).unwrap().item().unwrap(),
        ln2,
        epsilon = 1e-5
    );
}

#[test]
fn test_wasserstein_losses() {
    let policy = resolve(|o| o.wgan = true).unwrap();
    let graph = Graph::new_with_seed(0);
    let real = graph.input(&Tensor::new(&[1.0, 3.0], &[2, 1, 1, 1]));
    let fake = graph.input(&Tensor::new(&[-1.0, 0.0], &[2, 1, 1, 1]));
    // mean(fake) - mean(real) = -0.5 - 2
    assert_abs_diff_eq!(policy.discriminator_loss(&real, &fake).unwrap().item().unwrap(), -2.5);
    assert_abs_diff_eq!(policy.generator_adversarial_loss(&fake).unwrap().item().unwrap(), 0.5);
}
