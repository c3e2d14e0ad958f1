use crate::errors::ConfigError;
use crate::networks::{
    DiscriminatorArch, DiscriminatorSpec, GeneratorArch, GeneratorSpec, InitKind, NormKind,
    define_discriminator, define_generator,
};
use crate::nn::{Graph, Module};

fn generator_spec(norm: NormKind) -> GeneratorSpec {
    GeneratorSpec {
        name: "G_A".to_string(),
        input_nc: 3,
        output_nc: 3,
        ngf: 4,
        arch: GeneratorArch::Resnet { blocks: 2 },
        norm,
        use_dropout: false,
        init: InitKind::Normal,
        init_gain: 0.02,
    }
}

fn discriminator_spec(arch: DiscriminatorArch, norm: NormKind, use_sigmoid: bool) -> DiscriminatorSpec {
    DiscriminatorSpec {
        name: "D_A".to_string(),
        input_nc: 3,
        ndf: 4,
        arch,
        norm,
        use_sigmoid,
        init: InitKind::Normal,
        init_gain: 0.02,
    }
}

#[test]
fn test_parse_generator_arch() {
    assert_eq!(
        "resnet_9blocks".parse::<GeneratorArch>().unwrap(),
        GeneratorArch::Resnet { blocks: 9 }
    );
    assert_eq!(GeneratorArch::Resnet { blocks: 6 }.to_string(), "resnet_6blocks");
    assert!(matches!(
        "unet_256".parse::<GeneratorArch>(),
        Err(ConfigError::Unsupported(_))
    ));
    assert!(matches!(
        "resnet_xblocks".parse::<GeneratorArch>(),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_parse_norm_init_and_discriminator() {
    assert_eq!("spectral".parse::<NormKind>().unwrap(), NormKind::Spectral);
    assert!(matches!("batch".parse::<NormKind>(), Err(ConfigError::Unsupported(_))));
    assert_eq!("xavier".parse::<InitKind>().unwrap(), InitKind::Xavier);
    assert_eq!(DiscriminatorArch::parse("basic", 5).unwrap(), DiscriminatorArch::Basic);
    assert_eq!(DiscriminatorArch::parse("n_layers", 2).unwrap(), DiscriminatorArch::NLayers(2));
    assert!(DiscriminatorArch::parse("n_layers", 0).is_err());
    assert!(DiscriminatorArch::parse("patch", 3).is_err());
}

#[test]
fn test_resnet_generator_keeps_image_shape() {
    let graph = Graph::new_with_seed(0);
    let net = define_generator(&graph, &generator_spec(NormKind::Instance)).unwrap();
    let x = graph.rand_uniform(&[2, 3, 16, 16], -1.0, 1.0);
    let y = net.forward(&x).unwrap();

    assert_eq!(y.shape(), vec![2, 3, 16, 16]);
    assert!(y.value().data_as_slice().iter().all(|v| v.abs() <= 1.0));
    assert_eq!(net.name(), "G_A");
    // stem + 2 下采样 + 2x2 残差卷积 + 2 上采样 + head，每个卷积一核一偏置
    assert_eq!(net.parameters().len(), 2 * (1 + 2 + 4 + 2 + 1));
}

#[test]
fn test_generator_rejects_spectral_norm_and_dropout() {
    let graph = Graph::new_with_seed(0);
    assert!(define_generator(&graph, &generator_spec(NormKind::Spectral)).is_err());

    let mut spec = generator_spec(NormKind::Instance);
    spec.use_dropout = true;
    assert!(define_generator(&graph, &spec).is_err());
}

#[test]
fn test_patchgan_output_shape() {
    let graph = Graph::new_with_seed(0);
    let net = define_discriminator(
        &graph,
        &discriminator_spec(DiscriminatorArch::Basic, NormKind::Instance, false),
    )
    .unwrap();
    // 64 -> 32 -> 16 -> 8 -> 7 -> 6
    let x = graph.randn(&[1, 3, 64, 64]);
    assert_eq!(net.forward(&x).unwrap().shape(), vec![1, 1, 6, 6]);
}

#[test]
fn test_pixel_discriminator_with_sigmoid() {
    let graph = Graph::new_with_seed(0);
    let net = define_discriminator(
        &graph,
        &discriminator_spec(DiscriminatorArch::Pixel, NormKind::None, true),
    )
    .unwrap();
    let score = net.forward(&graph.randn(&[2, 3, 5, 5])).unwrap();
    assert_eq!(score.shape(), vec![2, 1, 5, 5]);
    assert!(
        score
            .value()
            .data_as_slice()
            .iter()
            .all(|p| *p > 0.0 && *p < 1.0)
    );
}

#[test]
fn test_spectral_discriminator_has_same_parameters() {
    let graph = Graph::new_with_seed(0);
    let arch = DiscriminatorArch::NLayers(2);
    let plain = define_discriminator(&graph, &discriminator_spec(arch, NormKind::Instance, false)).unwrap();
    let spectral = define_discriminator(&graph, &discriminator_spec(arch, NormKind::Spectral, false)).unwrap();
    assert_eq!(plain.num_params(), spectral.num_params());

    // 16 -> 8 -> 4 -> 3 -> 2
    let out = spectral.forward(&graph.randn(&[1, 3, 16, 16])).unwrap();
    assert_eq!(out.shape(), vec![1, 1, 2, 2]);
    assert!(out.value().is_all_finite());
}

#[test]
fn test_init_gain_controls_weight_scale() {
    let graph = Graph::new_with_seed(7);
    let mut spec = discriminator_spec(DiscriminatorArch::NLayers(1), NormKind::None, false);
    spec.ndf = 16;
    spec.init_gain = 0.5;
    let net = define_discriminator(&graph, &spec).unwrap();
    let kernel = net.parameters()[0].value();
    let n = kernel.size() as f32;
    let std = (kernel.data_as_slice().iter().map(|v| v * v).sum::<f32>() / n).sqrt();
    assert!((std - 0.5).abs() < 0.1, "std = {std}");
}
