/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : PatchGAN 判别器与逐像素判别器
 *
 * norm 为 Spectral 时每个卷积都包上谱归一化，且不再使用 instance norm。
 */

use super::{DiscriminatorSpec, ImageNetwork, NormKind};
use crate::nn::{
    Conv2d, Graph, GraphError, Init, InstanceNorm2d, Module, SpectralNorm, Var,
    VarActivationOps,
};

const LEAKY_SLOPE: f32 = 0.2;

/// 普通卷积或谱归一化卷积
enum DiscConv {
    Plain(Conv2d),
    Spectral(SpectralNorm),
}

impl DiscConv {
    #[allow(clippy::too_many_arguments)]
    fn new(
        graph: &Graph,
        in_channels: usize,
        out_channels: usize,
        kernel: usize,
        stride: usize,
        padding: usize,
        norm: NormKind,
        init: &Init,
        name: &str,
    ) -> Result<Self, GraphError> {
        let conv = Conv2d::new(
            graph,
            in_channels,
            out_channels,
            (kernel, kernel),
            (stride, stride),
            (padding, padding),
            true,
            init,
            name,
        );
        Ok(match norm {
            NormKind::Spectral => Self::Spectral(SpectralNorm::new(graph, conv)?),
            NormKind::Instance | NormKind::None => Self::Plain(conv),
        })
    }

    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        match self {
            Self::Plain(conv) => conv.forward(x),
            Self::Spectral(conv) => conv.forward(x),
        }
    }
}

impl Module for DiscConv {
    fn parameters(&self) -> Vec<Var> {
        match self {
            Self::Plain(conv) => conv.parameters(),
            Self::Spectral(conv) => conv.parameters(),
        }
    }
}

/// 中间层：卷积 -> （instance norm） -> LeakyReLU
struct Stage {
    conv: DiscConv,
    norm: Option<InstanceNorm2d>,
}

impl Stage {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let h = self.conv.forward(x)?;
        let h = match &self.norm {
            Some(norm) => norm.forward(&h)?,
            None => h,
        };
        h.leaky_relu(LEAKY_SLOPE)
    }
}

fn stage_norm(norm: NormKind) -> Option<InstanceNorm2d> {
    (norm == NormKind::Instance).then(InstanceNorm2d::default)
}

fn finish(score: Var, use_sigmoid: bool) -> Result<Var, GraphError> {
    if use_sigmoid { score.sigmoid() } else { Ok(score) }
}

/// PatchGAN：4x4 卷积逐层下采样，输出 [batch, 1, H', W'] 的打分图
///
/// 256x256 输入、3层时输出 30x30，每个位置的感受野为 70x70
pub struct NLayerDiscriminator {
    name: String,
    stages: Vec<Stage>,
    head: DiscConv,
    use_sigmoid: bool,
}

impl NLayerDiscriminator {
    pub fn new(graph: &Graph, spec: &DiscriminatorSpec, n_layers: usize) -> Result<Self, GraphError> {
        let init = spec.init.to_init(spec.init_gain);
        let name = &spec.name;
        let ndf = spec.ndf;
        let conv = |cin, cout, stride, i: usize| {
            DiscConv::new(graph, cin, cout, 4, stride, 1, spec.norm, &init, &format!("{name}.conv{i}"))
        };

        // 第一层不做 instance norm
        let mut stages = vec![Stage {
            conv: conv(spec.input_nc, ndf, 2, 0)?,
            norm: None,
        }];
        let mut mult = 1;
        for n in 1..=n_layers {
            let prev = mult;
            mult = 2usize.pow(n.min(3) as u32);
            let stride = if n < n_layers { 2 } else { 1 };
            stages.push(Stage {
                conv: conv(ndf * prev, ndf * mult, stride, n)?,
                norm: stage_norm(spec.norm),
            });
        }
        let head = conv(ndf * mult, 1, 1, n_layers + 1)?;

        Ok(Self {
            name: name.clone(),
            stages,
            head,
            use_sigmoid: spec.use_sigmoid,
        })
    }
}

impl ImageNetwork for NLayerDiscriminator {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let mut h = x.clone();
        for stage in &self.stages {
            h = stage.forward(&h)?;
        }
        finish(self.head.forward(&h)?, self.use_sigmoid)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Module for NLayerDiscriminator {
    fn parameters(&self) -> Vec<Var> {
        let mut params: Vec<Var> = self.stages.iter().flat_map(|s| s.conv.parameters()).collect();
        params.extend(self.head.parameters());
        params
    }
}

/// 1x1 卷积的逐像素判别器（PixelGAN），输出与输入同尺寸的打分图
pub struct PixelDiscriminator {
    name: String,
    stages: Vec<Stage>,
    head: DiscConv,
    use_sigmoid: bool,
}

impl PixelDiscriminator {
    pub fn new(graph: &Graph, spec: &DiscriminatorSpec) -> Result<Self, GraphError> {
        let init = spec.init.to_init(spec.init_gain);
        let name = &spec.name;
        let ndf = spec.ndf;
        let conv = |cin, cout, i: usize| {
            DiscConv::new(graph, cin, cout, 1, 1, 0, spec.norm, &init, &format!("{name}.conv{i}"))
        };
        let stages = vec![
            Stage {
                conv: conv(spec.input_nc, ndf, 0)?,
                norm: None,
            },
            Stage {
                conv: conv(ndf, ndf * 2, 1)?,
                norm: stage_norm(spec.norm),
            },
        ];
        Ok(Self {
            name: name.clone(),
            stages,
            head: conv(ndf * 2, 1, 2)?,
            use_sigmoid: spec.use_sigmoid,
        })
    }
}

impl ImageNetwork for PixelDiscriminator {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let mut h = x.clone();
        for stage in &self.stages {
            h = stage.forward(&h)?;
        }
        finish(self.head.forward(&h)?, self.use_sigmoid)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Module for PixelDiscriminator {
    fn parameters(&self) -> Vec<Var> {
        let mut params: Vec<Var> = self.stages.iter().flat_map(|s| s.conv.parameters()).collect();
        params.extend(self.head.parameters());
        params
    }
}
