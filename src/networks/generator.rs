/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : ResNet 生成器
 *
 * ReflectionPad(3) -> Conv7x7 -> Norm -> ReLU
 * -> 2 x [Conv3x3/s2 -> Norm -> ReLU]                  （下采样）
 * -> n x ResnetBlock
 * -> 2 x [ConvTranspose3x3/s2 -> Norm -> ReLU]         （上采样）
 * -> ReflectionPad(3) -> Conv7x7 -> Tanh
 *
 * 输入 H、W 需为4的倍数，输出与输入同尺寸。
 */

use super::{GeneratorSpec, ImageNetwork, NormKind};
use crate::nn::{
    Conv2d, ConvTranspose2d, Graph, GraphError, Init, InstanceNorm2d, Module, Var,
    VarActivationOps, VarShapeOps,
};

const N_DOWNSAMPLING: u32 = 2;

fn norm_layer(norm: NormKind) -> Option<InstanceNorm2d> {
    (norm == NormKind::Instance).then(InstanceNorm2d::default)
}

fn normalize(norm: Option<&InstanceNorm2d>, x: Var) -> Result<Var, GraphError> {
    match norm {
        Some(norm) => norm.forward(&x),
        None => Ok(x),
    }
}

/// 残差块：x + [Pad -> Conv3x3 -> Norm -> ReLU -> Pad -> Conv3x3 -> Norm](x)
struct ResnetBlock {
    conv1: Conv2d,
    conv2: Conv2d,
    norm: Option<InstanceNorm2d>,
}

impl ResnetBlock {
    fn new(graph: &Graph, dim: usize, norm: NormKind, init: &Init, name: &str) -> Self {
        let conv = |suffix: &str| {
            Conv2d::new(graph, dim, dim, (3, 3), (1, 1), (0, 0), true, init, &format!("{name}.{suffix}"))
        };
        Self {
            conv1: conv("conv1"),
            conv2: conv("conv2"),
            norm: norm_layer(norm),
        }
    }

    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let h = self.conv1.forward(&x.reflection_pad2d(1)?)?;
        let h = normalize(self.norm.as_ref(), h)?.relu()?;
        let h = self.conv2.forward(&h.reflection_pad2d(1)?)?;
        x.try_add(&normalize(self.norm.as_ref(), h)?)
    }
}

impl Module for ResnetBlock {
    fn parameters(&self) -> Vec<Var> {
        let mut params = self.conv1.parameters();
        params.extend(self.conv2.parameters());
        params
    }
}

pub struct ResnetGenerator {
    name: String,
    stem: Conv2d,
    down: Vec<Conv2d>,
    blocks: Vec<ResnetBlock>,
    up: Vec<ConvTranspose2d>,
    head: Conv2d,
    norm: Option<InstanceNorm2d>,
}

impl ResnetGenerator {
    pub fn new(graph: &Graph, spec: &GeneratorSpec, n_blocks: usize) -> Result<Self, GraphError> {
        let init = spec.init.to_init(spec.init_gain);
        let ngf = spec.ngf;
        let name = &spec.name;

        let stem = Conv2d::new(graph, spec.input_nc, ngf, (7, 7), (1, 1), (0, 0), true, &init, &format!("{name}.stem"));
        let down = (0..N_DOWNSAMPLING)
            .map(|i| {
                let mult = 2usize.pow(i);
                Conv2d::new(
                    graph,
                    ngf * mult,
                    ngf * mult * 2,
                    (3, 3),
                    (2, 2),
                    (1, 1),
                    true,
                    &init,
                    &format!("{name}.down{i}"),
                )
            })
            .collect();

        let dim = ngf * 2usize.pow(N_DOWNSAMPLING);
        let blocks = (0..n_blocks)
            .map(|i| ResnetBlock::new(graph, dim, spec.norm, &init, &format!("{name}.block{i}")))
            .collect();

        let up = (0..N_DOWNSAMPLING)
            .map(|i| {
                let mult = 2usize.pow(N_DOWNSAMPLING - i);
                ConvTranspose2d::new(
                    graph,
                    ngf * mult,
                    ngf * mult / 2,
                    (3, 3),
                    (2, 2),
                    (1, 1),
                    (1, 1),
                    true,
                    &init,
                    &format!("{name}.up{i}"),
                )
            })
            .collect::<Result<_, _>>()?;

        let head = Conv2d::new(graph, ngf, spec.output_nc, (7, 7), (1, 1), (0, 0), true, &init, &format!("{name}.head"));

        Ok(Self {
            name: name.clone(),
            stem,
            down,
            blocks,
            up,
            head,
            norm: norm_layer(spec.norm),
        })
    }
}

impl ImageNetwork for ResnetGenerator {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let norm = self.norm.as_ref();
        let mut h = normalize(norm, self.stem.forward(&x.reflection_pad2d(3)?)?)?.relu()?;
        for conv in &self.down {
            h = normalize(norm, conv.forward(&h)?)?.relu()?;
        }
        for block in &self.blocks {
            h = block.forward(&h)?;
        }
        for conv in &self.up {
            h = normalize(norm, conv.forward(&h)?)?.relu()?;
        }
        self.head.forward(&h.reflection_pad2d(3)?)?.tanh()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Module for ResnetGenerator {
    fn parameters(&self) -> Vec<Var> {
        let mut params = self.stem.parameters();
        params.extend(self.down.iter().flat_map(Module::parameters));
        params.extend(self.blocks.iter().flat_map(Module::parameters));
        params.extend(self.up.iter().flat_map(Module::parameters));
        params.extend(self.head.parameters());
        params
    }
}
