/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 网络工厂：按配置构建 CycleGAN 的生成器与判别器
 *
 * 训练核心只依赖`ImageNetwork`：能把图像映射为图像（生成器）或打分图（判别器），
 * 并通过`Module`暴露参数。网络内部结构对核心不可见。
 */

mod discriminator;
mod generator;

pub use discriminator::{NLayerDiscriminator, PixelDiscriminator};
pub use generator::ResnetGenerator;

use crate::errors::ConfigError;
use crate::nn::{Graph, GraphError, Init, Module, Var};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(test)]
mod tests;

/// 图像网络：`network(image) -> image_or_score`
pub trait ImageNetwork: Module {
    fn forward(&self, x: &Var) -> Result<Var, GraphError>;

    /// 网络名称（如`G_A`、`D_B`），用于日志
    fn name(&self) -> &str;
}

/// 归一化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormKind {
    #[default]
    Instance,
    None,
    /// 谱归一化：只用于判别器，替代 instance norm 包装每个卷积
    Spectral,
}

impl FromStr for NormKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instance" => Ok(Self::Instance),
            "none" => Ok(Self::None),
            "spectral" => Ok(Self::Spectral),
            "batch" => Err(ConfigError::Unsupported("batch norm".to_string())),
            other => Err(ConfigError::Invalid(format!("未知的归一化方式`{other}`"))),
        }
    }
}

/// 参数初始化方式，配合`init_gain`使用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitKind {
    /// N(0, gain)
    #[default]
    Normal,
    /// Xavier 正态，乘以 gain
    Xavier,
    /// Kaiming 正态（fan_in），忽略 gain
    Kaiming,
}

impl InitKind {
    /// 卷积核的初始化；偏置一律为0
    pub fn to_init(self, gain: f32) -> Init {
        match self {
            Self::Normal => Init::Normal {
                mean: 0.0,
                std: gain,
            },
            Self::Xavier => Init::Xavier { gain },
            Self::Kaiming => Init::Kaiming,
        }
    }
}

impl FromStr for InitKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "xavier" => Ok(Self::Xavier),
            "kaiming" => Ok(Self::Kaiming),
            "orthogonal" => Err(ConfigError::Unsupported("orthogonal 初始化".to_string())),
            other => Err(ConfigError::Invalid(format!("未知的初始化方式`{other}`"))),
        }
    }
}

/// 生成器结构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorArch {
    /// 下采样 -> `blocks`个残差块 -> 上采样
    Resnet { blocks: usize },
}

impl FromStr for GeneratorArch {
    type Err = ConfigError;

    /// 解析`resnet_<n>blocks`，如`resnet_9blocks`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(blocks) = s
            .strip_prefix("resnet_")
            .and_then(|rest| rest.strip_suffix("blocks"))
        {
            return blocks
                .parse()
                .map(|blocks| Self::Resnet { blocks })
                .map_err(|_| ConfigError::Invalid(format!("残差块数量`{blocks}`无效")));
        }
        if s.starts_with("unet_") {
            return Err(ConfigError::Unsupported(format!("生成器结构`{s}`")));
        }
        Err(ConfigError::Invalid(format!("未知的生成器结构`{s}`")))
    }
}

impl fmt::Display for GeneratorArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resnet { blocks } => write!(f, "resnet_{blocks}blocks"),
        }
    }
}

/// 判别器结构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscriminatorArch {
    /// 3层 PatchGAN（70x70 感受野）
    Basic,
    /// n 层 PatchGAN
    NLayers(usize),
    /// 1x1 卷积的逐像素判别器
    Pixel,
}

impl DiscriminatorArch {
    /// 由结构名与`n_layers_D`解析；`n_layers`只在结构名为`n_layers`时生效
    pub fn parse(name: &str, n_layers: usize) -> Result<Self, ConfigError> {
        match name {
            "basic" => Ok(Self::Basic),
            "n_layers" if n_layers == 0 => Err(ConfigError::Invalid(
                "n_layers_D 至少为1".to_string(),
            )),
            "n_layers" => Ok(Self::NLayers(n_layers)),
            "pixel" => Ok(Self::Pixel),
            other => Err(ConfigError::Invalid(format!("未知的判别器结构`{other}`"))),
        }
    }
}

/// 构建生成器所需的全部信息
#[derive(Debug, Clone)]
pub struct GeneratorSpec {
    pub name: String,
    pub input_nc: usize,
    pub output_nc: usize,
    pub ngf: usize,
    pub arch: GeneratorArch,
    pub norm: NormKind,
    pub use_dropout: bool,
    pub init: InitKind,
    pub init_gain: f32,
}

/// 构建判别器所需的全部信息
#[derive(Debug, Clone)]
pub struct DiscriminatorSpec {
    pub name: String,
    pub input_nc: usize,
    pub ndf: usize,
    pub arch: DiscriminatorArch,
    pub norm: NormKind,
    /// 输出经 sigmoid（vanilla GAN 的 BCE 需要概率）
    pub use_sigmoid: bool,
    pub init: InitKind,
    pub init_gain: f32,
}

pub fn define_generator(
    graph: &Graph,
    spec: &GeneratorSpec,
) -> Result<Box<dyn ImageNetwork>, GraphError> {
    if spec.use_dropout {
        return Err(GraphError::InvalidOperation(format!(
            "{}: CycleGAN 生成器不使用 dropout",
            spec.name
        )));
    }
    if spec.norm == NormKind::Spectral {
        return Err(GraphError::InvalidOperation(format!(
            "{}: 谱归一化只用于判别器",
            spec.name
        )));
    }
    match spec.arch {
        GeneratorArch::Resnet { blocks } => {
            Ok(Box::new(ResnetGenerator::new(graph, spec, blocks)?))
        }
    }
}

pub fn define_discriminator(
    graph: &Graph,
    spec: &DiscriminatorSpec,
) -> Result<Box<dyn ImageNetwork>, GraphError> {
    Ok(match spec.arch {
        DiscriminatorArch::Basic => Box::new(NLayerDiscriminator::new(graph, spec, 3)?),
        DiscriminatorArch::NLayers(n) => Box::new(NLayerDiscriminator::new(graph, spec, n)?),
        DiscriminatorArch::Pixel => Box::new(PixelDiscriminator::new(graph, spec)?),
    })
}
