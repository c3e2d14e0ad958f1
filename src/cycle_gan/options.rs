/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : CycleGAN 的训练配置，一次训练中不可变
 *
 * 字段名与命令行参数一致（如`lambda_A`、`n_layers_D`），可直接从 JSON 读入；
 * 缺省的字段取默认值。
 */

use crate::errors::ConfigError;
use crate::networks::{DiscriminatorArch, GeneratorArch, InitKind, NormKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 哪个输入键作为 A 域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    AtoB,
    BtoA,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleGanOptions {
    // ---- 网络 ----
    pub input_nc: usize,
    pub output_nc: usize,
    /// 生成器最后一层卷积的通道数
    pub ngf: usize,
    /// 判别器第一层卷积的通道数
    pub ndf: usize,
    #[serde(rename = "netG")]
    pub net_g: String,
    #[serde(rename = "netD")]
    pub net_d: String,
    #[serde(rename = "n_layers_D")]
    pub n_layers_d: usize,
    pub norm: NormKind,
    pub init_type: InitKind,
    pub init_gain: f32,
    /// CycleGAN 不使用 dropout，必须为 true
    pub no_dropout: bool,

    // ---- 损失权重 ----
    /// 循环损失 A -> B -> A 的权重
    #[serde(rename = "lambda_A")]
    pub lambda_a: f32,
    /// 循环损失 B -> A -> B 的权重
    #[serde(rename = "lambda_B")]
    pub lambda_b: f32,
    /// 恒等映射损失相对于循环损失的比例，0 表示不用
    pub lambda_identity: f32,

    // ---- GAN 变体 ----
    /// 使用 vanilla GAN（sigmoid + BCE）而非 LSGAN
    pub no_lsgan: bool,
    pub wgan: bool,
    pub with_gp: bool,
    pub lambda_gp: f32,
    pub sn_gan: bool,

    // ---- 训练 ----
    pub pool_size: usize,
    pub lr: f32,
    pub beta1: f32,
    pub direction: Direction,
    /// 设备列表，空或负数表示 CPU
    pub gpu_ids: Vec<i32>,
    /// 随机种子，None 时取系统熵
    pub seed: Option<u64>,
    #[serde(rename = "isTrain")]
    pub is_train: bool,
}

impl Default for CycleGanOptions {
    fn default() -> Self {
        Self {
            input_nc: 3,
            output_nc: 3,
            ngf: 64,
            ndf: 64,
            net_g: "resnet_9blocks".to_string(),
            net_d: "basic".to_string(),
            n_layers_d: 3,
            norm: NormKind::Instance,
            init_type: InitKind::Normal,
            init_gain: 0.02,
            no_dropout: true,
            lambda_a: 10.0,
            lambda_b: 10.0,
            lambda_identity: 0.0,
            no_lsgan: false,
            wgan: false,
            with_gp: false,
            lambda_gp: 10.0,
            sn_gan: false,
            pool_size: 50,
            lr: 2e-4,
            beta1: 0.5,
            direction: Direction::AtoB,
            gpu_ids: Vec::new(),
            seed: None,
            is_train: true,
        }
    }
}

impl CycleGanOptions {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn generator_arch(&self) -> Result<GeneratorArch, ConfigError> {
        self.net_g.parse()
    }

    pub fn discriminator_arch(&self) -> Result<DiscriminatorArch, ConfigError> {
        DiscriminatorArch::parse(&self.net_d, self.n_layers_d)
    }

    /// 检查与 GAN 变体无关的配置项；GAN 变体由`LossVariantPolicy::resolve`检查
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.no_dropout {
            return Err(ConfigError::Invalid(
                "CycleGAN 不使用 dropout，no_dropout 必须为 true".to_string(),
            ));
        }
        if self.input_nc == 0 || self.output_nc == 0 || self.ngf == 0 || self.ndf == 0 {
            return Err(ConfigError::Invalid(
                "input_nc、output_nc、ngf、ndf 均须大于0".to_string(),
            ));
        }
        if self.norm == NormKind::Spectral {
            return Err(ConfigError::Invalid(
                "norm 不能为 spectral，判别器的谱归一化请用 sn_gan 开启".to_string(),
            ));
        }
        if !(self.init_gain.is_finite() && self.init_gain > 0.0) {
            return Err(ConfigError::Invalid(format!("init_gain 须为正数，实际为{}", self.init_gain)));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(ConfigError::Invalid(format!("学习率须为正数，实际为{}", self.lr)));
        }
        if !(0.0..1.0).contains(&self.beta1) {
            return Err(ConfigError::Invalid(format!("beta1 须在[0, 1)内，实际为{}", self.beta1)));
        }
        self.generator_arch()?;
        self.discriminator_arch()?;
        Ok(())
    }
}
