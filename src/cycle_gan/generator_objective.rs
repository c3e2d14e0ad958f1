/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 生成器的训练目标
 *
 * loss_G = G_A + G_B                                   对抗项
 *        + λ_A·L1(rec_A, real_A) + λ_B·L1(rec_B, real_B)   循环一致
 *        + λ_B·λ_idt·L1(idt_A, real_B) + λ_A·λ_idt·L1(idt_B, real_A)   恒等（λ_idt > 0 时）
 *        + 1.3 · (1/(r_AB + 1e-5) + 1/(r_BA + 1e-5))       mode seeking
 *
 * r_AB = mean(|fake_B − z₁|) / mean(|z₂ − z₁|)，z₁、z₂ 为与翻译图像同形状的标准正态噪声，
 * r_BA 同理。该项与 λ 配置无关。
 */

use super::{DerivedImages, LossVariantPolicy};
use crate::networks::ImageNetwork;
use crate::nn::{GraphError, Var, VarLossOps, VarMathOps, VarReduceOps};

/// mode seeking 项的固定权重
pub const MODE_SEEKING_WEIGHT: f32 = 1.3;
/// mode seeking 比值的分母保护
pub const MODE_SEEKING_EPS: f32 = 1e-5;

/// 生成器目标的各项（计算图节点）
pub struct GeneratorTerms {
    pub g_a: Var,
    pub g_b: Var,
    pub cycle_a: Var,
    pub cycle_b: Var,
    pub idt_a: Option<Var>,
    pub idt_b: Option<Var>,
    pub mode_seeking: Var,
    pub total: Var,
}

/// 生成器目标反向传播后的标量；未启用的恒等项为0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorLoss {
    pub g_a: f32,
    pub g_b: f32,
    pub cycle_a: f32,
    pub cycle_b: f32,
    pub idt_a: f32,
    pub idt_b: f32,
    pub mode_seeking: f32,
    pub total: f32,
}

/// 噪声对 (z₁, z₂)
struct NoisePair {
    z1: Var,
    z2: Var,
}

impl NoisePair {
    fn like(image: &Var) -> Self {
        let graph = image.graph();
        let shape = image.shape();
        Self {
            z1: graph.randn(&shape),
            z2: graph.randn(&shape),
        }
    }

    /// 1 / (mean(|fake − z₁|) / mean(|z₂ − z₁|) + ε)
    fn inverse_ratio(&self, fake: &Var) -> Result<Var, GraphError> {
        let distance = fake.try_sub(&self.z1)?.abs()?.mean()?;
        let noise_distance = self.z2.try_sub(&self.z1)?.abs()?.mean()?;
        distance
            .try_div(&noise_distance)?
            .add_scalar(MODE_SEEKING_EPS)?
            .safe_reciprocal()
    }
}

pub struct GeneratorObjective<'a> {
    policy: &'a LossVariantPolicy,
}

impl<'a> GeneratorObjective<'a> {
    pub const fn new(policy: &'a LossVariantPolicy) -> Self {
        Self { policy }
    }

    /// 构建全部损失项但不反向传播
    ///
    /// `d_a`、`d_b`只用于打分，调用方应事先冻结它们
    pub fn evaluate(
        &self,
        d_a: &dyn ImageNetwork,
        d_b: &dyn ImageNetwork,
        real_a: &Var,
        real_b: &Var,
        images: &DerivedImages,
    ) -> Result<GeneratorTerms, GraphError> {
        let weights = self.policy.weights;

        let g_a = self
            .policy
            .generator_adversarial_loss(&d_a.forward(&images.fake_b)?)?;
        let g_b = self
            .policy
            .generator_adversarial_loss(&d_b.forward(&images.fake_a)?)?;

        let cycle_a = images.rec_a.l1_loss(real_a)?.scale(weights.lambda_a)?;
        let cycle_b = images.rec_b.l1_loss(real_b)?.scale(weights.lambda_b)?;

        let (idt_a, idt_b) = match (&images.idt_a, &images.idt_b) {
            (Some(idt_a), Some(idt_b)) if weights.uses_identity() => (
                Some(
                    idt_a
                        .l1_loss(real_b)?
                        .scale(weights.lambda_b * weights.lambda_identity)?,
                ),
                Some(
                    idt_b
                        .l1_loss(real_a)?
                        .scale(weights.lambda_a * weights.lambda_identity)?,
                ),
            ),
            _ => (None, None),
        };

        let mode_seeking = mode_seeking_loss(&images.fake_b, &images.fake_a)?;

        let mut total = g_a.try_add(&g_b)?.try_add(&cycle_a)?.try_add(&cycle_b)?;
        for idt in idt_a.iter().chain(&idt_b) {
            total = total.try_add(idt)?;
        }
        let total = total.try_add(&mode_seeking)?;

        Ok(GeneratorTerms {
            g_a,
            g_b,
            cycle_a,
            cycle_b,
            idt_a,
            idt_b,
            mode_seeking,
            total,
        })
    }

    /// 构建损失并对总损失做一次反向传播，梯度累加到两个生成器的参数上
    pub fn backward(
        &self,
        d_a: &dyn ImageNetwork,
        d_b: &dyn ImageNetwork,
        real_a: &Var,
        real_b: &Var,
        images: &DerivedImages,
    ) -> Result<GeneratorLoss, GraphError> {
        let terms = self.evaluate(d_a, d_b, real_a, real_b, images)?;
        let optional = |term: &Option<Var>| term.as_ref().map_or(Ok(0.0), Var::item);
        let loss = GeneratorLoss {
            g_a: terms.g_a.item()?,
            g_b: terms.g_b.item()?,
            cycle_a: terms.cycle_a.item()?,
            cycle_b: terms.cycle_b.item()?,
            idt_a: optional(&terms.idt_a)?,
            idt_b: optional(&terms.idt_b)?,
            mode_seeking: terms.mode_seeking.item()?,
            total: terms.total.backward()?,
        };
        Ok(loss)
    }
}

/// 两个方向的 mode seeking 项之和乘以固定权重
///
/// 两个方向共用同一对噪声；两域通道数不同时各自取噪声
pub fn mode_seeking_loss(fake_b: &Var, fake_a: &Var) -> Result<Var, GraphError> {
    let noise_b = NoisePair::like(fake_b);
    let ab = noise_b.inverse_ratio(fake_b)?;
    let ba = if fake_a.shape() == fake_b.shape() {
        noise_b.inverse_ratio(fake_a)?
    } else {
        NoisePair::like(fake_a).inverse_ratio(fake_a)?
    };
    ab.try_add(&ba)?.scale(MODE_SEEKING_WEIGHT)
}
