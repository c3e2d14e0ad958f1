/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 对抗损失变体的选择
 *
 * 在构建模型时由配置一次性解析出来，之后注入到判别器/生成器目标中，
 * 训练步里不再对布尔开关做分支。
 *
 * | 变体         | 判别器输出 | D 损失                                   | G 对抗项            |
 * |--------------|------------|------------------------------------------|---------------------|
 * | LeastSquares | 原始分数   | 0.5·MSE(D(real), 1) + 0.5·MSE(D(fake), 0) | MSE(D(fake), 1)     |
 * | Vanilla      | sigmoid    | 0.5·BCE(D(real), 1) + 0.5·BCE(D(fake), 0) | BCE(D(fake), 1)     |
 * | Wasserstein  | 原始分数   | mean(D(fake)) − mean(D(real))            | −mean(D(fake))      |
 *
 * 梯度惩罚只能配合 Wasserstein，谱归一化只能配合前两种。
 */

use super::CycleGanOptions;
use crate::errors::ConfigError;
use crate::networks::NormKind;
use crate::nn::{BceLoss, Criterion, GraphError, MseLoss, Var, VarReduceOps};
use crate::tensor::Tensor;

/// 对抗损失的形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdversarialLossKind {
    LeastSquares,
    Vanilla,
    Wasserstein,
}

/// 附加在判别器损失上的梯度惩罚：weight · (‖∇D(x̃)‖₂ − 1)²
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientPenalty {
    pub weight: f32,
}

/// 生成器损失中各项的权重
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossWeights {
    pub lambda_a: f32,
    pub lambda_b: f32,
    pub lambda_identity: f32,
}

impl LossWeights {
    pub fn uses_identity(&self) -> bool {
        self.lambda_identity > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossVariantPolicy {
    pub adversarial: AdversarialLossKind,
    pub gradient_penalty: Option<GradientPenalty>,
    /// 判别器的卷积是否做谱归一化
    pub spectral_norm: bool,
    pub weights: LossWeights,
}

fn check_weight(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} 须为非负有限数，实际为{value}")))
    }
}

impl LossVariantPolicy {
    /// 从配置解析损失变体，互相冲突的开关直接报错
    pub fn resolve(options: &CycleGanOptions) -> Result<Self, ConfigError> {
        check_weight("lambda_A", options.lambda_a)?;
        check_weight("lambda_B", options.lambda_b)?;
        check_weight("lambda_identity", options.lambda_identity)?;

        if options.wgan && options.no_lsgan {
            return Err(ConfigError::Conflict(
                "wgan 与 no_lsgan（vanilla GAN）不能同时开启".to_string(),
            ));
        }
        if options.with_gp && !options.wgan {
            return Err(ConfigError::Conflict("with_gp 只能配合 wgan 使用".to_string()));
        }
        if options.sn_gan && (options.wgan || options.with_gp) {
            return Err(ConfigError::Conflict(
                "sn_gan 只能配合 LSGAN/vanilla GAN，不能与 wgan 或 with_gp 同时开启".to_string(),
            ));
        }

        let adversarial = if options.wgan {
            AdversarialLossKind::Wasserstein
        } else if options.no_lsgan {
            AdversarialLossKind::Vanilla
        } else {
            AdversarialLossKind::LeastSquares
        };
        let gradient_penalty = if options.with_gp {
            if !(options.lambda_gp.is_finite() && options.lambda_gp > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "lambda_gp 须为正数，实际为{}",
                    options.lambda_gp
                )));
            }
            Some(GradientPenalty {
                weight: options.lambda_gp,
            })
        } else {
            None
        };

        Ok(Self {
            adversarial,
            gradient_penalty,
            spectral_norm: options.sn_gan,
            weights: LossWeights {
                lambda_a: options.lambda_a,
                lambda_b: options.lambda_b,
                lambda_identity: options.lambda_identity,
            },
        })
    }

    /// 判别器应采用的归一化方式
    pub fn discriminator_norm(&self, norm: NormKind) -> NormKind {
        if self.spectral_norm {
            NormKind::Spectral
        } else {
            norm
        }
    }

    /// 判别器是否以 sigmoid 输出概率
    pub fn use_sigmoid(&self) -> bool {
        self.adversarial == AdversarialLossKind::Vanilla
    }

    /// GAN 准则：分数与全1（真）或全0（假）目标之间的 MSE 或 BCE
    fn gan_criterion(&self, score: &Var, target_is_real: bool) -> Result<Var, GraphError> {
        let target = score.constant_like(&Tensor::full(
            if target_is_real { 1.0 } else { 0.0 },
            &score.shape(),
        ));
        let criterion: &dyn Criterion = match self.adversarial {
            AdversarialLossKind::Vanilla => &BceLoss,
            AdversarialLossKind::LeastSquares | AdversarialLossKind::Wasserstein => &MseLoss,
        };
        criterion.forward(score, &target)
    }

    /// 判别器的真/假打分损失（不含梯度惩罚）
    pub fn discriminator_loss(&self, real_score: &Var, fake_score: &Var) -> Result<Var, GraphError> {
        match self.adversarial {
            AdversarialLossKind::Wasserstein => fake_score.mean()?.try_sub(&real_score.mean()?),
            AdversarialLossKind::LeastSquares | AdversarialLossKind::Vanilla => {
                let real = self.gan_criterion(real_score, true)?.scale(0.5)?;
                let fake = self.gan_criterion(fake_score, false)?.scale(0.5)?;
                real.try_add(&fake)
            }
        }
    }

    /// 生成器的对抗项：希望判别器把假图像判为真
    pub fn generator_adversarial_loss(&self, fake_score: &Var) -> Result<Var, GraphError> {
        match self.adversarial {
            AdversarialLossKind::Wasserstein => fake_score.mean()?.scale(-1.0),
            AdversarialLossKind::LeastSquares | AdversarialLossKind::Vanilla => {
                self.gan_criterion(fake_score, true)
            }
        }
    }
}
