/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 单个判别器的训练目标
 *
 * loss_D = 真/假打分损失（见`LossVariantPolicy`） [+ 梯度惩罚]
 *
 * 梯度惩罚：对每个样本取 ε ~ U(0, 1)，x̃ = ε·real + (1 − ε)·fake，
 * gp = λ_gp · mean_batch((‖∂D(x̃)/∂x̃‖₂ − 1)²)，范数取每个样本的全部 C·H·W 元素。
 * ∂D(x̃)/∂x̃ 以 create_graph 求得，因此 gp 对判别器参数可导。
 */

use super::{GradientPenalty, LossVariantPolicy};
use crate::networks::ImageNetwork;
use crate::nn::{GraphError, Var, VarMathOps, VarReduceOps, grad};
use crate::tensor::Tensor;

/// 判别器目标的各项（计算图节点）
pub struct DiscriminatorTerms {
    pub loss: Var,
    pub gradient_penalty: Option<Var>,
}

/// 判别器目标反向传播后的标量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscriminatorLoss {
    pub loss: f32,
    pub gradient_penalty: f32,
}

pub struct DiscriminatorObjective<'a> {
    policy: &'a LossVariantPolicy,
}

impl<'a> DiscriminatorObjective<'a> {
    pub const fn new(policy: &'a LossVariantPolicy) -> Self {
        Self { policy }
    }

    /// 构建损失但不反向传播
    ///
    /// `fake`在打分前被截断，判别器损失不会流回生成器
    pub fn evaluate(
        &self,
        net: &dyn ImageNetwork,
        real: &Var,
        fake: &Var,
    ) -> Result<DiscriminatorTerms, GraphError> {
        let fake = fake.detach();
        let real_score = net.forward(real)?;
        let fake_score = net.forward(&fake)?;
        let mut loss = self.policy.discriminator_loss(&real_score, &fake_score)?;

        let gradient_penalty = match self.policy.gradient_penalty {
            Some(gp) => {
                let penalty = gradient_penalty(net, gp, real, &fake)?;
                loss = loss.try_add(&penalty)?;
                Some(penalty)
            }
            None => None,
        };
        Ok(DiscriminatorTerms {
            loss,
            gradient_penalty,
        })
    }

    /// 构建损失并反向传播，梯度累加到判别器参数上
    ///
    /// 调用方负责事先清零梯度、事后调用优化器
    pub fn backward(
        &self,
        net: &dyn ImageNetwork,
        real: &Var,
        fake: &Var,
    ) -> Result<DiscriminatorLoss, GraphError> {
        let terms = self.evaluate(net, real, fake)?;
        let gradient_penalty = match &terms.gradient_penalty {
            Some(gp) => gp.item()?,
            None => 0.0,
        };
        let loss = terms.loss.backward()?;
        Ok(DiscriminatorLoss {
            loss,
            gradient_penalty,
        })
    }
}

fn gradient_penalty(
    net: &dyn ImageNetwork,
    gp: GradientPenalty,
    real: &Var,
    fake: &Var,
) -> Result<Var, GraphError> {
    let shape = real.shape();
    if fake.shape() != shape {
        return Err(GraphError::ShapeMismatch {
            expected: shape,
            got: fake.shape(),
            message: "梯度惩罚要求真、假图像形状一致".to_string(),
        });
    }
    let batch = shape.first().copied().unwrap_or(1);
    let graph = real.graph();

    // 插值点本身是不依赖任何参数的叶子
    let eps = graph.with_rng(|rng| Tensor::uniform_with_rng(0.0, 1.0, &[batch, 1, 1, 1], rng));
    let real_value = real.value();
    let fake_value = fake.value();
    let mixed = &eps * &real_value + (1.0 - &eps) * &fake_value;
    let x_tilde = graph.input_requiring_grad(&mixed);

    let score = net.forward(&x_tilde)?;
    let gradients = grad(&[score], &[x_tilde], None, true, true)?;
    let per_sample_norm = gradients[0]
        .powf(2.0)?
        .sum_to(&[batch, 1, 1, 1])?
        .sqrt()?;
    per_sample_norm
        .add_scalar(-1.0)?
        .powf(2.0)?
        .mean()?
        .scale(gp.weight)
}
