/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 损失函数封装（PyTorch 风格 API）
 *
 * ```ignore
 * let criterion = L1Loss;
 * let loss = criterion.forward(&rec_a, &real_a)?;
 * ```
 */

use super::{GraphError, Var, VarLossOps};

/// 损失函数：`forward(input, target)`得到 [1, 1] 标量节点
pub trait Criterion {
    fn forward(&self, input: &Var, target: &Var) -> Result<Var, GraphError>;
}

/// 均方误差损失
#[derive(Debug, Clone, Copy, Default)]
pub struct MseLoss;

impl Criterion for MseLoss {
    fn forward(&self, input: &Var, target: &Var) -> Result<Var, GraphError> {
        input.mse_loss(target)
    }
}

/// 平均绝对误差损失
#[derive(Debug, Clone, Copy, Default)]
pub struct L1Loss;

impl Criterion for L1Loss {
    fn forward(&self, input: &Var, target: &Var) -> Result<Var, GraphError> {
        input.l1_loss(target)
    }
}

/// 二元交叉熵损失（输入为概率）
#[derive(Debug, Clone, Copy, Default)]
pub struct BceLoss;

impl Criterion for BceLoss {
    fn forward(&self, input: &Var, target: &Var) -> Result<Var, GraphError> {
        input.bce_loss(target)
    }
}
