/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : InstanceNorm2d（无仿射参数，不跟踪统计量）
 *
 * y = (x - mean_hw(x)) / sqrt(var_hw(x) + eps)，每个样本、每个通道独立归一化。
 * 由图运算组合而成，因此二阶可导。
 */

use crate::nn::{GraphError, Module, Var, VarMathOps, VarReduceOps};

pub struct InstanceNorm2d {
    eps: f32,
}

impl Default for InstanceNorm2d {
    fn default() -> Self {
        Self::new(1e-5)
    }
}

impl InstanceNorm2d {
    pub const fn new(eps: f32) -> Self {
        Self { eps }
    }

    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let shape = x.shape();
        let [n, c, h, w] = shape[..] else {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: shape,
                message: "InstanceNorm2d 的输入须为 [batch, C, H, W]".to_string(),
            });
        };
        let inv_count = 1.0 / (h * w).max(1) as f32;
        let stat_shape = [n, c, 1, 1];
        let mean = x.sum_to(&stat_shape)?.scale(inv_count)?;
        let centered = x.try_sub(&mean)?;
        let var = centered
            .try_mul(&centered)?
            .sum_to(&stat_shape)?
            .scale(inv_count)?;
        let std = var.add_scalar(self.eps)?.sqrt()?;
        centered.try_div(&std)
    }
}

impl Module for InstanceNorm2d {
    fn parameters(&self) -> Vec<Var> {
        Vec::new()
    }
}
