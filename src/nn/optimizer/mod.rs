/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 优化器模块，实现 PyTorch 风格的梯度优化算法
 */

mod adam;

pub use adam::Adam;

use crate::nn::GraphError;

/// Optimizer trait（PyTorch 风格）
///
/// # 设计要点
/// - Optimizer 绑定特定参数（通过 Var）
/// - `backward()` 计算所有需要梯度的参数的梯度（由 Var 调用）
/// - `step()` 只更新 Optimizer 绑定的参数
///
/// # 使用示例
/// ```ignore
/// optimizer.zero_grad();
/// loss.backward()?;
/// optimizer.step()?;
/// ```
pub trait Optimizer {
    /// 清零所有绑定参数的梯度
    fn zero_grad(&mut self);

    /// 更新参数（只更新 Optimizer 绑定、且有梯度的参数）
    fn step(&mut self) -> Result<(), GraphError>;

    /// 获取学习率
    fn learning_rate(&self) -> f32;

    /// 设置学习率
    fn set_learning_rate(&mut self, lr: f32);

    /// 重置累积状态（如 Adam 的动量）
    fn reset(&mut self);
}
