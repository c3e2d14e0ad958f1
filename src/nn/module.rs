/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : Module trait 定义
 */

use super::{GraphError, Var};

/// 模块 trait
///
/// # 设计原则
/// - `forward()` **不是** trait 方法（签名各异）
/// - `new()` **不是** trait 方法（参数各异）
/// - `parameters()` 返回 `Vec<Var>`（签名一致，放入 trait）
///
/// # 使用示例
///
/// ```ignore
/// struct Block {
///     conv: Conv2d,
///     norm: InstanceNorm2d,
/// }
///
/// impl Module for Block {
///     fn parameters(&self) -> Vec<Var> {
///         self.conv.parameters()
///     }
/// }
/// ```
pub trait Module {
    /// 获取所有可训练参数
    fn parameters(&self) -> Vec<Var>;

    /// 参数元素总数
    fn num_params(&self) -> usize {
        self.parameters()
            .iter()
            .map(|p| p.shape().iter().product::<usize>())
            .sum()
    }

    /// 设置所有参数是否需要梯度
    fn set_requires_grad(&self, requires_grad: bool) -> Result<(), GraphError> {
        for param in self.parameters() {
            param.set_requires_grad(requires_grad)?;
        }
        Ok(())
    }

    /// 清零所有参数的梯度
    fn zero_grad(&self) {
        for param in self.parameters() {
            param.clear_grad();
        }
    }
}
