/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : Var 损失函数扩展 trait
 *
 * 所有损失均对全部元素取平均（reduction = mean），结果为 [1, 1] 标量节点。
 */

use super::{VarMathOps, VarReduceOps};
use crate::nn::{GraphError, Var};

/// BCE 中概率的截断下界，避免 ln(0)
const BCE_EPS: f32 = 1e-7;

/// 损失函数扩展 trait
///
/// # 使用示例
/// ```ignore
/// use only_cyclegan::nn::VarLossOps;
///
/// let loss_cycle = rec_a.l1_loss(&real_a)?;
/// let loss_gan = pred_fake.mse_loss(&ones)?;
/// ```
pub trait VarLossOps {
    /// MSE Loss（均方误差）
    fn mse_loss(&self, target: &Var) -> Result<Var, GraphError>;

    /// L1 Loss（平均绝对误差）
    fn l1_loss(&self, target: &Var) -> Result<Var, GraphError>;

    /// 二元交叉熵，`self`为概率（通常来自 sigmoid）
    fn bce_loss(&self, target: &Var) -> Result<Var, GraphError>;
}

fn check_target(input: &Var, target: &Var, loss: &str) -> Result<(), GraphError> {
    input.check_same_graph(target)?;
    if input.shape() != target.shape() {
        return Err(GraphError::ShapeMismatch {
            expected: input.shape(),
            got: target.shape(),
            message: format!("{loss}的目标形状须与输入一致"),
        });
    }
    Ok(())
}

impl VarLossOps for Var {
    fn mse_loss(&self, target: &Var) -> Result<Var, GraphError> {
        check_target(self, target, "MSE Loss")?;
        self.try_sub(target)?.powf(2.0)?.mean()
    }

    fn l1_loss(&self, target: &Var) -> Result<Var, GraphError> {
        check_target(self, target, "L1 Loss")?;
        self.try_sub(target)?.abs()?.mean()
    }

    fn bce_loss(&self, target: &Var) -> Result<Var, GraphError> {
        check_target(self, target, "BCE Loss")?;
        let p = self.clamp(BCE_EPS, 1.0 - BCE_EPS)?;
        let log_p = p.ln()?;
        let log_not_p = p.scale(-1.0)?.add_scalar(1.0)?.ln()?;
        let not_target = target.scale(-1.0)?.add_scalar(1.0)?;
        let likelihood = target.try_mul(&log_p)?.try_add(&not_target.try_mul(&log_not_p)?)?;
        likelihood.mean()?.scale(-1.0)
    }
}
