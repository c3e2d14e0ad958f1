use crate::nn::nodes::{BroadcastTo, Mean, Sum, SumTo};
use crate::nn::{GraphError, Var};

/// 归约扩展 trait，标量结果的形状统一为 [1, 1]
pub trait VarReduceOps {
    fn sum(&self) -> Result<Var, GraphError>;

    fn mean(&self) -> Result<Var, GraphError>;

    /// 沿被广播的维度求和到`shape`（形状相同时原样返回）
    ///
    /// 例：[N, C, H, W] → [N, 1, 1, 1] 得到逐样本的和
    fn sum_to(&self, shape: &[usize]) -> Result<Var, GraphError>;

    /// 广播到`shape`（形状相同时原样返回）
    fn broadcast_to(&self, shape: &[usize]) -> Result<Var, GraphError>;
}

impl VarReduceOps for Var {
    fn sum(&self) -> Result<Var, GraphError> {
        Self::from_op(Sum, &[self])
    }

    fn mean(&self) -> Result<Var, GraphError> {
        Self::from_op(Mean, &[self])
    }

    fn sum_to(&self, shape: &[usize]) -> Result<Var, GraphError> {
        if self.shape() == shape {
            return Ok(self.clone());
        }
        Self::from_op(
            SumTo {
                target: shape.to_vec(),
            },
            &[self],
        )
    }

    fn broadcast_to(&self, shape: &[usize]) -> Result<Var, GraphError> {
        if self.shape() == shape {
            return Ok(self.clone());
        }
        Self::from_op(
            BroadcastTo {
                target: shape.to_vec(),
            },
            &[self],
        )
    }
}
