use crate::nn::nodes::{Abs, Clamp, Exp, Ln, SafeReciprocal, Sqrt};
use crate::nn::{GraphError, Var};

/// 逐元素数学函数扩展 trait
pub trait VarMathOps {
    fn abs(&self) -> Result<Var, GraphError>;

    /// 平方根（0 处导数取0）
    fn sqrt(&self) -> Result<Var, GraphError>;

    /// 倒数 1/x（0 处取0）
    fn safe_reciprocal(&self) -> Result<Var, GraphError>;

    fn exp(&self) -> Result<Var, GraphError>;

    /// 自然对数
    fn ln(&self) -> Result<Var, GraphError>;

    fn clamp(&self, min: f32, max: f32) -> Result<Var, GraphError>;
}

impl VarMathOps for Var {
    fn abs(&self) -> Result<Var, GraphError> {
        Self::from_op(Abs, &[self])
    }

    fn sqrt(&self) -> Result<Var, GraphError> {
        Self::from_op(Sqrt, &[self])
    }

    fn safe_reciprocal(&self) -> Result<Var, GraphError> {
        Self::from_op(SafeReciprocal, &[self])
    }

    fn exp(&self) -> Result<Var, GraphError> {
        Self::from_op(Exp, &[self])
    }

    fn ln(&self) -> Result<Var, GraphError> {
        Self::from_op(Ln, &[self])
    }

    fn clamp(&self, min: f32, max: f32) -> Result<Var, GraphError> {
        if min > max {
            return Err(GraphError::InvalidOperation(format!(
                "clamp 的下界{min}大于上界{max}"
            )));
        }
        Self::from_op(Clamp { min, max }, &[self])
    }
}
