use crate::nn::nodes::{ReflectionPad2d, ReflectionPad2dBackward, Reshape};
use crate::nn::{GraphError, Var};

/// 形状变换扩展 trait
pub trait VarShapeOps {
    fn reshape(&self, shape: &[usize]) -> Result<Var, GraphError>;

    /// 对 [N, C, H, W] 的 H、W 做反射填充
    fn reflection_pad2d(&self, pad: usize) -> Result<Var, GraphError>;

    /// `reflection_pad2d`的伴随：把填充区梯度累加回来源像素
    fn reflection_pad2d_backward(&self, pad: usize) -> Result<Var, GraphError>;
}

impl VarShapeOps for Var {
    fn reshape(&self, shape: &[usize]) -> Result<Var, GraphError> {
        if self.shape() == shape {
            return Ok(self.clone());
        }
        Self::from_op(
            Reshape {
                target: shape.to_vec(),
            },
            &[self],
        )
    }

    fn reflection_pad2d(&self, pad: usize) -> Result<Var, GraphError> {
        if pad == 0 {
            return Ok(self.clone());
        }
        Self::from_op(ReflectionPad2d { pad }, &[self])
    }

    fn reflection_pad2d_backward(&self, pad: usize) -> Result<Var, GraphError> {
        if pad == 0 {
            return Ok(self.clone());
        }
        Self::from_op(ReflectionPad2dBackward { pad }, &[self])
    }
}
