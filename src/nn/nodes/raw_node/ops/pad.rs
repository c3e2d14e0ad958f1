use super::super::{TraitNode, single};
use crate::nn::var_ops::VarShapeOps;
use crate::nn::{GraphError, Var};
use crate::tensor::Tensor;

/// 反射填充节点，用于生成器的边界处理（避免零填充带来的边缘伪影）
pub(crate) struct ReflectionPad2d {
    pub(crate) pad: usize,
}

impl TraitNode for ReflectionPad2d {
    fn type_name(&self) -> &'static str {
        "ReflectionPad2d"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "ReflectionPad2d")?.reflection_pad2d(self.pad)?)
    }

    fn calc_grads_to_parents(
        &self,
        _parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        Ok(vec![Some(upstream.reflection_pad2d_backward(self.pad)?)])
    }
}

/// 反射填充的伴随（即其反向传播），自身的伴随又是反射填充
pub(crate) struct ReflectionPad2dBackward {
    pub(crate) pad: usize,
}

impl TraitNode for ReflectionPad2dBackward {
    fn type_name(&self) -> &'static str {
        "ReflectionPad2dBackward"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "ReflectionPad2dBackward")?.reflection_pad2d_backward(self.pad)?)
    }

    fn calc_grads_to_parents(
        &self,
        _parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        Ok(vec![Some(upstream.reflection_pad2d(self.pad)?)])
    }
}
