/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 激活函数节点
 */

use super::super::{TraitNode, parent_single, single};
use crate::nn::{GraphError, Var};
use crate::tensor::Tensor;

pub(crate) struct Sigmoid;

impl TraitNode for Sigmoid {
    fn type_name(&self) -> &'static str {
        "Sigmoid"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "Sigmoid")?.sigmoid())
    }

    fn calc_grads_to_parents(
        &self,
        _parents: &[Var],
        output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        // σ'(x) = σ(x) - σ(x)²
        let local = output.try_sub(&output.try_mul(output)?)?;
        Ok(vec![Some(upstream.try_mul(&local)?)])
    }
}

pub(crate) struct Tanh;

impl TraitNode for Tanh {
    fn type_name(&self) -> &'static str {
        "Tanh"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "Tanh")?.tanh())
    }

    fn calc_grads_to_parents(
        &self,
        _parents: &[Var],
        output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        // tanh'(x) = 1 - tanh(x)²
        let local = output.try_mul(output)?.scale(-1.0)?.add_scalar(1.0)?;
        Ok(vec![Some(upstream.try_mul(&local)?)])
    }
}

/// Leaky ReLU：x if x > 0, else negative_slope * x
///
/// 当 negative_slope = 0 时，等价于标准 ReLU
pub(crate) struct LeakyRelu {
    pub(crate) negative_slope: f32,
}

impl TraitNode for LeakyRelu {
    fn type_name(&self) -> &'static str {
        if self.negative_slope == 0.0 {
            "ReLU"
        } else {
            "LeakyReLU"
        }
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let slope = self.negative_slope;
        Ok(single(parents, "LeakyReLU")?.map(|x| if x > 0.0 { x } else { slope * x }))
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let x = parent_single(parents)?;
        let slope = self.negative_slope;
        let derivative = x.value().map(|v| if v > 0.0 { 1.0 } else { slope });
        Ok(vec![Some(upstream.try_mul(&x.constant_like(&derivative))?)])
    }
}
