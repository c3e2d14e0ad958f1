/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 四则运算节点（支持 NumPy 风格广播）及与纯数的运算节点
 *
 * 广播的反向：上游梯度沿被广播的维度求和（sum_to）回父节点形状
 */

use super::super::{TraitNode, pair, parent_pair, parent_single, single};
use crate::errors::{Operator, TensorError};
use crate::nn::var_ops::VarReduceOps;
use crate::nn::{GraphError, Var};
use crate::tensor::{Tensor, broadcast_shape};

fn check_broadcast(operator: Operator, a: &Tensor, b: &Tensor) -> Result<(), GraphError> {
    broadcast_shape(a.shape(), b.shape())
        .map(|_| ())
        .ok_or_else(|| {
            TensorError::OperatorError {
                operator,
                tensor1_shape: a.shape().to_vec(),
                tensor2_shape: b.shape().to_vec(),
            }
            .into()
        })
}

pub(crate) struct Add;

impl TraitNode for Add {
    fn type_name(&self) -> &'static str {
        "Add"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let (a, b) = pair(parents, "Add")?;
        check_broadcast(Operator::Add, a, b)?;
        Ok(a + b)
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let (a, b) = parent_pair(parents)?;
        Ok(vec![
            Some(upstream.sum_to(&a.shape())?),
            Some(upstream.sum_to(&b.shape())?),
        ])
    }
}

pub(crate) struct Subtract;

impl TraitNode for Subtract {
    fn type_name(&self) -> &'static str {
        "Subtract"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let (a, b) = pair(parents, "Subtract")?;
        check_broadcast(Operator::Sub, a, b)?;
        Ok(a - b)
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let (a, b) = parent_pair(parents)?;
        Ok(vec![
            Some(upstream.sum_to(&a.shape())?),
            Some(upstream.scale(-1.0)?.sum_to(&b.shape())?),
        ])
    }
}

pub(crate) struct Multiply;

impl TraitNode for Multiply {
    fn type_name(&self) -> &'static str {
        "Multiply"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let (a, b) = pair(parents, "Multiply")?;
        check_broadcast(Operator::Mul, a, b)?;
        Ok(a * b)
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let (a, b) = parent_pair(parents)?;
        Ok(vec![
            Some(upstream.try_mul(b)?.sum_to(&a.shape())?),
            Some(upstream.try_mul(a)?.sum_to(&b.shape())?),
        ])
    }
}

/// 逐元素除法：a / b
pub(crate) struct Divide;

impl TraitNode for Divide {
    fn type_name(&self) -> &'static str {
        "Divide"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let (a, b) = pair(parents, "Divide")?;
        check_broadcast(Operator::Div, a, b)?;
        Ok(a / b)
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let (a, b) = parent_pair(parents)?;
        // d(a/b)/da = 1/b；d(a/b)/db = -(a/b)/b
        let grad_a = upstream.try_div(b)?.sum_to(&a.shape())?;
        let grad_b = upstream
            .try_mul(output)?
            .try_div(b)?
            .scale(-1.0)?
            .sum_to(&b.shape())?;
        Ok(vec![Some(grad_a), Some(grad_b)])
    }
}

/// 乘以常数：x * factor
pub(crate) struct Scale {
    pub(crate) factor: f32,
}

impl TraitNode for Scale {
    fn type_name(&self) -> &'static str {
        "Scale"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "Scale")? * self.factor)
    }

    fn calc_grads_to_parents(
        &self,
        _parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        Ok(vec![Some(upstream.scale(self.factor)?)])
    }
}

/// 加上常数：x + value
pub(crate) struct AddScalar {
    pub(crate) value: f32,
}

impl TraitNode for AddScalar {
    fn type_name(&self) -> &'static str {
        "AddScalar"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "AddScalar")? + self.value)
    }

    fn calc_grads_to_parents(
        &self,
        _parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        Ok(vec![Some(upstream.clone())])
    }
}

/// 常数次幂：x^exponent
pub(crate) struct PowScalar {
    pub(crate) exponent: f32,
}

impl TraitNode for PowScalar {
    fn type_name(&self) -> &'static str {
        "PowScalar"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "PowScalar")?.powf(self.exponent))
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let x = parent_single(parents)?;
        let local = if self.exponent == 2.0 {
            x.scale(2.0)?
        } else {
            x.powf(self.exponent - 1.0)?.scale(self.exponent)?
        };
        Ok(vec![Some(upstream.try_mul(&local)?)])
    }
}
