/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 归约与形状节点
 *
 * Sum/Mean 的结果统一为形状 [1, 1] 的标量；SumTo 与 BroadcastTo 互为伴随。
 */

use super::super::{TraitNode, parent_single, single};
use crate::nn::var_ops::{VarReduceOps, VarShapeOps};
use crate::nn::{GraphError, Var};
use crate::tensor::Tensor;

pub(crate) struct Sum;

impl TraitNode for Sum {
    fn type_name(&self) -> &'static str {
        "Sum"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "Sum")?.sum())
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let x = parent_single(parents)?;
        Ok(vec![Some(upstream.broadcast_to(&x.shape())?)])
    }
}

pub(crate) struct Mean;

impl TraitNode for Mean {
    fn type_name(&self) -> &'static str {
        "Mean"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "Mean")?.mean())
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let x = parent_single(parents)?;
        let shape = x.shape();
        let count = shape.iter().product::<usize>().max(1);
        Ok(vec![Some(
            upstream.broadcast_to(&shape)?.scale(1.0 / count as f32)?,
        )])
    }
}

/// 沿被广播的维度求和到目标形状
pub(crate) struct SumTo {
    pub(crate) target: Vec<usize>,
}

impl TraitNode for SumTo {
    fn type_name(&self) -> &'static str {
        "SumTo"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "SumTo")?.sum_to_shape(&self.target)?)
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let x = parent_single(parents)?;
        Ok(vec![Some(upstream.broadcast_to(&x.shape())?)])
    }
}

pub(crate) struct BroadcastTo {
    pub(crate) target: Vec<usize>,
}

impl TraitNode for BroadcastTo {
    fn type_name(&self) -> &'static str {
        "BroadcastTo"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "BroadcastTo")?.broadcast_to(&self.target)?)
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let x = parent_single(parents)?;
        Ok(vec![Some(upstream.sum_to(&x.shape())?)])
    }
}

pub(crate) struct Reshape {
    pub(crate) target: Vec<usize>,
}

impl TraitNode for Reshape {
    fn type_name(&self) -> &'static str {
        "Reshape"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "Reshape")?.reshape(&self.target)?)
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let x = parent_single(parents)?;
        Ok(vec![Some(upstream.reshape(&x.shape())?)])
    }
}
