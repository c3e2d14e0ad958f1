/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 逐元素数学函数节点
 *
 * 分段函数（abs、clamp）的局部导数只与前向时的取值区间有关，
 * 以常量掩码参与反向，其二阶导数为0。
 */

use super::super::{TraitNode, parent_single, single};
use crate::nn::var_ops::VarMathOps;
use crate::nn::{GraphError, Var};
use crate::tensor::Tensor;

pub(crate) struct Abs;

impl TraitNode for Abs {
    fn type_name(&self) -> &'static str {
        "Abs"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "Abs")?.abs())
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let x = parent_single(parents)?;
        let sign = x.constant_like(&x.value().sign());
        Ok(vec![Some(upstream.try_mul(&sign)?)])
    }
}

/// 平方根；0 处的导数取0（而非无穷），与 L2 范数在原点的次梯度一致
pub(crate) struct Sqrt;

impl TraitNode for Sqrt {
    fn type_name(&self) -> &'static str {
        "Sqrt"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "Sqrt")?.sqrt())
    }

    fn calc_grads_to_parents(
        &self,
        _parents: &[Var],
        output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        // d(√x)/dx = 1 / (2√x)
        let local = output.safe_reciprocal()?.scale(0.5)?;
        Ok(vec![Some(upstream.try_mul(&local)?)])
    }
}

/// 倒数 1/x，0 处取0
pub(crate) struct SafeReciprocal;

impl TraitNode for SafeReciprocal {
    fn type_name(&self) -> &'static str {
        "SafeReciprocal"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "SafeReciprocal")?.safe_reciprocal())
    }

    fn calc_grads_to_parents(
        &self,
        _parents: &[Var],
        output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        // d(1/x)/dx = -1/x²
        let local = output.try_mul(output)?.scale(-1.0)?;
        Ok(vec![Some(upstream.try_mul(&local)?)])
    }
}

pub(crate) struct Exp;

impl TraitNode for Exp {
    fn type_name(&self) -> &'static str {
        "Exp"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "Exp")?.exp())
    }

    fn calc_grads_to_parents(
        &self,
        _parents: &[Var],
        output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        Ok(vec![Some(upstream.try_mul(output)?)])
    }
}

/// 自然对数
pub(crate) struct Ln;

impl TraitNode for Ln {
    fn type_name(&self) -> &'static str {
        "Ln"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "Ln")?.ln())
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let x = parent_single(parents)?;
        Ok(vec![Some(upstream.try_div(x)?)])
    }
}

/// 截断到 [min, max]，区间外导数为0
pub(crate) struct Clamp {
    pub(crate) min: f32,
    pub(crate) max: f32,
}

impl TraitNode for Clamp {
    fn type_name(&self) -> &'static str {
        "Clamp"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Ok(single(parents, "Clamp")?.clamp(self.min, self.max))
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let x = parent_single(parents)?;
        let (min, max) = (self.min, self.max);
        let mask = x
            .value()
            .map(|v| if v >= min && v <= max { 1.0 } else { 0.0 });
        Ok(vec![Some(upstream.try_mul(&x.constant_like(&mask))?)])
    }
}
