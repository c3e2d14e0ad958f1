/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 卷积族节点
 *
 * 设 A_K 为“以 K 为核的卷积”线性算子，则：
 * - Conv2d(x, K)            = A_K x
 * - ConvTranspose2d(y, K)   = A_Kᵀ y
 * - Conv2dWeightGrad(x, g)  = ∂<A_K x, g>/∂K
 * 三者的向量-雅可比积都能用这三个算子本身表达，因此卷积网络可以求任意阶导数
 * （梯度惩罚需要二阶导数）。
 */

use super::super::{TraitNode, pair, parent_pair};
use crate::nn::var_ops::VarConvOps;
use crate::nn::{GraphError, Var};
use crate::tensor::Tensor;

fn spatial(shape: &[usize]) -> Result<(usize, usize), GraphError> {
    match *shape {
        [_, _, h, w] => Ok((h, w)),
        _ => Err(GraphError::ComputationError(format!(
            "卷积节点期望4维张量，实际形状{shape:?}"
        ))),
    }
}

/// 2D 卷积：x [N, C_in, H, W] 与核 [C_out, C_in, kH, kW]，零填充
pub(crate) struct Conv2d {
    pub(crate) stride: (usize, usize),
    pub(crate) padding: (usize, usize),
}

impl TraitNode for Conv2d {
    fn type_name(&self) -> &'static str {
        "Conv2d"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let (x, kernel) = pair(parents, "Conv2d")?;
        Ok(x.conv2d(kernel, self.stride, self.padding)?)
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let (x, kernel) = parent_pair(parents)?;
        let grad_x = upstream.conv_transpose2d(kernel, self.stride, self.padding, spatial(&x.shape())?)?;
        let grad_kernel = x.conv2d_weight_grad(upstream, spatial(&kernel.shape())?, self.stride, self.padding)?;
        Ok(vec![Some(grad_x), Some(grad_kernel)])
    }
}

/// 转置卷积：y [N, C_out, H', W'] 与核 [C_out, C_in, kH, kW] 得 [N, C_in, H, W]
pub(crate) struct ConvTranspose2d {
    pub(crate) stride: (usize, usize),
    pub(crate) padding: (usize, usize),
    pub(crate) output_hw: (usize, usize),
}

impl TraitNode for ConvTranspose2d {
    fn type_name(&self) -> &'static str {
        "ConvTranspose2d"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let (y, kernel) = pair(parents, "ConvTranspose2d")?;
        Ok(y.conv_transpose2d(kernel, self.stride, self.padding, self.output_hw)?)
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let (y, kernel) = parent_pair(parents)?;
        // <A_Kᵀ y, g> = <y, A_K g>
        let grad_y = upstream.conv2d(kernel, self.stride, self.padding)?;
        let grad_kernel = upstream.conv2d_weight_grad(y, spatial(&kernel.shape())?, self.stride, self.padding)?;
        Ok(vec![Some(grad_y), Some(grad_kernel)])
    }
}

/// 卷积核梯度：x [N, C_in, H, W] 与上游梯度 g [N, C_out, H', W'] 得 [C_out, C_in, kH, kW]
pub(crate) struct Conv2dWeightGrad {
    pub(crate) kernel_hw: (usize, usize),
    pub(crate) stride: (usize, usize),
    pub(crate) padding: (usize, usize),
}

impl TraitNode for Conv2dWeightGrad {
    fn type_name(&self) -> &'static str {
        "Conv2dWeightGrad"
    }

    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let (x, grad) = pair(parents, "Conv2dWeightGrad")?;
        Ok(x.conv2d_weight_grad(grad, self.kernel_hw, self.stride, self.padding)?)
    }

    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        _output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError> {
        let (x, grad) = parent_pair(parents)?;
        // 输出对 (x, g) 双线性：<W(x, g), D> = <A_D x, g> = <x, A_Dᵀ g>
        let grad_x = grad.conv_transpose2d(upstream, self.stride, self.padding, spatial(&x.shape())?)?;
        let grad_g = x.conv2d(upstream, self.stride, self.padding)?;
        Ok(vec![Some(grad_x), Some(grad_g)])
    }
}
