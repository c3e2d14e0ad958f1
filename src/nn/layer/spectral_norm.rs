/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 谱归一化（Spectral Normalization）包装的 Conv2d
 *
 * W_sn = W / σ(W)，σ 为把卷积核展平为 [C_out, C_in*kH*kW] 矩阵后的最大奇异值，
 * 用幂迭代估计：u、v 跨前向持久保存，梯度模式下每次前向迭代一次。
 * σ = uᵀ W v 中 u、v 视为常量，梯度经 W 本身流回卷积核参数。
 */

use super::Conv2d;
use crate::nn::{Graph, GraphError, Module, Var, VarReduceOps, VarShapeOps};
use crate::tensor::Tensor;
use std::cell::RefCell;

pub struct SpectralNorm {
    conv: Conv2d,
    /// 左奇异向量估计 [C_out, 1]
    u: RefCell<Tensor>,
    /// 右奇异向量估计 [C_in*kH*kW, 1]
    v: RefCell<Tensor>,
    n_power_iterations: usize,
    eps: f32,
}

fn normalize(t: &Tensor, eps: f32) -> Tensor {
    t / t.l2_norm().max(eps)
}

impl SpectralNorm {
    pub fn new(graph: &Graph, conv: Conv2d) -> Result<Self, GraphError> {
        let eps = 1e-12;
        let w_mat = Self::weight_matrix(conv.kernel())?;
        let rows = w_mat.shape()[0];
        let u = graph.with_rng(|rng| Tensor::normal_with_rng(0.0, 1.0, &[rows, 1], rng));
        let u = normalize(&u, eps);
        let v = normalize(&w_mat.transpose()?.matmul(&u)?, eps);
        Ok(Self {
            conv,
            u: RefCell::new(u),
            v: RefCell::new(v),
            n_power_iterations: 1,
            eps,
        })
    }

    fn matrix_shape(kernel: &Var) -> [usize; 2] {
        let shape = kernel.shape();
        let rows = shape.first().copied().unwrap_or(1);
        [rows, shape.iter().skip(1).product()]
    }

    fn weight_matrix(kernel: &Var) -> Result<Tensor, GraphError> {
        Ok(kernel.value().reshape(&Self::matrix_shape(kernel))?)
    }

    fn power_iteration(&self) -> Result<(), GraphError> {
        let w_mat = Self::weight_matrix(self.conv.kernel())?;
        let w_t = w_mat.transpose()?;
        let mut u = self.u.borrow_mut();
        let mut v = self.v.borrow_mut();
        for _ in 0..self.n_power_iterations {
            *v = normalize(&w_t.matmul(&u)?, self.eps);
            *u = normalize(&w_mat.matmul(&v)?, self.eps);
        }
        Ok(())
    }

    /// 当前的最大奇异值估计 σ（[1, 1] 节点）
    pub fn sigma(&self) -> Result<Var, GraphError> {
        let kernel = self.conv.kernel();
        let outer = self.u.borrow().matmul(&self.v.borrow().transpose()?)?;
        kernel
            .reshape(&Self::matrix_shape(kernel))?
            .try_mul(&kernel.constant_like(&outer))?
            .sum()
    }

    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let kernel = self.conv.kernel();
        if kernel.graph().is_grad_enabled() {
            self.power_iteration()?;
        }
        let normalized = kernel.try_div(&self.sigma()?)?;
        self.conv.forward_with_kernel(x, &normalized)
    }
}

impl Module for SpectralNorm {
    fn parameters(&self) -> Vec<Var> {
        self.conv.parameters()
    }
}
