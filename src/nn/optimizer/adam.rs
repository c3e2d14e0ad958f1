/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : Adam 优化器
 *
 * Adam: Adaptive Moment Estimation
 * - m = β1 * m + (1 - β1) * g
 * - v = β2 * v + (1 - β2) * g²
 * - θ = θ - α * m_hat / (√v_hat + ε)
 */

use super::Optimizer;
use crate::nn::{GraphError, NodeId, Var};
use crate::tensor::Tensor;
use std::collections::HashMap;

pub struct Adam {
    /// 要优化的参数
    params: Vec<Var>,
    lr: f32,
    /// β1 (一阶矩衰减)
    beta1: f32,
    /// β2 (二阶矩衰减)
    beta2: f32,
    /// 数值稳定项
    epsilon: f32,
    /// 一阶矩估计
    m: HashMap<NodeId, Tensor>,
    /// 二阶矩估计
    v: HashMap<NodeId, Tensor>,
    /// 时间步
    t: i32,
}

impl Adam {
    /// 创建 Adam 优化器（β1 = 0.9, β2 = 0.999, ε = 1e-8）
    pub fn new(params: &[Var], lr: f32) -> Self {
        Self::with_config(params, lr, 0.9, 0.999, 1e-8)
    }

    /// 创建带完整配置的 Adam 优化器
    ///
    /// GAN 训练中 G 和 D 各用一个优化器：
    /// ```ignore
    /// let optimizer_g = Adam::with_config(&g_params, 2e-4, 0.5, 0.999, 1e-8);
    /// let optimizer_d = Adam::with_config(&d_params, 2e-4, 0.5, 0.999, 1e-8);
    /// ```
    pub fn with_config(params: &[Var], lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            params: params.to_vec(),
            lr,
            beta1,
            beta2,
            epsilon,
            m: HashMap::new(),
            v: HashMap::new(),
            t: 0,
        }
    }

    /// 绑定的参数
    pub fn params(&self) -> &[Var] {
        &self.params
    }
}

impl Optimizer for Adam {
    fn zero_grad(&mut self) {
        for param in &self.params {
            param.clear_grad();
        }
    }

    fn step(&mut self) -> Result<(), GraphError> {
        self.t += 1;
        let bias_correction1 = 1.0 - self.beta1.powi(self.t);
        let bias_correction2 = 1.0 - self.beta2.powi(self.t);

        for param in &self.params {
            let Some(grad) = param.grad() else {
                continue;
            };

            // m = β1 * m + (1 - β1) * g
            let m = self
                .m
                .entry(param.node_id())
                .or_insert_with(|| Tensor::zeros(grad.shape()));
            *m = &*m * self.beta1 + &grad * (1.0 - self.beta1);

            // v = β2 * v + (1 - β2) * g²
            let v = self
                .v
                .entry(param.node_id())
                .or_insert_with(|| Tensor::zeros(grad.shape()));
            *v = &*v * self.beta2 + &grad * &grad * (1.0 - self.beta2);

            let m_hat = &*m / bias_correction1;
            let v_hat = &*v / bias_correction2;
            let update = m_hat / (v_hat.sqrt() + self.epsilon) * self.lr;
            param.set_value(&(param.value() - update))?;
        }
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn reset(&mut self) {
        self.m.clear();
        self.v.clear();
        self.t = 0;
    }
}
