use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use ndarray::Ix2;

impl From<f32> for Tensor {
    /// 实现 From<f32> trait 用于将`f32`类型转换为形状为`[1, 1]`的张量
    fn from(scalar: f32) -> Self {
        Self::full(scalar, &[1, 1])
    }
}

impl Tensor {
    /// 对张量中的所有元素求和并返回一个形状为[1, 1]的标量。
    pub fn sum(&self) -> Self {
        Self::from(self.data.sum())
    }

    /// 所有元素的均值，返回形状为[1, 1]的标量；空张量的均值为0。
    pub fn mean(&self) -> Self {
        Self::from(self.data.mean().unwrap_or(0.0))
    }

    /// 逐元素映射
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Self {
        Self::from_array(self.data.mapv(f))
    }

    pub fn abs(&self) -> Self {
        self.map(f32::abs)
    }

    /// 符号函数，0 处取 0
    pub fn sign(&self) -> Self {
        self.map(|x| {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        })
    }

    pub fn sqrt(&self) -> Self {
        self.map(f32::sqrt)
    }

    pub fn powf(&self, exponent: f32) -> Self {
        self.map(|x| x.powf(exponent))
    }

    pub fn exp(&self) -> Self {
        self.map(f32::exp)
    }

    pub fn ln(&self) -> Self {
        self.map(f32::ln)
    }

    pub fn clamp(&self, min: f32, max: f32) -> Self {
        self.map(|x| x.clamp(min, max))
    }

    /// 倒数，但 0 处取 0（用于 sqrt 在 0 点的次梯度）
    pub fn safe_reciprocal(&self) -> Self {
        self.map(|x| if x == 0.0 { 0.0 } else { 1.0 / x })
    }

    pub fn sigmoid(&self) -> Self {
        self.map(|x| 1.0 / (1.0 + (-x).exp()))
    }

    pub fn tanh(&self) -> Self {
        self.map(f32::tanh)
    }

    /// 二维矩阵乘法：[m, k] x [k, n] -> [m, n]
    pub fn matmul(&self, other: &Self) -> Result<Self, TensorError> {
        let err = || TensorError::OperatorError {
            operator: Operator::MatMul,
            tensor1_shape: self.shape().to_vec(),
            tensor2_shape: other.shape().to_vec(),
        };
        let a = self
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| err())?;
        let b = other
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| err())?;
        if a.ncols() != b.nrows() {
            return Err(err());
        }
        Ok(Self::from_array(a.dot(&b).into_dyn()))
    }

    /// 向量（任意形状，按元素展平）的 L2 范数
    pub fn l2_norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }
}
