/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 张量（Tensor）：基于 ndarray 的 f32 稠密多维数组
 *                 图像张量统一采用 batch-first 的 NCHW 布局
 */

use ndarray::{Array, ArrayD, IxDyn};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;

use crate::errors::TensorError;

mod ops {
    pub mod arith;
    pub mod conv;
    pub mod others;
    pub mod pad;
}

mod property;
mod shape;

pub use shape::broadcast_shape;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：只要通Tensor初始化的都是张量（即使标量也是张量）；
/// 本库中由归约运算得到的标量统一为形状`[1, 1]`。
#[derive(Debug, Clone)]
pub struct Tensor {
    data: ArrayD<f32>,
}

impl Tensor {
    /// 创建一个张量，`data`的长度必须和`shape`中所有元素的乘积相等，否则panic。
    /// 需要可恢复错误时请使用`try_new`。
    pub fn new(data: &[f32], shape: &[usize]) -> Self {
        match Self::try_new(data, shape) {
            Ok(tensor) => tensor,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_new(data: &[f32], shape: &[usize]) -> Result<Self, TensorError> {
        Self::from_vec(data.to_vec(), shape)
    }

    pub(crate) fn from_vec(data: Vec<f32>, shape: &[usize]) -> Result<Self, TensorError> {
        let len = data.len();
        Array::from_shape_vec(IxDyn(shape), data)
            .map(|data| Self { data })
            .map_err(|_| TensorError::DataLengthMismatch {
                len,
                shape: shape.to_vec(),
            })
    }

    /// 统一转为标准（行优先）布局，`data_as_slice`依赖这一点
    pub(crate) fn from_array(data: ArrayD<f32>) -> Self {
        if data.is_standard_layout() {
            Self { data }
        } else {
            Self {
                data: data.as_standard_layout().into_owned(),
            }
        }
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(0.0, shape)
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self::full(1.0, shape)
    }

    pub fn full(value: f32, shape: &[usize]) -> Self {
        Self {
            data: ArrayD::from_elem(IxDyn(shape), value),
        }
    }

    pub fn zeros_like(other: &Self) -> Self {
        Self::zeros(other.shape())
    }

    pub fn ones_like(other: &Self) -> Self {
        Self::ones(other.shape())
    }

    /// 创建一个服从均匀分布的随机张量，其值在[min, max]的闭区间
    pub fn uniform_with_rng(min: f32, max: f32, shape: &[usize], rng: &mut StdRng) -> Self {
        let dist = Uniform::new_inclusive(min, max);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| dist.sample(rng))
            .collect();
        Self {
            data: Array::from_shape_vec(IxDyn(shape), data)
                .unwrap_or_else(|_| ArrayD::zeros(IxDyn(shape))),
        }
    }

    /// 创建一个服从正态分布的随机张量（Box-Muller 变换）
    pub fn normal_with_rng(mean: f32, std_dev: f32, shape: &[usize], rng: &mut StdRng) -> Self {
        let unit = Uniform::new(0.0f32, 1.0);
        let data_len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(data_len);

        while data.len() < data_len {
            // u1 取 (0, 1]，避免 ln(0)
            let u1 = 1.0 - unit.sample(rng);
            let u2 = unit.sample(rng);
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f32::consts::PI * u2;
            let z0 = mean + std_dev * r * theta.cos();
            let z1 = mean + std_dev * r * theta.sin();

            if z0.is_finite() {
                data.push(z0);
            }
            if data.len() < data_len && z1.is_finite() {
                data.push(z1);
            }
        }

        Self {
            data: Array::from_shape_vec(IxDyn(shape), data)
                .unwrap_or_else(|_| ArrayD::zeros(IxDyn(shape))),
        }
    }
}
