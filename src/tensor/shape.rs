/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 张量的形状相关运算：变形、广播、求和归约、按 batch 切分/拼接
 */

use super::Tensor;
use crate::errors::{Operator, TensorError};
use ndarray::{Axis, IxDyn};

/// 计算两个形状按 NumPy 规则广播后的形状，不兼容则返回 None
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let mut result = vec![0; ndim];
    for i in 0..ndim {
        // 从尾部对齐
        let da = if i < ndim - a.len() { 1 } else { a[i - (ndim - a.len())] };
        let db = if i < ndim - b.len() { 1 } else { b[i - (ndim - b.len())] };
        result[i] = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => return None,
        };
    }
    Some(result)
}

impl Tensor {
    pub fn reshape(&self, shape: &[usize]) -> Result<Self, TensorError> {
        let err = || TensorError::ReshapeError {
            from: self.shape().to_vec(),
            to: shape.to_vec(),
        };
        if shape.iter().product::<usize>() != self.size() {
            return Err(err());
        }
        self.data
            .clone()
            .into_shape(IxDyn(shape))
            .map(Self::from_array)
            .map_err(|_| err())
    }

    /// 将张量广播到`target`形状（复制数据）
    pub fn broadcast_to(&self, target: &[usize]) -> Result<Self, TensorError> {
        self.data
            .broadcast(IxDyn(target))
            .map(|view| Self::from_array(view.to_owned()))
            .ok_or_else(|| TensorError::BroadcastError {
                from: self.shape().to_vec(),
                to: target.to_vec(),
            })
    }

    /// 广播的逆运算：沿被广播的维度求和，使结果形状为`target`
    ///
    /// 反向传播中，若某个父节点在前向时被广播，其梯度需经此归约回原形状
    pub fn sum_to_shape(&self, target: &[usize]) -> Result<Self, TensorError> {
        let src = self.shape();
        if src == target {
            return Ok(self.clone());
        }
        let err = || TensorError::SumToError {
            from: src.to_vec(),
            to: target.to_vec(),
        };
        if target.len() > src.len() {
            return Err(err());
        }

        let lead = src.len() - target.len();
        let mut data = self.data.clone();
        for _ in 0..lead {
            data = data.sum_axis(Axis(0));
        }
        for (axis, (&t, &s)) in target.iter().zip(&src[lead..]).enumerate() {
            if t == s {
                continue;
            }
            if t != 1 {
                return Err(err());
            }
            data = data.sum_axis(Axis(axis)).insert_axis(Axis(axis));
        }
        Ok(Self::from_array(data))
    }

    /// 取出第`index`个样本，结果保留 batch 维：[1, ...]
    pub fn select_batch(&self, index: usize) -> Result<Self, TensorError> {
        let len = self.shape().first().copied().unwrap_or(0);
        if index >= len {
            return Err(TensorError::IndexOutOfBounds { index, len });
        }
        Ok(Self::from_array(
            self.data
                .index_axis(Axis(0), index)
                .insert_axis(Axis(0))
                .to_owned(),
        ))
    }

    /// 沿 batch 维（第0维）拼接
    pub fn concat_batch(tensors: &[Self]) -> Result<Self, TensorError> {
        let first = tensors.first().ok_or(TensorError::EmptyList)?;
        let views: Vec<_> = tensors.iter().map(|t| t.data.view()).collect();
        ndarray::concatenate(Axis(0), &views)
            .map(Self::from_array)
            .map_err(|_| TensorError::OperatorError {
                operator: Operator::Concat,
                tensor1_shape: first.shape().to_vec(),
                tensor2_shape: tensors
                    .iter()
                    .map(Self::shape)
                    .find(|s| s.get(1..) != first.shape().get(1..))
                    .unwrap_or(first.shape())
                    .to_vec(),
            })
    }

    /// 二维张量的转置
    pub fn transpose(&self) -> Result<Self, TensorError> {
        if self.dimension() != 2 {
            return Err(TensorError::DimensionMismatch {
                op: "transpose",
                expected: 2,
                got: self.dimension(),
            });
        }
        Ok(Self::from_array(self.data.t().to_owned()))
    }
}
