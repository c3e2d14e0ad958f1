/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : Graph 模块的错误类型
 */

use crate::errors::TensorError;
use thiserror::Error;

/// Graph 操作错误类型
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error(transparent)]
    Tensor(#[from] TensorError),
    #[error("不能对来自不同 Graph 的 Var 进行运算")]
    GraphMismatch,
    /// 反向传播已释放该节点的父节点引用，再次对其反向传播
    #[error("节点`{0}`所在的计算图已在先前的反向传播中释放，如需再次反向传播请设置 retain_graph")]
    GraphReleased(String),
    #[error("无效操作：{0}")]
    InvalidOperation(String),
    #[error("形状不匹配：期望{expected:?}，实际{got:?}。{message}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },
    #[error("计算错误：{0}")]
    ComputationError(String),
    #[error("不支持的设备：{0}")]
    UnsupportedDevice(String),
}
