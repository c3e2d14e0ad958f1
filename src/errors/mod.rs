use thiserror::Error;
mod config;
mod ops;
pub use self::config::ConfigError;
pub use self::ops::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    // 张量二元运算
    #[error(
        "形状不一致，故无法{operator}：第一个张量的形状为{tensor1_shape:?}，第二个张量的形状为{tensor2_shape:?}"
    )]
    OperatorError {
        operator: Operator,
        tensor1_shape: Vec<usize>,
        tensor2_shape: Vec<usize>,
    },

    #[error("数据长度{len}与形状{shape:?}不符")]
    DataLengthMismatch { len: usize, shape: Vec<usize> },
    #[error("无法将形状{from:?}变形为{to:?}")]
    ReshapeError { from: Vec<usize>, to: Vec<usize> },
    #[error("无法将形状{from:?}广播到{to:?}")]
    BroadcastError { from: Vec<usize>, to: Vec<usize> },
    #[error("无法将形状{from:?}求和归约到{to:?}")]
    SumToError { from: Vec<usize>, to: Vec<usize> },
    #[error("{op}要求{expected}维张量，但得到{got}维")]
    DimensionMismatch {
        op: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("卷积参数无效：{0}")]
    InvalidConvolution(String),
    #[error("索引越界：{index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("张量列表为空")]
    EmptyList,
}
