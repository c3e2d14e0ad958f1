use crate::errors::{ConfigError, TensorError};
use crate::nn::GraphError;
use thiserror::Error;

/// 模型层面的错误：构建模型时的配置错误，或训练步中的计算错误
#[derive(Error, Debug)]
pub enum CycleGanError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Tensor(#[from] TensorError),
}
