/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 负责神经网络（neural network）的构建：计算图、自动求导、层、损失与优化器
 */

pub mod autograd;
pub mod criterion;
mod graph;
pub mod layer;
mod module;
mod nodes;
pub mod optimizer;
mod var;
mod var_ops;

pub use autograd::grad;
pub use criterion::{BceLoss, Criterion, L1Loss, MseLoss};
pub use graph::{Device, Graph, GraphError};
pub use layer::{Conv2d, ConvTranspose2d, InstanceNorm2d, SpectralNorm};
pub use module::Module;
pub use nodes::NodeId;
pub use optimizer::{Adam, Optimizer};
pub use var::{Init, Var};
pub use var_ops::{VarActivationOps, VarConvOps, VarLossOps, VarMathOps, VarReduceOps, VarShapeOps};

#[cfg(test)]
mod tests;
