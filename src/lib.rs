//! # Only CycleGAN
//!
//! 用纯 rust 实现的 CycleGAN 训练核心：在两个非成对的图像域 A、B 之间，
//! 以循环一致性训练一对图像翻译网络。
//!
//! - `tensor`：基于 ndarray 的张量与卷积内核
//! - `nn`：define-by-run 的自动微分（支持二阶导数）、层、损失与 Adam
//! - `networks`：ResNet 生成器与 PatchGAN 判别器
//! - `image_pool`：历史生成图像缓冲池
//! - `cycle_gan`：前向、损失组合、梯度开关与训练步编排
//!

pub mod cycle_gan;
pub mod errors;
pub mod image_pool;
pub mod networks;
pub mod nn;
pub mod tensor;
