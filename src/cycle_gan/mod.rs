/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : CycleGAN 训练核心：前向、损失组合、梯度开关与训练步编排
 */

mod batch;
mod discriminator_objective;
mod error;
mod forward;
pub mod gate;
mod generator_objective;
mod losses;
mod model;
mod options;
mod policy;

pub use batch::UnpairedBatch;
pub use discriminator_objective::{DiscriminatorLoss, DiscriminatorObjective, DiscriminatorTerms};
pub use error::CycleGanError;
pub use forward::{DerivedImages, forward_pass};
pub use generator_objective::{
    GeneratorLoss, GeneratorObjective, GeneratorTerms, MODE_SEEKING_EPS, MODE_SEEKING_WEIGHT,
    mode_seeking_loss,
};
pub use losses::{LOSS_NAMES, LossRecord};
pub use model::{CycleGanModel, StepPhase};
pub use options::{CycleGanOptions, Direction};
pub use policy::{AdversarialLossKind, GradientPenalty, LossVariantPolicy, LossWeights};

#[cfg(test)]
mod tests;
