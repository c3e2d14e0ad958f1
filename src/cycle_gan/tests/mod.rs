mod model;
mod objectives;
mod policy;

use crate::networks::ImageNetwork;
use crate::nn::{Graph, GraphError, Init, Module, Var, VarReduceOps};

/// x · w，w 为标量参数；w = 1 时是带参数的恒等映射
pub(super) struct Scaled {
    w: Var,
    name: String,
}

impl Scaled {
    pub(super) fn new(graph: &Graph, value: f32, name: &str) -> Self {
        Self {
            w: graph.parameter(&[1, 1, 1, 1], &Init::Constant(value), &format!("{name}_w")),
            name: name.to_string(),
        }
    }
}

impl Module for Scaled {
    fn parameters(&self) -> Vec<Var> {
        vec![self.w.clone()]
    }
}

impl ImageNetwork for Scaled {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        x.try_mul(&self.w)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 每个样本打分 sum(w ⊙ x) + b，输出 [batch, 1, 1, 1]
pub(super) struct LinearCritic {
    w: Var,
    b: Var,
    name: String,
}

impl LinearCritic {
    pub(super) fn new(graph: &Graph, shape: &[usize], w: f32, b: f32, name: &str) -> Self {
        Self {
            w: graph.parameter(shape, &Init::Constant(w), &format!("{name}_w")),
            b: graph.parameter(&[1, 1, 1, 1], &Init::Constant(b), &format!("{name}_b")),
            name: name.to_string(),
        }
    }
}

impl Module for LinearCritic {
    fn parameters(&self) -> Vec<Var> {
        vec![self.w.clone(), self.b.clone()]
    }
}

impl ImageNetwork for LinearCritic {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let batch = x.shape()[0];
        x.try_mul(&self.w)?
            .sum_to(&[batch, 1, 1, 1])?
            .try_add(&self.b)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 前向总是失败的判别器
pub(super) struct Broken {
    b: Var,
}

impl Broken {
    pub(super) fn new(graph: &Graph) -> Self {
        Self {
            b: graph.parameter(&[1, 1, 1, 1], &Init::Zeros, "broken_b"),
        }
    }
}

impl Module for Broken {
    fn parameters(&self) -> Vec<Var> {
        vec![self.b.clone()]
    }
}

impl ImageNetwork for Broken {
    fn forward(&self, _x: &Var) -> Result<Var, GraphError> {
        Err(GraphError::ComputationError("故意失败".to_string()))
    }

    fn name(&self) -> &str {
        "broken"
    }
}
