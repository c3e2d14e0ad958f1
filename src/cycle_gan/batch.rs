use super::Direction;
use crate::tensor::Tensor;

/// 一个训练批次：两个域各一批（非成对）图像，以及它们的来源标识
///
/// 对应数据加载端的`A`、`B`、`A_paths`、`B_paths`四个键
#[derive(Debug, Clone)]
pub struct UnpairedBatch {
    pub a: Tensor,
    pub b: Tensor,
    pub a_paths: Vec<String>,
    pub b_paths: Vec<String>,
}

impl UnpairedBatch {
    pub fn new(a: Tensor, b: Tensor) -> Self {
        Self {
            a,
            b,
            a_paths: Vec::new(),
            b_paths: Vec::new(),
        }
    }

    pub fn with_paths(mut self, a_paths: Vec<String>, b_paths: Vec<String>) -> Self {
        self.a_paths = a_paths;
        self.b_paths = b_paths;
        self
    }

    /// 按方向选出 (real_A, real_B, 路径)；BtoA 时两个域互换
    pub fn select(&self, direction: Direction) -> (&Tensor, &Tensor, &[String]) {
        match direction {
            Direction::AtoB => (&self.a, &self.b, &self.a_paths),
            Direction::BtoA => (&self.b, &self.a, &self.b_paths),
        }
    }
}
