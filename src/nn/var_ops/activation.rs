use crate::nn::nodes::{LeakyRelu, Sigmoid, Tanh};
use crate::nn::{GraphError, Var};

/// 激活函数扩展 trait
///
/// # 使用示例
/// ```ignore
/// use only_cyclegan::nn::VarActivationOps;
///
/// let h = conv.forward(&x)?.leaky_relu(0.2)?;
/// let img = head.forward(&h)?.tanh()?;
/// ```
pub trait VarActivationOps {
    /// `ReLU` 激活：max(0, x)
    fn relu(&self) -> Result<Var, GraphError>;

    /// `LeakyReLU` 激活：x if x > 0 else negative_slope * x
    fn leaky_relu(&self, negative_slope: f32) -> Result<Var, GraphError>;

    /// Sigmoid 激活：1 / (1 + exp(-x))
    fn sigmoid(&self) -> Result<Var, GraphError>;

    /// Tanh 激活
    fn tanh(&self) -> Result<Var, GraphError>;
}

impl VarActivationOps for Var {
    fn relu(&self) -> Result<Var, GraphError> {
        self.leaky_relu(0.0)
    }

    fn leaky_relu(&self, negative_slope: f32) -> Result<Var, GraphError> {
        if negative_slope < 0.0 || !negative_slope.is_finite() {
            return Err(GraphError::InvalidOperation(format!(
                "LeakyReLU的negative_slope应为非负数，但得到: {negative_slope}"
            )));
        }
        Self::from_op(LeakyRelu { negative_slope }, &[self])
    }

    fn sigmoid(&self) -> Result<Var, GraphError> {
        Self::from_op(Sigmoid, &[self])
    }

    fn tanh(&self) -> Result<Var, GraphError> {
        Self::from_op(Tanh, &[self])
    }
}
