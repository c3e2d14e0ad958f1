mod leaf;
mod ops;

pub(crate) use leaf::{Input, Parameter};
pub(crate) use ops::*;

use crate::nn::{GraphError, Var};
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
pub(crate) enum NodeType {
    Input,
    Parameter,
    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓算子↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    Add,
    Subtract,
    Multiply,
    Divide,
    Scale,
    AddScalar,
    PowScalar,
    Abs,
    Sqrt,
    SafeReciprocal,
    Exp,
    Ln,
    Clamp,
    Sigmoid,
    Tanh,
    LeakyRelu,
    Sum,
    Mean,
    SumTo,
    BroadcastTo,
    Reshape,
    Conv2d,
    ConvTranspose2d,
    Conv2dWeightGrad,
    ReflectionPad2d,
    ReflectionPad2dBackward,
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑算子↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
}

#[enum_dispatch(NodeType)]
pub(crate) trait TraitNode {
    /// 节点类型名，用于生成类似"Conv2d:3"的节点名
    fn type_name(&self) -> &'static str;

    fn is_leaf(&self) -> bool {
        false
    }

    /// 根据父节点的值计算本节点的值
    fn calc_value(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError>;

    /// 向量-雅可比积：把上游梯度`upstream`分配给各父节点（None 表示该父节点不接收梯度）
    ///
    /// 实现只能用 Var 运算表达，这样在 create_graph 模式下得到的梯度本身仍可求导
    fn calc_grads_to_parents(
        &self,
        parents: &[Var],
        output: &Var,
        upstream: &Var,
    ) -> Result<Vec<Option<Var>>, GraphError>;
}

/// 取唯一父节点的值，父节点数量不符视为 crate 内部错误
fn single<'a>(parents: &[&'a Tensor], op: &str) -> Result<&'a Tensor, GraphError> {
    match parents {
        [x] => Ok(*x),
        _ => Err(GraphError::ComputationError(format!(
            "{op}节点需要1个父节点，实际{}个。不该触及本错误，否则说明crate代码有问题",
            parents.len()
        ))),
    }
}

fn pair<'a>(parents: &[&'a Tensor], op: &str) -> Result<(&'a Tensor, &'a Tensor), GraphError> {
    match parents {
        [a, b] => Ok((*a, *b)),
        _ => Err(GraphError::ComputationError(format!(
            "{op}节点需要2个父节点，实际{}个。不该触及本错误，否则说明crate代码有问题",
            parents.len()
        ))),
    }
}

fn parent_single(parents: &[Var]) -> Result<&Var, GraphError> {
    match parents {
        [x] => Ok(x),
        _ => Err(GraphError::ComputationError(format!(
            "一元运算节点需要1个父节点，实际{}个",
            parents.len()
        ))),
    }
}

fn parent_pair(parents: &[Var]) -> Result<(&Var, &Var), GraphError> {
    match parents {
        [a, b] => Ok((a, b)),
        _ => Err(GraphError::ComputationError(format!(
            "二元运算节点需要2个父节点，实际{}个",
            parents.len()
        ))),
    }
}
