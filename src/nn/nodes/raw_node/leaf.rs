use super::TraitNode;
use crate::nn::{GraphError, Var};
use crate::tensor::Tensor;

/// 输入节点：值由外部给定，默认不需要梯度
pub(crate) struct Input;

/// 参数节点：可训练，值由优化器更新
pub(crate) struct Parameter;

macro_rules! impl_leaf {
    ($name:ident) => {
        impl TraitNode for $name {
            fn type_name(&self) -> &'static str {
                stringify!($name)
            }

            fn is_leaf(&self) -> bool {
                true
            }

            fn calc_value(&self, _parents: &[&Tensor]) -> Result<Tensor, GraphError> {
                Err(GraphError::InvalidOperation(format!(
                    "{}节点的值不由父节点计算",
                    stringify!($name)
                )))
            }

            fn calc_grads_to_parents(
                &self,
                _parents: &[Var],
                _output: &Var,
                _upstream: &Var,
            ) -> Result<Vec<Option<Var>>, GraphError> {
                Ok(Vec::new())
            }
        }
    };
}

impl_leaf!(Input);
impl_leaf!(Parameter);
