/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 计算图节点
 *
 * 每个节点由 Var 以 Rc 持有，子节点通过`parents`强引用父节点，
 * 因此只要 loss 还活着，整条前向链就活着；反向传播（不保留图时）会清空
 * 已访问节点的`parents`，从而释放中间结果。
 */

mod raw_node;

pub(crate) use raw_node::*;

use crate::nn::Var;
use crate::nn::graph::GraphInner;
use crate::tensor::Tensor;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// 节点 ID（在所属 Graph 内唯一）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) struct NodeInner {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) node_type: NodeType,
    pub(crate) value: RefCell<Tensor>,
    /// 反向传播累积到叶子节点上的梯度
    pub(crate) grad: RefCell<Option<Tensor>>,
    pub(crate) parents: RefCell<Vec<Var>>,
    pub(crate) requires_grad: Cell<bool>,
    /// 父节点引用已被反向传播释放
    pub(crate) released: Cell<bool>,
    pub(crate) graph: Rc<GraphInner>,
}
