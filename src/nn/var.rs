/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : Var - 智能变量句柄，支持算子重载和链式调用
 *
 * define-by-run：每次运算立即计算出值，并（在需要梯度时）记录父节点，
 * 反向传播沿记录下来的父节点进行。
 */

use super::graph::Graph;
use super::nodes::{
    AddScalar, Divide, Input, Multiply, NodeId, NodeInner, NodeType, PowScalar, Scale, Subtract,
    TraitNode,
};
use super::{GraphError, autograd};
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use std::cell::{Cell, Ref, RefCell};
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

// ==================== Init 枚举 ====================

/// 参数初始化策略
#[derive(Debug, Clone, PartialEq)]
pub enum Init {
    /// 常数初始化
    Constant(f32),
    /// 全零
    Zeros,
    /// 正态分布（使用 Graph 的 RNG）
    Normal { mean: f32, std: f32 },
    /// Xavier/Glorot 正态初始化：std = gain * sqrt(2 / (fan_in + fan_out))
    Xavier { gain: f32 },
    /// Kaiming/He 正态初始化（fan_in 模式，适用于 `ReLU`）：std = sqrt(2 / fan_in)
    Kaiming,
}

/// 计算 (fan_in, fan_out)：卷积核 [C_out, C_in, kH, kW] 的感受野计入其中
fn fans(shape: &[usize]) -> (usize, usize) {
    match shape {
        [] => (1, 1),
        [n] => (*n, *n),
        [out, inp, rest @ ..] => {
            let receptive = rest.iter().product::<usize>();
            (inp * receptive, out * receptive)
        }
    }
}

impl Init {
    /// 生成初始化后的 Tensor（使用指定的 RNG）
    pub fn generate_with_rng(&self, shape: &[usize], rng: &mut StdRng) -> Tensor {
        match self {
            Self::Constant(v) => Tensor::full(*v, shape),
            Self::Zeros => Tensor::zeros(shape),
            Self::Normal { mean, std } => Tensor::normal_with_rng(*mean, *std, shape, rng),
            Self::Xavier { gain } => {
                let (fan_in, fan_out) = fans(shape);
                let std = gain * (2.0 / (fan_in + fan_out).max(1) as f32).sqrt();
                Tensor::normal_with_rng(0.0, std, shape, rng)
            }
            Self::Kaiming => {
                let (fan_in, _) = fans(shape);
                let std = (2.0 / fan_in.max(1) as f32).sqrt();
                Tensor::normal_with_rng(0.0, std, shape, rng)
            }
        }
    }
}

// ==================== Var 结构 ====================

/// 智能变量句柄 - 持有节点，节点又持有所属图的引用
///
/// # 使用示例
/// ```ignore
/// let graph = Graph::new_with_seed(42);
/// let x = graph.input(&images);
/// let h = conv.forward(&x)?.leaky_relu(0.2)?;
/// let loss = h.mse_loss(&target)?;
/// loss.backward()?;
/// ```
#[derive(Clone)]
pub struct Var {
    node: Rc<NodeInner>,
}

impl std::fmt::Debug for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Var")
            .field("name", &self.node.name)
            .field("shape", &self.shape())
            .field("requires_grad", &self.requires_grad())
            .finish()
    }
}

impl Var {
    pub(crate) fn new_leaf(
        graph: &Graph,
        value: Tensor,
        requires_grad: bool,
        node_type: NodeType,
        name: Option<&str>,
    ) -> Self {
        let id = graph.next_node_id();
        let name = name.map_or_else(|| format!("{}:{id}", node_type.type_name()), str::to_string);
        Self {
            node: Rc::new(NodeInner {
                id,
                name,
                node_type,
                value: RefCell::new(value),
                grad: RefCell::new(None),
                parents: RefCell::new(Vec::new()),
                requires_grad: Cell::new(requires_grad),
                released: Cell::new(false),
                graph: Rc::clone(graph.inner_rc()),
            }),
        }
    }

    /// 由运算创建新节点：立即计算值；仅在梯度模式开启且有父节点需要梯度时记录父节点
    pub(crate) fn from_op(op: impl Into<NodeType>, parents: &[&Self]) -> Result<Self, GraphError> {
        let first = parents.first().ok_or_else(|| {
            GraphError::InvalidOperation("运算节点至少需要1个父节点".to_string())
        })?;
        for parent in &parents[1..] {
            first.check_same_graph(parent)?;
        }

        let node_type = op.into();
        let value = {
            let guards: Vec<Ref<'_, Tensor>> = parents.iter().map(|p| p.node.value.borrow()).collect();
            let values: Vec<&Tensor> = guards.iter().map(|g| &**g).collect();
            node_type.calc_value(&values)?
        };

        let graph = first.graph();
        let tracked = graph.is_grad_enabled() && parents.iter().any(|p| p.requires_grad());
        let id = graph.next_node_id();
        let recorded = if tracked {
            parents.iter().map(|&p| p.clone()).collect()
        } else {
            Vec::new()
        };
        Ok(Self {
            node: Rc::new(NodeInner {
                id,
                name: format!("{}:{id}", node_type.type_name()),
                node_type,
                value: RefCell::new(value),
                grad: RefCell::new(None),
                parents: RefCell::new(recorded),
                requires_grad: Cell::new(tracked),
                released: Cell::new(false),
                graph: Rc::clone(&first.node.graph),
            }),
        })
    }

    /// 在同一图上创建常量节点（反向传播中的掩码、噪声等）
    pub fn constant_like(&self, value: &Tensor) -> Self {
        self.graph().input(value)
    }

    pub(crate) fn node(&self) -> &NodeInner {
        &self.node
    }

    /// 获取节点 ID
    pub fn node_id(&self) -> NodeId {
        self.node.id
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// 获取 Var 所属的 Graph handle
    pub fn graph(&self) -> Graph {
        Graph::from_rc(Rc::clone(&self.node.graph))
    }

    /// 检查两个 Var 是否来自同一个 Graph
    pub fn same_graph(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node.graph, &other.node.graph)
    }

    pub(crate) fn check_same_graph(&self, other: &Self) -> Result<(), GraphError> {
        if self.same_graph(other) {
            Ok(())
        } else {
            Err(GraphError::GraphMismatch)
        }
    }

    /// 是否为同一个节点
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    // ==================== 值访问和设置 ====================

    /// 获取节点的值（克隆的 Tensor）
    pub fn value(&self) -> Tensor {
        self.node.value.borrow().clone()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.node.value.borrow().shape().to_vec()
    }

    /// 获取标量值（只含1个元素的张量）
    pub fn item(&self) -> Result<f32, GraphError> {
        self.node.value.borrow().number().ok_or_else(|| {
            GraphError::InvalidOperation(format!(
                "`{}`的形状为{:?}，不是标量",
                self.name(),
                self.shape()
            ))
        })
    }

    /// 设置叶子节点的值（形状必须不变），供优化器和谱归一化使用
    pub fn set_value(&self, value: &Tensor) -> Result<(), GraphError> {
        if !self.is_leaf() {
            return Err(GraphError::InvalidOperation(format!(
                "运算节点`{}`的值由父节点决定，不能手动设置",
                self.name()
            )));
        }
        let expected = self.shape();
        if value.shape() != expected.as_slice() {
            return Err(GraphError::ShapeMismatch {
                expected,
                got: value.shape().to_vec(),
                message: format!("设置`{}`的值", self.name()),
            });
        }
        *self.node.value.borrow_mut() = value.clone();
        Ok(())
    }

    // ==================== 梯度 ====================

    /// 获取反向传播累积到本节点（叶子）的梯度
    pub fn grad(&self) -> Option<Tensor> {
        self.node.grad.borrow().clone()
    }

    pub fn clear_grad(&self) {
        *self.node.grad.borrow_mut() = None;
    }

    pub(crate) fn accumulate_grad(&self, grad: &Tensor) {
        let mut slot = self.node.grad.borrow_mut();
        *slot = Some(match slot.take() {
            Some(existing) => existing + grad,
            None => grad.clone(),
        });
    }

    pub fn requires_grad(&self) -> bool {
        self.node.requires_grad.get()
    }

    /// 设置叶子节点是否需要梯度（冻结/解冻参数）
    pub fn set_requires_grad(&self, requires_grad: bool) -> Result<(), GraphError> {
        if !self.is_leaf() {
            return Err(GraphError::InvalidOperation(format!(
                "只有叶子节点可以设置 requires_grad，`{}`是运算节点",
                self.name()
            )));
        }
        self.node.requires_grad.set(requires_grad);
        Ok(())
    }

    pub fn is_leaf(&self) -> bool {
        self.node.node_type.is_leaf()
    }

    pub(crate) fn parents(&self) -> Vec<Self> {
        self.node.parents.borrow().clone()
    }

    pub(crate) fn is_released(&self) -> bool {
        self.node.released.get()
    }

    /// 释放对父节点的引用（反向传播后未保留计算图时调用）
    pub(crate) fn release(&self) {
        if !self.is_leaf() {
            self.node.parents.borrow_mut().clear();
            self.node.released.set(true);
        }
    }

    // ==================== 梯度流控制 ====================

    /// 截断梯度流：返回值相同、不需要梯度的新叶子节点
    pub fn detach(&self) -> Self {
        Self::new_leaf(
            &self.graph(),
            self.value(),
            false,
            NodeType::from(Input),
            None,
        )
    }

    // ==================== 执行 ====================

    /// 反向传播，完成后释放计算图；返回 loss 的标量值
    pub fn backward(&self) -> Result<f32, GraphError> {
        self.backward_ex(false)
    }

    /// 反向传播；`retain_graph`为 true 时保留计算图以便再次反向传播
    pub fn backward_ex(&self, retain_graph: bool) -> Result<f32, GraphError> {
        let loss_value = self.item()?;
        autograd::backward(self, retain_graph)?;
        Ok(loss_value)
    }

    // ==================== 与纯数的运算 ====================

    /// 乘以常数
    pub fn scale(&self, factor: f32) -> Result<Self, GraphError> {
        Self::from_op(Scale { factor }, &[self])
    }

    /// 加上常数
    pub fn add_scalar(&self, value: f32) -> Result<Self, GraphError> {
        Self::from_op(AddScalar { value }, &[self])
    }

    /// 常数次幂
    pub fn powf(&self, exponent: f32) -> Result<Self, GraphError> {
        Self::from_op(PowScalar { exponent }, &[self])
    }

    // ==================== 安全版本（返回 Result）====================

    /// 安全的加法（返回 Result），支持广播
    pub fn try_add(&self, other: &Self) -> Result<Self, GraphError> {
        Self::from_op(super::nodes::Add, &[self, other])
    }

    /// 安全的减法（返回 Result），支持广播
    pub fn try_sub(&self, other: &Self) -> Result<Self, GraphError> {
        Self::from_op(Subtract, &[self, other])
    }

    /// 安全的元素级乘法（返回 Result），支持广播
    pub fn try_mul(&self, other: &Self) -> Result<Self, GraphError> {
        Self::from_op(Multiply, &[self, other])
    }

    /// 安全的除法（返回 Result）：`self / other`，支持广播
    pub fn try_div(&self, other: &Self) -> Result<Self, GraphError> {
        Self::from_op(Divide, &[self, other])
    }
}

// ==================== 算子重载 ====================

macro_rules! impl_var_binary_op {
    ($trait:ident, $method:ident, $try_method:ident, $msg:literal) => {
        impl $trait for &Var {
            type Output = Var;

            fn $method(self, other: &Var) -> Var {
                self.$try_method(other).expect($msg)
            }
        }

        impl $trait for Var {
            type Output = Self;

            fn $method(self, other: Self) -> Self {
                (&self).$method(&other)
            }
        }

        impl $trait<Var> for &Var {
            type Output = Var;

            fn $method(self, other: Var) -> Var {
                self.$method(&other)
            }
        }

        impl $trait<&Self> for Var {
            type Output = Self;

            fn $method(self, other: &Self) -> Self {
                (&self).$method(other)
            }
        }
    };
}

impl_var_binary_op!(Add, add, try_add, "Var 加法失败");
impl_var_binary_op!(Sub, sub, try_sub, "Var 减法失败");
impl_var_binary_op!(Mul, mul, try_mul, "Var 乘法失败");
impl_var_binary_op!(Div, div, try_div, "Var 除法失败");

// Neg for &Var（实现为 -1 * self）
impl Neg for &Var {
    type Output = Var;

    fn neg(self) -> Var {
        self.scale(-1.0).expect("Var 取反失败")
    }
}

impl Neg for Var {
    type Output = Self;

    fn neg(self) -> Self {
        -&self
    }
}
