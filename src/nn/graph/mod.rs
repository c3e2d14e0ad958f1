/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 计算图句柄（Graph）
 *
 * Graph 本身不保存节点：节点由 Var 以 Rc 持有（define-by-run）。
 * Graph 负责的是一次训练共享的“环境”：
 * - 设备（Device），所有经由 Graph 创建的张量都在该设备上
 * - 可复现的随机数发生器（参数初始化、噪声、插值系数）
 * - 梯度模式（no_grad 作用域）
 * - 节点 ID 分配
 */

mod error;

pub use error::GraphError;

use crate::nn::nodes::{NodeId, NodeType};
use crate::nn::var::{Init, Var};
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// 计算设备
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Device {
    /// 主机处理器
    #[default]
    Cpu,
}

impl Device {
    /// 由配置中的设备列表解析设备：空列表或只含负数（如`[-1]`）表示 CPU
    pub fn from_gpu_ids(gpu_ids: &[i32]) -> Result<Self, GraphError> {
        let gpus: Vec<i32> = gpu_ids.iter().copied().filter(|&id| id >= 0).collect();
        if gpus.is_empty() {
            Ok(Self::Cpu)
        } else {
            Err(GraphError::UnsupportedDevice(format!(
                "本库只支持 CPU，但配置请求了 GPU {gpus:?}"
            )))
        }
    }
}

pub(crate) struct GraphInner {
    name: String,
    device: Device,
    rng: RefCell<StdRng>,
    next_id: Cell<u64>,
    grad_enabled: Cell<bool>,
}

/// 计算图句柄，Clone 开销极低（Rc clone）
#[derive(Clone)]
pub struct Graph {
    inner: Rc<GraphInner>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.inner.name)
            .field("device", &self.inner.device)
            .finish()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// 创建新图（随机种子取自系统熵）
    pub fn new() -> Self {
        Self::build(Device::Cpu, StdRng::from_entropy())
    }

    /// 创建带固定随机种子的图，用于可复现的训练和测试
    pub fn new_with_seed(seed: u64) -> Self {
        Self::build(Device::Cpu, StdRng::seed_from_u64(seed))
    }

    /// 在指定设备上创建图；`seed`为 None 时取系统熵
    pub fn with_device(device: Device, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self::build(device, rng)
    }

    fn build(device: Device, rng: StdRng) -> Self {
        Self {
            inner: Rc::new(GraphInner {
                name: "default_graph".to_string(),
                device,
                rng: RefCell::new(rng),
                next_id: Cell::new(0),
                grad_enabled: Cell::new(true),
            }),
        }
    }

    pub(crate) const fn from_rc(inner: Rc<GraphInner>) -> Self {
        Self { inner }
    }

    pub(crate) const fn inner_rc(&self) -> &Rc<GraphInner> {
        &self.inner
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn device(&self) -> Device {
        self.inner.device
    }

    /// 两个句柄是否指向同一个图
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ==================== 梯度模式 ====================

    pub fn is_grad_enabled(&self) -> bool {
        self.inner.grad_enabled.get()
    }

    pub(crate) fn set_grad_enabled(&self, enabled: bool) {
        self.inner.grad_enabled.set(enabled);
    }

    /// 在不记录梯度的作用域内执行`f`（作用域结束时恢复原模式）
    ///
    /// 作用域内创建的节点不记录父节点，因而不参与任何反向传播。
    pub fn no_grad_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.grad_mode_scope(false, f)
    }

    pub(crate) fn grad_mode_scope<F, R>(&self, enabled: bool, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let previous = self.is_grad_enabled();
        self.set_grad_enabled(enabled);
        let result = f();
        self.set_grad_enabled(previous);
        result
    }

    // ==================== 随机数 ====================

    /// 借用图的随机数发生器
    pub fn with_rng<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut StdRng) -> R,
    {
        f(&mut self.inner.rng.borrow_mut())
    }

    pub(crate) fn next_node_id(&self) -> NodeId {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        NodeId(id)
    }

    // ==================== 叶子节点 ====================

    /// 创建输入（常量）节点：不需要梯度
    pub fn input(&self, value: &Tensor) -> Var {
        self.leaf(value.clone(), false, NodeType::from(crate::nn::nodes::Input), None)
    }

    /// 创建需要梯度的输入节点（如梯度惩罚中的插值样本 x̃）
    pub fn input_requiring_grad(&self, value: &Tensor) -> Var {
        self.leaf(value.clone(), true, NodeType::from(crate::nn::nodes::Input), None)
    }

    /// 创建可训练参数节点
    pub fn parameter(&self, shape: &[usize], init: &Init, name: &str) -> Var {
        let value = self.with_rng(|rng| init.generate_with_rng(shape, rng));
        self.parameter_from(value, name)
    }

    /// 以给定初值创建可训练参数节点
    pub fn parameter_from(&self, value: Tensor, name: &str) -> Var {
        self.leaf(value, true, NodeType::from(crate::nn::nodes::Parameter), Some(name))
    }

    /// 标准正态噪声（常量节点）
    pub fn randn(&self, shape: &[usize]) -> Var {
        let value = self.with_rng(|rng| Tensor::normal_with_rng(0.0, 1.0, shape, rng));
        self.input(&value)
    }

    /// [min, max] 均匀分布噪声（常量节点）
    pub fn rand_uniform(&self, shape: &[usize], min: f32, max: f32) -> Var {
        let value = self.with_rng(|rng| Tensor::uniform_with_rng(min, max, shape, rng));
        self.input(&value)
    }

    fn leaf(&self, value: Tensor, requires_grad: bool, node_type: NodeType, name: Option<&str>) -> Var {
        Var::new_leaf(self, value, requires_grad, node_type, name)
    }
}
