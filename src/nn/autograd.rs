/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 反向传播引擎
 *
 * - `backward`：把 loss 对各叶子节点的梯度累加到叶子的`.grad`上
 * - `grad`：直接返回输出对指定输入的梯度，不触碰`.grad`
 *
 * create_graph 为 true 时，梯度计算本身也被记录进计算图，得到的梯度可再次求导。
 * retain_graph 为 false 时，反向传播结束后释放所经过的运算节点；
 * 之后再从这些节点反向传播会得到`GraphError::GraphReleased`。
 */

use super::nodes::{NodeId, TraitNode};
use super::{GraphError, Var};
use crate::tensor::Tensor;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// 需要梯度的节点按拓扑序排列：每个节点都排在它的所有父节点之前
fn topo_order(roots: &[Var]) -> Result<Vec<Var>, GraphError> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut stack: Vec<(Var, bool)> = roots
        .iter()
        .filter(|r| r.requires_grad())
        .map(|r| (r.clone(), false))
        .collect();

    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            order.push(node);
            continue;
        }
        if !visited.insert(node.node_id()) {
            continue;
        }
        if node.is_released() {
            return Err(GraphError::GraphReleased(node.name().to_string()));
        }
        let parents = node.parents();
        stack.push((node, true));
        for parent in parents {
            if parent.requires_grad() && !visited.contains(&parent.node_id()) {
                stack.push((parent, false));
            }
        }
    }

    order.reverse();
    Ok(order)
}

fn accumulate(grads: &mut HashMap<NodeId, Var>, node: &Var, grad: Var) -> Result<(), GraphError> {
    let merged = match grads.remove(&node.node_id()) {
        Some(existing) => existing.try_add(&grad)?,
        None => grad,
    };
    grads.insert(node.node_id(), merged);
    Ok(())
}

/// 从`outputs`（以`seeds`为初始梯度）反向传播
///
/// 返回拓扑序与各节点的梯度；非叶子节点的梯度用完即丢，`keep`中的除外
fn propagate(
    outputs: &[Var],
    seeds: Vec<Var>,
    create_graph: bool,
    retain_graph: bool,
    keep: &HashSet<NodeId>,
) -> Result<(Vec<Var>, HashMap<NodeId, Var>), GraphError> {
    let graph = outputs
        .first()
        .ok_or_else(|| GraphError::InvalidOperation("反向传播至少需要1个输出".to_string()))?
        .graph();
    let order = topo_order(outputs)?;
    let mut grads = HashMap::new();

    graph.grad_mode_scope(create_graph, || -> Result<(), GraphError> {
        for (output, seed) in outputs.iter().zip(seeds) {
            accumulate(&mut grads, output, seed)?;
        }
        for node in &order {
            if node.is_leaf() {
                continue;
            }
            let upstream = if keep.contains(&node.node_id()) {
                grads.get(&node.node_id()).cloned()
            } else {
                grads.remove(&node.node_id())
            };
            let Some(upstream) = upstream else {
                continue;
            };
            let parents = node.parents();
            let parent_grads = node
                .node()
                .node_type
                .calc_grads_to_parents(&parents, node, &upstream)?;
            for (parent, grad) in parents.iter().zip(parent_grads) {
                if let Some(grad) = grad {
                    if parent.requires_grad() {
                        accumulate(&mut grads, parent, grad)?;
                    }
                }
            }
        }
        Ok(())
    })?;

    if !retain_graph {
        for node in &order {
            node.release();
        }
    }
    Ok((order, grads))
}

pub(crate) fn backward(loss: &Var, retain_graph: bool) -> Result<(), GraphError> {
    if !loss.requires_grad() {
        return Err(GraphError::InvalidOperation(format!(
            "`{}`不需要梯度（可能在 no_grad 作用域内创建，或其所有输入均已冻结），无法反向传播",
            loss.name()
        )));
    }
    if !loss.graph().is_grad_enabled() {
        warn!("在 no_grad 作用域内对`{}`调用 backward", loss.name());
    }

    let seed = loss.constant_like(&Tensor::ones(&loss.shape()));
    let (order, grads) = propagate(
        std::slice::from_ref(loss),
        vec![seed],
        false,
        retain_graph,
        &HashSet::new(),
    )?;
    for leaf in order.iter().filter(|n| n.is_leaf()) {
        if let Some(grad) = grads.get(&leaf.node_id()) {
            leaf.accumulate_grad(&grad.value());
        }
    }
    Ok(())
}

/// 计算`outputs`对`inputs`的梯度并直接返回（不累加到`.grad`）
///
/// - `grad_outputs`：各输出的初始梯度，None 时取全1
/// - `create_graph`：记录梯度计算过程，使返回的梯度可再次求导（如梯度惩罚）
/// - `retain_graph`：保留前向计算图，以便随后再对其反向传播
///
/// 与输出无关的输入得到全0梯度。
pub fn grad(
    outputs: &[Var],
    inputs: &[Var],
    grad_outputs: Option<&[Var]>,
    create_graph: bool,
    retain_graph: bool,
) -> Result<Vec<Var>, GraphError> {
    let first = outputs
        .first()
        .ok_or_else(|| GraphError::InvalidOperation("grad 至少需要1个输出".to_string()))?;
    for var in outputs.iter().chain(inputs) {
        first.check_same_graph(var)?;
        if !var.requires_grad() {
            return Err(GraphError::InvalidOperation(format!(
                "`{}`不需要梯度，无法参与 grad 计算",
                var.name()
            )));
        }
    }

    let seeds = match grad_outputs {
        Some(seeds) => {
            if seeds.len() != outputs.len() {
                return Err(GraphError::InvalidOperation(format!(
                    "grad_outputs 数量{}与输出数量{}不一致",
                    seeds.len(),
                    outputs.len()
                )));
            }
            for (output, seed) in outputs.iter().zip(seeds) {
                first.check_same_graph(seed)?;
                if output.shape() != seed.shape() {
                    return Err(GraphError::ShapeMismatch {
                        expected: output.shape(),
                        got: seed.shape(),
                        message: format!("`{}`的 grad_output", output.name()),
                    });
                }
            }
            seeds.to_vec()
        }
        None => outputs
            .iter()
            .map(|o| o.constant_like(&Tensor::ones(&o.shape())))
            .collect(),
    };

    let keep: HashSet<NodeId> = inputs.iter().map(Var::node_id).collect();
    let (_, grads) = propagate(outputs, seeds, create_graph, retain_graph, &keep)?;
    Ok(inputs
        .iter()
        .map(|input| {
            grads
                .get(&input.node_id())
                .cloned()
                .unwrap_or_else(|| input.constant_like(&Tensor::zeros(&input.shape())))
        })
        .collect())
}
