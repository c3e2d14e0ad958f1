/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 判别器参数的梯度开关
 *
 * 生成器步之前冻结两个判别器，判别器步之前解冻。
 * 冻结只改变叶子参数的 requires_grad：生成器反向传播仍会穿过判别器的运算节点，
 * 但不会把梯度累加到判别器参数上。
 */

use crate::networks::ImageNetwork;
use crate::nn::GraphError;

pub fn freeze(networks: &[&dyn ImageNetwork]) -> Result<(), GraphError> {
    set_trainable(networks, false)
}

pub fn unfreeze(networks: &[&dyn ImageNetwork]) -> Result<(), GraphError> {
    set_trainable(networks, true)
}

fn set_trainable(networks: &[&dyn ImageNetwork], trainable: bool) -> Result<(), GraphError> {
    for net in networks {
        net.set_requires_grad(trainable)?;
    }
    Ok(())
}

/// 所有参数都不需要梯度
pub fn is_frozen(networks: &[&dyn ImageNetwork]) -> bool {
    networks
        .iter()
        .flat_map(|net| net.parameters())
        .all(|p| !p.requires_grad())
}

/// 所有参数都需要梯度
pub fn is_trainable(networks: &[&dyn ImageNetwork]) -> bool {
    networks
        .iter()
        .flat_map(|net| net.parameters())
        .all(|p| p.requires_grad())
}
