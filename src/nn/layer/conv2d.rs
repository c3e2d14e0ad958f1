/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : Conv2d (2D 卷积) 层 - PyTorch 风格 API
 *
 * 输入/输出形状：
 * - 输入：[batch_size, in_channels, H, W]
 * - 输出：[batch_size, out_channels, H', W']
 *
 * 输出尺寸计算：
 * H' = (H + 2*padding_h - kernel_h) / stride_h + 1
 * W' = (W + 2*padding_w - kernel_w) / stride_w + 1
 *
 * 计算：output = conv2d(x, K) + b
 */

use crate::nn::{Graph, GraphError, Init, Module, Var, VarConvOps};

/// Conv2d (2D 卷积) 层
///
/// # 使用示例
/// ```ignore
/// let conv = Conv2d::new(&graph, 3, 64, (4, 4), (2, 2), (1, 1), true, &Init::Normal { mean: 0.0, std: 0.02 }, "D.conv0");
/// let h = conv.forward(&x)?.leaky_relu(0.2)?;
/// ```
pub struct Conv2d {
    /// 卷积核参数 [out_channels, in_channels, kernel_h, kernel_w]
    kernel: Var,
    /// 偏置参数 [1, out_channels, 1, 1]（可选）
    bias: Option<Var>,
    stride: (usize, usize),
    padding: (usize, usize),
    name: String,
}

impl Conv2d {
    /// 创建新的 Conv2d 层：卷积核按`init`初始化，偏置初始化为0
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: &Graph,
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize),
        stride: (usize, usize),
        padding: (usize, usize),
        use_bias: bool,
        init: &Init,
        name: &str,
    ) -> Self {
        let kernel = graph.parameter(
            &[out_channels, in_channels, kernel_size.0, kernel_size.1],
            init,
            &format!("{name}_K"),
        );
        let bias = use_bias
            .then(|| graph.parameter(&[1, out_channels, 1, 1], &Init::Zeros, &format!("{name}_b")));
        Self {
            kernel,
            bias,
            stride,
            padding,
            name: name.to_string(),
        }
    }

    /// 前向传播
    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        self.forward_with_kernel(x, &self.kernel)
    }

    /// 以替代的卷积核做前向（谱归一化后的核），偏置仍用本层的
    pub(crate) fn forward_with_kernel(&self, x: &Var, kernel: &Var) -> Result<Var, GraphError> {
        let out = x.conv2d(kernel, self.stride, self.padding)?;
        match &self.bias {
            Some(bias) => out.try_add(bias),
            None => Ok(out),
        }
    }

    /// 获取卷积核参数
    pub const fn kernel(&self) -> &Var {
        &self.kernel
    }

    /// 获取偏置参数
    pub const fn bias(&self) -> Option<&Var> {
        self.bias.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Module for Conv2d {
    fn parameters(&self) -> Vec<Var> {
        std::iter::once(self.kernel.clone())
            .chain(self.bias.clone())
            .collect()
    }
}
