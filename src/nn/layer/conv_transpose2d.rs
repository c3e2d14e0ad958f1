/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : ConvTranspose2d (2D 转置卷积) 层，用于生成器上采样
 *
 * 输出尺寸：H_out = (H - 1) * stride - 2 * padding + kernel + output_padding
 */

use crate::nn::{Graph, GraphError, Init, Module, Var, VarConvOps};

/// ConvTranspose2d 层，卷积核形状沿用 PyTorch：[in_channels, out_channels, kH, kW]
pub struct ConvTranspose2d {
    kernel: Var,
    bias: Option<Var>,
    stride: (usize, usize),
    padding: (usize, usize),
    output_padding: (usize, usize),
}

impl ConvTranspose2d {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: &Graph,
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize),
        stride: (usize, usize),
        padding: (usize, usize),
        output_padding: (usize, usize),
        use_bias: bool,
        init: &Init,
        name: &str,
    ) -> Result<Self, GraphError> {
        if output_padding.0 >= stride.0 || output_padding.1 >= stride.1 {
            return Err(GraphError::InvalidOperation(format!(
                "{name}: output_padding {output_padding:?} 必须小于 stride {stride:?}"
            )));
        }
        let kernel = graph.parameter(
            &[in_channels, out_channels, kernel_size.0, kernel_size.1],
            init,
            &format!("{name}_K"),
        );
        let bias = use_bias
            .then(|| graph.parameter(&[1, out_channels, 1, 1], &Init::Zeros, &format!("{name}_b")));
        Ok(Self {
            kernel,
            bias,
            stride,
            padding,
            output_padding,
        })
    }

    /// 输入空间尺寸对应的输出空间尺寸
    pub fn output_hw(&self, input_hw: (usize, usize)) -> Result<(usize, usize), GraphError> {
        let kernel_shape = self.kernel.shape();
        let axis = |len: usize, stride: usize, pad: usize, k: usize, extra: usize| {
            ((len.max(1) - 1) * stride + k + extra)
                .checked_sub(2 * pad)
                .filter(|&out| out > 0)
        };
        let h = axis(input_hw.0, self.stride.0, self.padding.0, kernel_shape[2], self.output_padding.0);
        let w = axis(input_hw.1, self.stride.1, self.padding.1, kernel_shape[3], self.output_padding.1);
        h.zip(w).ok_or_else(|| {
            GraphError::InvalidOperation(format!("转置卷积输入尺寸{input_hw:?}过小"))
        })
    }

    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let shape = x.shape();
        let [_, _, h, w] = shape[..] else {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: shape,
                message: "ConvTranspose2d 的输入须为 [batch, C, H, W]".to_string(),
            });
        };
        let output_hw = self.output_hw((h, w))?;
        let out = x.conv_transpose2d(&self.kernel, self.stride, self.padding, output_hw)?;
        match &self.bias {
            Some(bias) => out.try_add(bias),
            None => Ok(out),
        }
    }
}

impl Module for ConvTranspose2d {
    fn parameters(&self) -> Vec<Var> {
        std::iter::once(self.kernel.clone())
            .chain(self.bias.clone())
            .collect()
    }
}
