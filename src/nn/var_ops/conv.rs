use crate::nn::nodes::{Conv2d, Conv2dWeightGrad, ConvTranspose2d};
use crate::nn::{GraphError, Var};

/// 卷积扩展 trait（零填充，NCHW）
pub trait VarConvOps {
    /// 2D 卷积：self [N, C_in, H, W]，kernel [C_out, C_in, kH, kW]
    fn conv2d(&self, kernel: &Var, stride: (usize, usize), padding: (usize, usize)) -> Result<Var, GraphError>;

    /// 转置卷积：self [N, C_out, H', W']，kernel [C_out, C_in, kH, kW]，输出 [N, C_in, output_hw]
    fn conv_transpose2d(
        &self,
        kernel: &Var,
        stride: (usize, usize),
        padding: (usize, usize),
        output_hw: (usize, usize),
    ) -> Result<Var, GraphError>;

    /// 卷积对核的梯度：self 为卷积输入，`grad_output`为卷积输出的梯度
    fn conv2d_weight_grad(
        &self,
        grad_output: &Var,
        kernel_hw: (usize, usize),
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Var, GraphError>;
}

impl VarConvOps for Var {
    fn conv2d(&self, kernel: &Var, stride: (usize, usize), padding: (usize, usize)) -> Result<Var, GraphError> {
        Self::from_op(Conv2d { stride, padding }, &[self, kernel])
    }

    fn conv_transpose2d(
        &self,
        kernel: &Var,
        stride: (usize, usize),
        padding: (usize, usize),
        output_hw: (usize, usize),
    ) -> Result<Var, GraphError> {
        Self::from_op(
            ConvTranspose2d {
                stride,
                padding,
                output_hw,
            },
            &[self, kernel],
        )
    }

    fn conv2d_weight_grad(
        &self,
        grad_output: &Var,
        kernel_hw: (usize, usize),
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Var, GraphError> {
        Self::from_op(
            Conv2dWeightGrad {
                kernel_hw,
                stride,
                padding,
            },
            &[self, grad_output],
        )
    }
}
