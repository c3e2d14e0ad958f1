/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 2D 卷积相关的张量内核（im2col + 矩阵乘法），使用 Rayon 在 batch 维度并行
 *
 * 三个内核构成一个对偶闭包，计算图里卷积的任意阶导数都只需要它们：
 * - conv2d(x, K)                  : 前向卷积
 * - conv_transpose2d(g, K)        : conv2d 对输入 x 的伴随（即转置卷积）
 * - conv2d_weight_grad(x, g)      : conv2d 对卷积核 K 的伴随
 *
 * 约定：
 * - 输入/输出均为 Batch-First 的 4D [batch, C, H, W]
 * - 卷积核为 [C_out, C_in, kH, kW]
 * - 零填充
 */

use crate::errors::TensorError;
use crate::tensor::Tensor;
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

fn dims4(t: &Tensor, what: &'static str) -> Result<[usize; 4], TensorError> {
    match *t.shape() {
        [a, b, c, d] => Ok([a, b, c, d]),
        _ => Err(TensorError::DimensionMismatch {
            op: what,
            expected: 4,
            got: t.dimension(),
        }),
    }
}

/// 计算卷积输出尺寸：H' = (H + 2*pH - kH) / sH + 1
pub(crate) fn conv_output_hw(
    input_hw: (usize, usize),
    kernel_hw: (usize, usize),
    stride: (usize, usize),
    padding: (usize, usize),
) -> Result<(usize, usize), TensorError> {
    let (h, w) = input_hw;
    let (kh, kw) = kernel_hw;
    let (sh, sw) = stride;
    let (ph, pw) = padding;
    if sh == 0 || sw == 0 {
        return Err(TensorError::InvalidConvolution("步长不能为0".to_string()));
    }
    if h + 2 * ph < kh || w + 2 * pw < kw {
        return Err(TensorError::InvalidConvolution(format!(
            "输入 {h}x{w}（填充 {padding:?}）小于卷积核 {kh}x{kw}"
        )));
    }
    Ok(((h + 2 * ph - kh) / sh + 1, (w + 2 * pw - kw) / sw + 1))
}

/// 单个卷积的几何信息
#[derive(Clone, Copy)]
struct Geometry {
    c: usize,
    h: usize,
    w: usize,
    kh: usize,
    kw: usize,
    sh: usize,
    sw: usize,
    ph: usize,
    pw: usize,
    ho: usize,
    wo: usize,
}

impl Geometry {
    const fn rows(&self) -> usize {
        self.c * self.kh * self.kw
    }

    const fn cols(&self) -> usize {
        self.ho * self.wo
    }

    const fn sample_len(&self) -> usize {
        self.c * self.h * self.w
    }

    /// 输出位置 (oi, oj) 在核偏移 (ki, kj) 下对应的输入坐标，落在填充区则为 None
    fn source(&self, oi: usize, oj: usize, ki: usize, kj: usize) -> Option<(usize, usize)> {
        let ii = (oi * self.sh + ki).checked_sub(self.ph)?;
        let jj = (oj * self.sw + kj).checked_sub(self.pw)?;
        (ii < self.h && jj < self.w).then_some((ii, jj))
    }
}

/// 单个样本 [C, H, W] 展开为 [C*kH*kW, H'*W']
fn im2col(sample: &[f32], geo: &Geometry) -> Result<Array2<f32>, TensorError> {
    let n_cols = geo.cols();
    let mut cols = vec![0.0f32; geo.rows() * n_cols];
    for ci in 0..geo.c {
        for ki in 0..geo.kh {
            for kj in 0..geo.kw {
                let row = (ci * geo.kh + ki) * geo.kw + kj;
                let row_off = row * n_cols;
                for oi in 0..geo.ho {
                    for oj in 0..geo.wo {
                        if let Some((ii, jj)) = geo.source(oi, oj, ki, kj) {
                            cols[row_off + oi * geo.wo + oj] = sample[(ci * geo.h + ii) * geo.w + jj];
                        }
                    }
                }
            }
        }
    }
    Array2::from_shape_vec((geo.rows(), n_cols), cols)
        .map_err(|e| TensorError::InvalidConvolution(e.to_string()))
}

/// im2col 的伴随：把 [C*kH*kW, H'*W'] 累加回 [C, H, W]
fn col2im(cols: &Array2<f32>, geo: &Geometry) -> Vec<f32> {
    let mut sample = vec![0.0f32; geo.sample_len()];
    for ci in 0..geo.c {
        for ki in 0..geo.kh {
            for kj in 0..geo.kw {
                let row = cols.row((ci * geo.kh + ki) * geo.kw + kj);
                for oi in 0..geo.ho {
                    for oj in 0..geo.wo {
                        if let Some((ii, jj)) = geo.source(oi, oj, ki, kj) {
                            sample[(ci * geo.h + ii) * geo.w + jj] += row[oi * geo.wo + oj];
                        }
                    }
                }
            }
        }
    }
    sample
}

fn kernel_matrix(kernel: &Tensor, rows: usize, cols: usize) -> Result<ArrayView2<'_, f32>, TensorError> {
    ArrayView2::from_shape((rows, cols), kernel.data_as_slice())
        .map_err(|e| TensorError::InvalidConvolution(e.to_string()))
}

impl Tensor {
    /// 2D 卷积
    ///
    /// - `self`: 输入 [batch, C_in, H, W]
    /// - `kernel`: [C_out, C_in, kH, kW]
    /// - 返回 [batch, C_out, H', W']
    pub fn conv2d(
        &self,
        kernel: &Self,
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Self, TensorError> {
        let [n, c, h, w] = dims4(self, "conv2d 输入")?;
        let [o, kc, kh, kw] = dims4(kernel, "conv2d 卷积核")?;
        if kc != c {
            return Err(TensorError::InvalidConvolution(format!(
                "输入通道数 {c} 与卷积核输入通道数 {kc} 不匹配"
            )));
        }
        let (ho, wo) = conv_output_hw((h, w), (kh, kw), stride, padding)?;
        let geo = Geometry {
            c,
            h,
            w,
            kh,
            kw,
            sh: stride.0,
            sw: stride.1,
            ph: padding.0,
            pw: padding.1,
            ho,
            wo,
        };
        let w_mat = kernel_matrix(kernel, o, geo.rows())?;
        let x = self.data_as_slice();

        let outputs: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|ni| {
                let sample = &x[ni * geo.sample_len()..(ni + 1) * geo.sample_len()];
                let cols = im2col(sample, &geo)?;
                Ok(w_mat.dot(&cols).iter().copied().collect())
            })
            .collect::<Result<_, TensorError>>()?;

        Self::from_vec(outputs.concat(), &[n, o, ho, wo])
    }

    /// 转置卷积：conv2d 关于输入的伴随
    ///
    /// - `self`: [batch, C_out, H', W']
    /// - `kernel`: [C_out, C_in, kH, kW]
    /// - `output_hw`: 目标 (H, W)，需满足以其做 conv2d 恰好得到 (H', W')
    /// - 返回 [batch, C_in, H, W]
    pub fn conv_transpose2d(
        &self,
        kernel: &Self,
        stride: (usize, usize),
        padding: (usize, usize),
        output_hw: (usize, usize),
    ) -> Result<Self, TensorError> {
        let [n, go, gh, gw] = dims4(self, "conv_transpose2d 输入")?;
        let [o, c, kh, kw] = dims4(kernel, "conv_transpose2d 卷积核")?;
        if go != o {
            return Err(TensorError::InvalidConvolution(format!(
                "输入通道数 {go} 与卷积核输出通道数 {o} 不匹配"
            )));
        }
        let (h, w) = output_hw;
        let (ho, wo) = conv_output_hw((h, w), (kh, kw), stride, padding)?;
        if (ho, wo) != (gh, gw) {
            return Err(TensorError::InvalidConvolution(format!(
                "目标尺寸 {h}x{w} 卷积后为 {ho}x{wo}，与输入 {gh}x{gw} 不符"
            )));
        }
        let geo = Geometry {
            c,
            h,
            w,
            kh,
            kw,
            sh: stride.0,
            sw: stride.1,
            ph: padding.0,
            pw: padding.1,
            ho,
            wo,
        };
        let w_t = kernel_matrix(kernel, o, geo.rows())?.reversed_axes();
        let g = self.data_as_slice();
        let g_len = o * geo.cols();

        let outputs: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|ni| {
                let g_n = ArrayView2::from_shape((o, geo.cols()), &g[ni * g_len..(ni + 1) * g_len])
                    .map_err(|e| TensorError::InvalidConvolution(e.to_string()))?;
                Ok(col2im(&w_t.dot(&g_n), &geo))
            })
            .collect::<Result<_, TensorError>>()?;

        Self::from_vec(outputs.concat(), &[n, c, h, w])
    }

    /// conv2d 关于卷积核的伴随
    ///
    /// - `self`: 卷积输入 x [batch, C_in, H, W]
    /// - `grad_output`: [batch, C_out, H', W']
    /// - 返回 [C_out, C_in, kH, kW]
    pub fn conv2d_weight_grad(
        &self,
        grad_output: &Self,
        kernel_hw: (usize, usize),
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Self, TensorError> {
        let [n, c, h, w] = dims4(self, "conv2d_weight_grad 输入")?;
        let [gn, o, gh, gw] = dims4(grad_output, "conv2d_weight_grad 上游梯度")?;
        let (kh, kw) = kernel_hw;
        let (ho, wo) = conv_output_hw((h, w), kernel_hw, stride, padding)?;
        if gn != n || (ho, wo) != (gh, gw) {
            return Err(TensorError::InvalidConvolution(format!(
                "上游梯度形状 {:?} 与输入 {:?} 的卷积输出不符",
                grad_output.shape(),
                self.shape()
            )));
        }
        let geo = Geometry {
            c,
            h,
            w,
            kh,
            kw,
            sh: stride.0,
            sw: stride.1,
            ph: padding.0,
            pw: padding.1,
            ho,
            wo,
        };
        let x = self.data_as_slice();
        let g = grad_output.data_as_slice();
        let g_len = o * geo.cols();

        let partials: Vec<Array2<f32>> = (0..n)
            .into_par_iter()
            .map(|ni| {
                let sample = &x[ni * geo.sample_len()..(ni + 1) * geo.sample_len()];
                let cols = im2col(sample, &geo)?;
                let g_n = ArrayView2::from_shape((o, geo.cols()), &g[ni * g_len..(ni + 1) * g_len])
                    .map_err(|e| TensorError::InvalidConvolution(e.to_string()))?;
                Ok(g_n.dot(&cols.t()))
            })
            .collect::<Result<_, TensorError>>()?;

        let mut total = Array2::<f32>::zeros((o, geo.rows()));
        for partial in &partials {
            total = total + partial;
        }
        Self::from_vec(total.iter().copied().collect(), &[o, c, kh, kw])
    }
}
