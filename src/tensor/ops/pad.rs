/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 反射填充（ReflectionPad2d）及其伴随
 *                 反射不含边界本身：[a b c d] 填充2得 [c b a b c d c b]
 */

use crate::errors::TensorError;
use crate::tensor::Tensor;

/// 填充后下标`i`（相对原图可为负）在原图中的来源下标
const fn reflect(i: isize, len: usize) -> usize {
    let n = len as isize;
    let r = if i < 0 {
        -i
    } else if i >= n {
        2 * (n - 1) - i
    } else {
        i
    };
    r as usize
}

fn planes(t: &Tensor, op: &'static str) -> Result<(usize, usize, usize), TensorError> {
    match *t.shape() {
        [n, c, h, w] => Ok((n * c, h, w)),
        _ => Err(TensorError::DimensionMismatch {
            op,
            expected: 4,
            got: t.dimension(),
        }),
    }
}

impl Tensor {
    /// 对 [batch, C, H, W] 的 H、W 两维各做`pad`宽的反射填充，要求`pad < H`且`pad < W`
    pub fn reflection_pad2d(&self, pad: usize) -> Result<Self, TensorError> {
        let (planes, h, w) = planes(self, "reflection_pad2d")?;
        if pad >= h || pad >= w {
            return Err(TensorError::InvalidConvolution(format!(
                "反射填充宽度 {pad} 必须小于图像尺寸 {h}x{w}"
            )));
        }
        let (ph, pw) = (h + 2 * pad, w + 2 * pad);
        let src = self.data_as_slice();
        let mut out = vec![0.0f32; planes * ph * pw];
        for p in 0..planes {
            for i in 0..ph {
                let si = reflect(i as isize - pad as isize, h);
                for j in 0..pw {
                    let sj = reflect(j as isize - pad as isize, w);
                    out[(p * ph + i) * pw + j] = src[(p * h + si) * w + sj];
                }
            }
        }
        let shape = self.shape();
        Self::from_vec(out, &[shape[0], shape[1], ph, pw])
    }

    /// `reflection_pad2d`的伴随：把填充区的梯度累加回各自的来源像素
    ///
    /// `self`为填充后形状的梯度 [batch, C, H+2p, W+2p]
    pub fn reflection_pad2d_backward(&self, pad: usize) -> Result<Self, TensorError> {
        let (planes, ph, pw) = planes(self, "reflection_pad2d_backward")?;
        if ph <= 3 * pad || pw <= 3 * pad {
            return Err(TensorError::InvalidConvolution(format!(
                "形状 {ph}x{pw} 不是宽度 {pad} 的合法反射填充结果"
            )));
        }
        let (h, w) = (ph - 2 * pad, pw - 2 * pad);
        let src = self.data_as_slice();
        let mut out = vec![0.0f32; planes * h * w];
        for p in 0..planes {
            for i in 0..ph {
                let si = reflect(i as isize - pad as isize, h);
                for j in 0..pw {
                    let sj = reflect(j as isize - pad as isize, w);
                    out[(p * h + si) * w + sj] += src[(p * ph + i) * pw + j];
                }
            }
        }
        let shape = self.shape();
        Self::from_vec(out, &[shape[0], shape[1], h, w])
    }
}
