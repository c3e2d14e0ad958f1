/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : 神经网络层（PyTorch 风格 API）
 */

mod conv2d;
mod conv_transpose2d;
mod instance_norm;
mod spectral_norm;

pub use conv2d::Conv2d;
pub use conv_transpose2d::ConvTranspose2d;
pub use instance_norm::InstanceNorm2d;
pub use spectral_norm::SpectralNorm;
