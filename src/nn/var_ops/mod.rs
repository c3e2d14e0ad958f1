/*
 * @Author       : 老董
 * @Date         : 2026-10-18
 * @Description  : Var 的扩展运算 trait，按类别分组，需 import 对应 trait 后使用
 */

mod activation;
mod conv;
mod loss;
mod math;
mod reduce;
mod shape;

pub use activation::VarActivationOps;
pub use conv::VarConvOps;
pub use loss::VarLossOps;
pub use math::VarMathOps;
pub use reduce::VarReduceOps;
pub use shape::VarShapeOps;
