mod activation;
mod arith;
mod conv;
mod math;
mod pad;
mod reduce;

pub(crate) use activation::{LeakyRelu, Sigmoid, Tanh};
pub(crate) use arith::{Add, AddScalar, Divide, Multiply, PowScalar, Scale, Subtract};
pub(crate) use conv::{Conv2d, Conv2dWeightGrad, ConvTranspose2d};
pub(crate) use math::{Abs, Clamp, Exp, Ln, SafeReciprocal, Sqrt};
pub(crate) use pad::{ReflectionPad2d, ReflectionPad2dBackward};
pub(crate) use reduce::{BroadcastTo, Mean, Reshape, Sum, SumTo};
