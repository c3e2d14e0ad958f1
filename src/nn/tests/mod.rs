mod criterion;
mod layer;
mod optimizer;

use crate::nn::{Graph, GraphError, Var};
use crate::tensor::Tensor;

/// 用中心差分数值地校验`f`对输入的梯度（f 输出须为标量）
pub(super) fn check_gradient<F>(input: &Tensor, f: F, tolerance: f32)
where
    F: Fn(&Var) -> Result<Var, GraphError>,
{
    let graph = Graph::new_with_seed(0);
    let x = graph.input_requiring_grad(input);
    f(&x).unwrap().backward().unwrap();
    let analytic = x.grad().unwrap();

    let h = 1e-2;
    let data = input.data_as_slice().to_vec();
    for i in 0..data.len() {
        let eval = |delta: f32| {
            let mut shifted = data.clone();
            shifted[i] += delta;
            let shifted = Tensor::new(&shifted, input.shape());
            f(&graph.input(&shifted)).unwrap().item().unwrap()
        };
        let numeric = (eval(h) - eval(-h)) / (2.0 * h);
        let got = analytic.data_as_slice()[i];
        assert!(
            (numeric - got).abs() <= tolerance * (1.0 + numeric.abs()),
            "第{i}个元素梯度不符：数值{numeric}，解析{got}"
        );
    }
}
