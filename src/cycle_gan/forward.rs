use crate::networks::ImageNetwork;
use crate::nn::{GraphError, Var};

/// 一次前向得到的全部派生图像，只在当前训练步内有效
///
/// 命名沿用代码习惯：G_A 把 A 域翻译到 B 域，G_B 反之
#[derive(Debug, Clone)]
pub struct DerivedImages {
    /// G_A(real_A)
    pub fake_b: Var,
    /// G_B(fake_B)
    pub rec_a: Var,
    /// G_B(real_B)
    pub fake_a: Var,
    /// G_A(fake_A)
    pub rec_b: Var,
    /// G_A(real_B)，仅在使用恒等损失时生成
    pub idt_a: Option<Var>,
    /// G_B(real_A)，仅在使用恒等损失时生成
    pub idt_b: Option<Var>,
}

/// 生成所有派生图像，除此之外没有副作用
pub fn forward_pass(
    g_a: &dyn ImageNetwork,
    g_b: &dyn ImageNetwork,
    real_a: &Var,
    real_b: &Var,
    with_identity: bool,
) -> Result<DerivedImages, GraphError> {
    let fake_b = g_a.forward(real_a)?;
    let rec_a = g_b.forward(&fake_b)?;
    let fake_a = g_b.forward(real_b)?;
    let rec_b = g_a.forward(&fake_a)?;

    let (idt_a, idt_b) = if with_identity {
        (Some(g_a.forward(real_b)?), Some(g_b.forward(real_a)?))
    } else {
        (None, None)
    };

    Ok(DerivedImages {
        fake_b,
        rec_a,
        fake_a,
        rec_b,
        idt_a,
        idt_b,
    })
}
