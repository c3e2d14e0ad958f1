use serde::Serialize;

/// 对外报告的损失名称，顺序固定
pub const LOSS_NAMES: [&str; 8] = [
    "D_A", "G_A", "cycle_A", "idt_A", "D_B", "G_B", "cycle_B", "idt_B",
];

/// 最近一个训练步的全部损失标量
///
/// 每步覆盖；未启用的项（恒等损失、梯度惩罚）为0
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LossRecord {
    #[serde(rename = "D_A")]
    pub d_a: f32,
    #[serde(rename = "G_A")]
    pub g_a: f32,
    #[serde(rename = "cycle_A")]
    pub cycle_a: f32,
    #[serde(rename = "idt_A")]
    pub idt_a: f32,
    #[serde(rename = "D_B")]
    pub d_b: f32,
    #[serde(rename = "G_B")]
    pub g_b: f32,
    #[serde(rename = "cycle_B")]
    pub cycle_b: f32,
    #[serde(rename = "idt_B")]
    pub idt_b: f32,
    /// 生成器总损失
    #[serde(rename = "G")]
    pub g: f32,
    pub mode_seeking: f32,
    #[serde(rename = "gradient_penalty_A")]
    pub gradient_penalty_a: f32,
    #[serde(rename = "gradient_penalty_B")]
    pub gradient_penalty_b: f32,
}

impl LossRecord {
    /// 按名称取值，名称包括`LOSS_NAMES`与`G`、`mode_seeking`、`gradient_penalty_A/B`
    pub fn get(&self, name: &str) -> Option<f32> {
        Some(match name {
            "D_A" => self.d_a,
            "G_A" => self.g_a,
            "cycle_A" => self.cycle_a,
            "idt_A" => self.idt_a,
            "D_B" => self.d_b,
            "G_B" => self.g_b,
            "cycle_B" => self.cycle_b,
            "idt_B" => self.idt_b,
            "G" => self.g,
            "mode_seeking" => self.mode_seeking,
            "gradient_penalty_A" => self.gradient_penalty_a,
            "gradient_penalty_B" => self.gradient_penalty_b,
            _ => return None,
        })
    }

    /// `LOSS_NAMES`顺序的 (名称, 值)
    pub fn named(&self) -> Vec<(&'static str, f32)> {
        LOSS_NAMES
            .iter()
            .filter_map(|&name| self.get(name).map(|v| (name, v)))
            .collect()
    }

    pub fn is_finite(&self) -> bool {
        [
            self.d_a,
            self.g_a,
            self.cycle_a,
            self.idt_a,
            self.d_b,
            self.g_b,
            self.cycle_b,
            self.idt_b,
            self.g,
            self.mode_seeking,
            self.gradient_penalty_a,
            self.gradient_penalty_b,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}
