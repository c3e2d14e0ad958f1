use thiserror::Error;

/// 配置错误：读取/解析配置，或配置项本身不合法
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("读取配置文件失败：{0}")]
    Io(#[from] std::io::Error),
    #[error("解析配置失败：{0}")]
    Json(#[from] serde_json::Error),
    /// 多个互斥的选项被同时开启
    #[error("配置冲突：{0}")]
    Conflict(String),
    #[error("配置项无效：{0}")]
    Invalid(String),
    /// 合法但本库尚未实现的取值（如 batch norm、U-Net）
    #[error("不支持的配置：{0}")]
    Unsupported(String),
}
