//! Error taxonomy / 错误类型定义
//!
//! Three failure families cross module boundaries: catalog loading, config
//! loading and outbound sending. Rate limiting is NOT an error; it is a
//! control-flow outcome carried by `limiter::GateDecision`.

use thiserror::Error;

/// Catalog source failure. Fatal to the reload that triggered it; the store
/// keeps serving the previous snapshot. / 资源目录加载失败
#[derive(Debug, Error)]
pub enum LoadError {
    /// Catalog file does not exist / 目录文件不存在
    #[error("目录文件不存在: {0}")]
    NotFound(String),
    /// I/O failure while reading the source / 读取失败
    #[error("目录读取失败: {0}")]
    Io(#[from] std::io::Error),
    /// Source content could not be parsed into rows / 解析失败
    #[error("目录解析失败: {0}")]
    Parse(String),
}

/// Config file failure. Only surfaced when an explicit path was given;
/// the default loader falls back to defaults instead. / 配置文件错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置文件读取失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("配置文件解析失败: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Per-message transport failure. Logged and skipped, never aborts the
/// remaining batches of a reply. / 消息发送失败
#[derive(Debug, Error)]
#[error("发送到 {channel_id} 失败: {reason}")]
pub struct SendError {
    pub channel_id: String,
    pub reason: String,
}

impl SendError {
    pub fn new(channel_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            reason: reason.into(),
        }
    }
}
