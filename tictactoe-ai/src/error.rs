//! 错误类型定义

use thiserror::Error;

/// 经验表持久化错误
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// IO 错误
    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 存储不可用
    #[error("storage unavailable: {reason}")]
    Unavailable { reason: String },

    /// 奖励不是有限值（JSON 无法表示）
    #[error("reward for {key} @ {index} would become {value}")]
    NonFiniteReward {
        key: String,
        index: usize,
        value: f64,
    },

    /// 打开时读取失败，为保护已有数据拒绝写入
    #[error("experience table could not be read ({reason}); refusing to overwrite it")]
    LoadFailed { reason: String },
}

impl PersistenceError {
    pub(crate) fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// 持久化操作结果类型
pub type Result<T> = std::result::Result<T, PersistenceError>;
