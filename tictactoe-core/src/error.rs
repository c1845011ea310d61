//! 错误类型定义

use thiserror::Error;

use crate::constants::CELL_COUNT;

/// 井字棋规则错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    /// 格子索引越界
    #[error("Invalid move: cell {index} is out of range (0..{max})", max = CELL_COUNT)]
    OutOfRange { index: usize },

    /// 格子已被占用
    #[error("Invalid move: cell {index} is already occupied")]
    Occupied { index: usize },

    /// 没有可走的格子
    #[error("No legal move available")]
    NoLegalMove,

    /// 游戏已结束
    #[error("Game is already over")]
    GameOver,

    /// 无效的局面键
    #[error("Invalid state key: {reason}")]
    InvalidKey { reason: String },
}

impl GameError {
    /// 是否为非法落子（越界或占用）
    pub fn is_invalid_move(&self) -> bool {
        matches!(self, GameError::OutOfRange { .. } | GameError::Occupied { .. })
    }
}

/// 规则操作结果类型
pub type Result<T> = std::result::Result<T, GameError>;
