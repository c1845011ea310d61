//! 井字棋核心规则库
//!
//! 包含:
//! - 棋子标记、棋盘等核心数据结构
//! - 胜负判定（八条连线）
//! - 局面键（经验表索引）
//! - 规则错误类型

mod board;
mod constants;
mod error;
mod key;
mod mark;
mod outcome;

pub use board::Board;
pub use constants::*;
pub use error::{GameError, Result};
pub use key::StateKey;
pub use mark::Mark;
pub use outcome::{ComputerOutcome, GameOutcome};
