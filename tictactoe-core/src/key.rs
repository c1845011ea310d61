//! 局面键
//!
//! 按索引顺序把每个格子写成一个字符：`X`、`O`，空格为 `-`。
//! 例如空棋盘为 `---------`，中心有 X 为 `----X----`。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::constants::{CELL_COUNT, EMPTY_CHAR};
use crate::error::GameError;
use crate::mark::Mark;

/// 局面键，经验表的主索引
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    /// 从棋盘生成
    pub fn from_board(board: &Board) -> Self {
        let key = board
            .cells()
            .iter()
            .map(|cell| cell.map(|mark| mark.to_char()).unwrap_or(EMPTY_CHAR))
            .collect();
        Self(key)
    }

    /// 键字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 还原为棋盘
    pub fn to_board(&self) -> Result<Board, GameError> {
        self.0.parse()
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Board> for StateKey {
    fn from(board: &Board) -> Self {
        Self::from_board(board)
    }
}

impl FromStr for StateKey {
    type Err = GameError;

    /// 解析并规范化局面键（小写标记会被转为大写）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let board: Board = s.parse()?;
        Ok(board.state_key())
    }
}

impl FromStr for Board {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.trim().chars().collect();
        if chars.len() != CELL_COUNT {
            return Err(GameError::InvalidKey {
                reason: format!("expected {} cells, got {}", CELL_COUNT, chars.len()),
            });
        }

        let mut cells = [None; CELL_COUNT];
        for (index, c) in chars.into_iter().enumerate() {
            cells[index] = match c {
                EMPTY_CHAR => None,
                c => Some(Mark::from_char(c).ok_or_else(|| GameError::InvalidKey {
                    reason: format!("invalid character '{}' at {}", c, index),
                })?),
            };
        }
        Ok(Board::from_cells(cells))
    }
}
