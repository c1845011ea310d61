//! 棋盘状态

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_WIDTH, CELL_COUNT, EMPTY_CHAR, LINES};
use crate::error::{GameError, Result};
use crate::key::StateKey;
use crate::mark::Mark;
use crate::outcome::GameOutcome;

/// 棋盘
///
/// 3x3 棋盘，索引为 `row * 3 + col`，左上角为 0。
/// 棋盘很小，实现了 `Copy`，搜索时每层直接复制一份。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [Option<Mark>; CELL_COUNT],
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            cells: [None; CELL_COUNT],
        }
    }

    /// 从格子数组创建
    pub fn from_cells(cells: [Option<Mark>; CELL_COUNT]) -> Self {
        Self { cells }
    }

    /// 获取所有格子
    pub fn cells(&self) -> &[Option<Mark>; CELL_COUNT] {
        &self.cells
    }

    /// 获取指定格子的标记，越界返回 None
    pub fn get(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    /// 设置指定格子（不检查规则）
    pub fn set(&mut self, index: usize, mark: Option<Mark>) {
        if index < CELL_COUNT {
            self.cells[index] = mark;
        }
    }

    /// 检查落子是否合法
    pub fn validate_move(&self, index: usize) -> Result<()> {
        if index >= CELL_COUNT {
            return Err(GameError::OutOfRange { index });
        }
        if self.cells[index].is_some() {
            return Err(GameError::Occupied { index });
        }
        Ok(())
    }

    /// 落子
    pub fn place(&mut self, index: usize, mark: Mark) -> Result<()> {
        self.validate_move(index)?;
        self.cells[index] = Some(mark);
        Ok(())
    }

    /// 返回落子后的新棋盘，原棋盘不变
    pub fn with_move(&self, index: usize, mark: Mark) -> Result<Board> {
        let mut next = *self;
        next.place(index, mark)?;
        Ok(next)
    }

    /// 返回在空格落子后的新棋盘（不检查规则，调用方保证 `index` 为空格）
    pub fn with_mark(&self, index: usize, mark: Mark) -> Board {
        let mut next = *self;
        next.set(index, Some(mark));
        next
    }

    /// 所有空格索引（升序）
    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    /// 棋盘是否已满
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// 是否为空棋盘
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// 指定标记的数量
    pub fn count(&self, mark: Mark) -> usize {
        self.cells.iter().filter(|cell| **cell == Some(mark)).count()
    }

    /// 指定方是否已连成一线
    pub fn has_line(&self, mark: Mark) -> bool {
        LINES
            .iter()
            .any(|line| line.iter().all(|&index| self.cells[index] == Some(mark)))
    }

    /// 查找连成一线的一方
    pub fn winner(&self) -> Option<Mark> {
        [Mark::X, Mark::O].into_iter().find(|&mark| self.has_line(mark))
    }

    /// 当前局面结果
    pub fn outcome(&self) -> GameOutcome {
        match self.winner() {
            Some(mark) => GameOutcome::Win(mark),
            None if self.is_full() => GameOutcome::Draw,
            None => GameOutcome::InProgress,
        }
    }

    /// 生成局面键
    pub fn state_key(&self) -> StateKey {
        StateKey::from_board(self)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, cells) in self.cells.chunks(BOARD_WIDTH).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for cell in cells {
                let c = cell.map(|mark| mark.to_char()).unwrap_or(EMPTY_CHAR);
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board() {
        let board = Board::empty();
        assert!(board.is_empty());
        assert!(!board.is_full());
        assert_eq!(board.empty_cells(), (0..9).collect::<Vec<_>>());
        assert_eq!(board.outcome(), GameOutcome::InProgress);
    }

    #[test]
    fn test_place_rejects_invalid_moves() {
        let mut board = Board::empty();
        board.place(4, Mark::X).unwrap();

        assert_eq!(board.place(4, Mark::O), Err(GameError::Occupied { index: 4 }));
        assert_eq!(board.place(9, Mark::O), Err(GameError::OutOfRange { index: 9 }));
        assert!(board.place(9, Mark::O).unwrap_err().is_invalid_move());

        // 失败的落子不改变棋盘
        assert_eq!(board.get(4), Some(Mark::X));
        assert_eq!(board.count(Mark::O), 0);
    }

    #[test]
    fn test_with_move_leaves_original_untouched() {
        let board = Board::empty();
        let next = board.with_move(0, Mark::X).unwrap();

        assert!(board.is_empty());
        assert_eq!(next.get(0), Some(Mark::X));
    }

    #[test]
    fn test_every_line_wins() {
        for line in LINES {
            let mut board = Board::empty();
            for index in line {
                board.set(index, Some(Mark::O));
            }
            assert!(board.has_line(Mark::O), "line {:?}", line);
            assert!(!board.has_line(Mark::X));
            assert_eq!(board.outcome(), GameOutcome::Win(Mark::O));
        }
    }

    #[test]
    fn test_full_board_draw() {
        // X O X
        // X O O
        // O X X
        let board: Board = "XOXXOOOXX".parse().unwrap();
        assert!(board.is_full());
        assert_eq!(board.winner(), None);
        assert_eq!(board.outcome(), GameOutcome::Draw);
    }

    #[test]
    fn test_display() {
        let board: Board = "X---O---X".parse().unwrap();
        assert_eq!(board.to_string(), "X--\n-O-\n--X");
    }
}
