//! 对局结果

use serde::{Deserialize, Serialize};

use crate::mark::Mark;

/// 由棋盘判定的对局结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    /// 一方连成一线
    Win(Mark),
    /// 棋盘已满且无人连线
    Draw,
    /// 对局进行中
    InProgress,
}

impl GameOutcome {
    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        !matches!(self, GameOutcome::InProgress)
    }

    /// 从电脑方的角度解读结果，进行中返回 None
    pub fn for_computer(&self, computer: Mark) -> Option<ComputerOutcome> {
        match self {
            GameOutcome::Win(mark) if *mark == computer => Some(ComputerOutcome::Win),
            GameOutcome::Win(_) => Some(ComputerOutcome::Loss),
            GameOutcome::Draw => Some(ComputerOutcome::Draw),
            GameOutcome::InProgress => None,
        }
    }
}

/// 电脑方视角的终局结果，用于学习反馈
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputerOutcome {
    Win,
    Loss,
    Draw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_computer() {
        assert_eq!(
            GameOutcome::Win(Mark::O).for_computer(Mark::O),
            Some(ComputerOutcome::Win)
        );
        assert_eq!(
            GameOutcome::Win(Mark::X).for_computer(Mark::O),
            Some(ComputerOutcome::Loss)
        );
        assert_eq!(
            GameOutcome::Draw.for_computer(Mark::O),
            Some(ComputerOutcome::Draw)
        );
        assert_eq!(GameOutcome::InProgress.for_computer(Mark::O), None);
        assert!(!GameOutcome::InProgress.is_finished());
    }
}
