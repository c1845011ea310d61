//! 搜索引擎
//!
//! 对 3x3 博弈树做完整的 Minimax 搜索，可选 Alpha-Beta 剪枝。
//! 电脑方为最大化方，对手为最小化方。

use tictactoe_core::{Board, GameError, Mark, LINES};

/// 胜负基础分，实际得分为 `WIN_SCORE - depth`，越快赢分越高，越晚输扣分越少
pub const WIN_SCORE: i32 = 10;

/// 搜索引擎
pub struct SearchEngine {
    maximizer: Mark,
    pruning: bool,
    nodes_searched: u64,
}

impl SearchEngine {
    /// 创建搜索引擎，`maximizer` 为电脑执子
    pub fn new(maximizer: Mark) -> Self {
        Self {
            maximizer,
            pruning: true,
            nodes_searched: 0,
        }
    }

    /// 开关 Alpha-Beta 剪枝
    pub fn with_pruning(mut self, pruning: bool) -> Self {
        self.pruning = pruning;
        self
    }

    pub fn maximizer(&self) -> Mark {
        self.maximizer
    }

    pub fn minimizer(&self) -> Mark {
        self.maximizer.opponent()
    }

    /// 评估局面
    ///
    /// `maximizing` 表示轮到最大化方落子。每一层都在棋盘副本上落子，
    /// 传入的棋盘不会被修改。
    pub fn evaluate(&mut self, board: &Board, depth: i32, maximizing: bool) -> i32 {
        if self.pruning {
            self.alpha_beta(board, depth, i32::MIN, i32::MAX, maximizing)
        } else {
            self.minimax(board, depth, maximizing)
        }
    }

    /// 在 `index` 放下最大化方的子后评估局面（轮到对手）
    pub fn score_move(&mut self, board: &Board, index: usize) -> Result<i32, GameError> {
        let next = board.with_move(index, self.maximizer)?;
        Ok(self.evaluate(&next, 0, false))
    }

    /// 终局得分，未结束返回 None
    fn terminal_score(&self, board: &Board, depth: i32) -> Option<i32> {
        if board.has_line(self.maximizer) {
            Some(WIN_SCORE - depth)
        } else if board.has_line(self.minimizer()) {
            Some(depth - WIN_SCORE)
        } else if board.is_full() {
            Some(0)
        } else {
            None
        }
    }

    fn mover(&self, maximizing: bool) -> Mark {
        if maximizing {
            self.maximizer
        } else {
            self.minimizer()
        }
    }

    /// 不剪枝的 Minimax
    fn minimax(&mut self, board: &Board, depth: i32, maximizing: bool) -> i32 {
        self.nodes_searched += 1;

        if let Some(score) = self.terminal_score(board, depth) {
            return score;
        }

        let mark = self.mover(maximizing);
        let scores = board
            .empty_cells()
            .into_iter()
            .map(|index| self.minimax(&board.with_mark(index, mark), depth + 1, !maximizing))
            .collect::<Vec<_>>();

        let best = if maximizing {
            scores.into_iter().max()
        } else {
            scores.into_iter().min()
        };
        // 非终局必有空格
        best.unwrap_or(0)
    }

    /// Alpha-Beta 搜索（fail-soft），根节点使用全窗口时结果与 Minimax 一致
    fn alpha_beta(
        &mut self,
        board: &Board,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
    ) -> i32 {
        self.nodes_searched += 1;

        if let Some(score) = self.terminal_score(board, depth) {
            return score;
        }

        let mark = self.mover(maximizing);

        if maximizing {
            let mut best = i32::MIN;
            for index in board.empty_cells() {
                let child = board.with_mark(index, mark);
                let score = self.alpha_beta(&child, depth + 1, alpha, beta, false);
                best = best.max(score);
                alpha = alpha.max(score);
                if alpha >= beta {
                    break; // Beta 剪枝
                }
            }
            best
        } else {
            let mut best = i32::MAX;
            for index in board.empty_cells() {
                let child = board.with_mark(index, mark);
                let score = self.alpha_beta(&child, depth + 1, alpha, beta, true);
                best = best.min(score);
                beta = beta.min(score);
                if alpha >= beta {
                    break; // Alpha 剪枝
                }
            }
            best
        }
    }

    /// 获取搜索的节点数
    pub fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    /// 清零节点计数
    pub fn reset_stats(&mut self) {
        self.nodes_searched = 0;
    }
}

/// `mark` 落下即可连成一线的所有空格（升序）
pub fn winning_moves(board: &Board, mark: Mark) -> impl Iterator<Item = usize> + '_ {
    board
        .empty_cells()
        .into_iter()
        .filter(move |&index| completes_line(board, index, mark))
}

/// 立即获胜的走法，多个时取索引最小者
pub fn immediate_winning_move(board: &Board, mark: Mark) -> Option<usize> {
    winning_moves(board, mark).next()
}

fn completes_line(board: &Board, index: usize, mark: Mark) -> bool {
    LINES.iter().filter(|line| line.contains(&index)).any(|line| {
        line.iter()
            .all(|&cell| cell == index || board.get(cell) == Some(mark))
    })
}
