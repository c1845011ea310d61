//! 对局控制
//!
//! 包含模式选择、轮流落子、比分统计，以及人机模式下把终局结果反馈给 AI。

use serde::{Deserialize, Serialize};
use tictactoe_ai::{KeyValueStore, MoveSelector, PersistenceError};
use tictactoe_core::{Board, GameError, GameOutcome, Mark};
use tracing::{debug, info, warn};

/// 对局模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// 人机对战
    #[default]
    HumanVsComputer,
    /// 双人对战
    HumanVsHuman,
}

/// 比分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scoreboard {
    pub x_wins: u32,
    pub o_wins: u32,
    pub draws: u32,
}

impl Scoreboard {
    /// 记录一局结果，进行中的局面不计
    pub fn record(&mut self, outcome: GameOutcome) {
        match outcome {
            GameOutcome::Win(Mark::X) => self.x_wins += 1,
            GameOutcome::Win(Mark::O) => self.o_wins += 1,
            GameOutcome::Draw => self.draws += 1,
            GameOutcome::InProgress => {}
        }
    }

    /// 已结束的局数
    pub fn games_played(&self) -> u32 {
        self.x_wins + self.o_wins + self.draws
    }
}

/// 一次落子的结果
#[derive(Debug)]
pub struct Turn {
    /// 玩家落子位置
    pub player_move: usize,
    /// 玩家执子
    pub mark: Mark,
    /// 电脑应对（人机模式且对局未结束时）
    pub computer_move: Option<usize>,
    /// 落子后的局面结果
    pub outcome: GameOutcome,
    /// 经验表保存失败（不影响对局）
    pub learning_error: Option<PersistenceError>,
}

/// 一局井字棋
pub struct GameSession<S: KeyValueStore> {
    mode: GameMode,
    board: Board,
    current_turn: Mark,
    active: bool,
    scores: Scoreboard,
    selector: MoveSelector<S>,
    last_computer_move: Option<usize>,
}

impl<S: KeyValueStore> GameSession<S> {
    /// 创建对局，人机模式下若电脑执 X 会立即走第一步
    pub fn new(selector: MoveSelector<S>, mode: GameMode) -> Result<Self, GameError> {
        let mut session = Self {
            mode,
            board: Board::empty(),
            current_turn: Mark::X,
            active: true,
            scores: Scoreboard::default(),
            selector,
            last_computer_move: None,
        };
        session.reset()?;
        Ok(session)
    }

    /// 玩家落子
    pub fn play(&mut self, index: usize) -> Result<Turn, GameError> {
        if !self.active {
            return Err(GameError::GameOver);
        }

        // 玩家和电脑两步都在副本上完成后才提交
        let mark = self.current_turn;
        let mut board = self.board.with_move(index, mark)?;
        debug!("{} 落子 {}", mark, index);

        let mut computer_move = None;
        let mut next_turn = mark;
        if !board.outcome().is_finished() {
            match self.mode {
                GameMode::HumanVsComputer => {
                    let (reply, after) = self.computer_reply(&board)?;
                    computer_move = Some(reply);
                    board = after;
                }
                GameMode::HumanVsHuman => next_turn = mark.opponent(),
            }
        }

        self.board = board;
        self.current_turn = next_turn;
        if computer_move.is_some() {
            self.last_computer_move = computer_move;
        }

        let outcome = board.outcome();
        let learning_error = if outcome.is_finished() {
            self.finish(outcome)
        } else {
            None
        };

        Ok(Turn {
            player_move: index,
            mark,
            computer_move,
            outcome,
            learning_error,
        })
    }

    /// 重新开始（保留比分）
    pub fn reset(&mut self) -> Result<(), GameError> {
        self.board = Board::empty();
        self.current_turn = Mark::X;
        self.active = true;
        self.last_computer_move = None;
        self.selector.new_game();

        if self.mode == GameMode::HumanVsComputer && self.selector.computer() == Mark::X {
            let board = self.board;
            let (reply, after) = self.computer_reply(&board)?;
            self.board = after;
            self.current_turn = Mark::O;
            self.last_computer_move = Some(reply);
        }
        Ok(())
    }

    /// 切换模式并重新开始
    pub fn set_mode(&mut self, mode: GameMode) -> Result<(), GameError> {
        info!("切换模式: {:?}", mode);
        self.mode = mode;
        self.reset()
    }

    /// 电脑应对，返回落子位置和落子后的棋盘（不修改对局）
    fn computer_reply(&mut self, board: &Board) -> Result<(usize, Board), GameError> {
        let index = self.selector.choose_move(board)?;
        let after = board.with_move(index, self.selector.computer())?;
        Ok((index, after))
    }

    /// 终局：记分、结束对局、人机模式下反馈给 AI
    fn finish(&mut self, outcome: GameOutcome) -> Option<PersistenceError> {
        self.scores.record(outcome);
        self.active = false;
        info!("对局结束: {:?}", outcome);

        let computer_outcome = match self.mode {
            GameMode::HumanVsComputer => outcome.for_computer(self.selector.computer()),
            GameMode::HumanVsHuman => None,
        };

        match computer_outcome {
            Some(result) => match self.selector.report_outcome(result) {
                Ok(_) => None,
                Err(e) => {
                    warn!("经验保存失败: {}", e);
                    Some(e)
                }
            },
            None => {
                self.selector.new_game();
                None
            }
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// 当前轮到的一方
    pub fn current_turn(&self) -> Mark {
        self.current_turn
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn scores(&self) -> &Scoreboard {
        &self.scores
    }

    /// 电脑最近一次落子
    pub fn last_computer_move(&self) -> Option<usize> {
        self.last_computer_move
    }

    pub fn selector(&self) -> &MoveSelector<S> {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut MoveSelector<S> {
        &mut self.selector
    }

    pub fn into_selector(self) -> MoveSelector<S> {
        self.selector
    }
}
