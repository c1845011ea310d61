//! 走法选择器
//!
//! 选择顺序：
//! 1. 能立即获胜就直接走
//! 2. 对手下一步能赢就堵住
//! 3. 其余按搜索得分排序，得分相同时看经验偏好，再按中心、角、边的顺序
//!
//! 对局结束后根据结果更新本局电脑走过的每一步。

use std::cmp::Ordering;

use tictactoe_core::{Board, ComputerOutcome, GameError, Mark, StateKey, CENTER, CORNERS};
use tracing::{debug, info, warn};

use crate::config::SelectorConfig;
use crate::error::PersistenceError;
use crate::experience::{Bias, ExperienceStore};
use crate::search::{winning_moves, SearchEngine};
use crate::storage::KeyValueStore;

/// 本局电脑走过的一步：落子前的局面键和走法
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub key: StateKey,
    pub index: usize,
}

/// 候选走法
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub index: usize,
    /// 搜索得分
    pub score: i32,
    /// 经验偏好
    pub bias: Bias,
}

/// 走法选择的依据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Win,
    Block,
    Search,
}

/// 走法选择器
pub struct MoveSelector<S: KeyValueStore> {
    config: SelectorConfig,
    search: SearchEngine,
    store: ExperienceStore<S>,
    history: Vec<HistoryEntry>,
}

impl<S: KeyValueStore> MoveSelector<S> {
    /// 创建选择器，经验存储由调用方打开后注入
    pub fn new(store: ExperienceStore<S>, config: SelectorConfig) -> Self {
        let search = SearchEngine::new(config.computer).with_pruning(config.pruning);
        Self {
            config,
            search,
            store,
            history: Vec::new(),
        }
    }

    /// 电脑执子
    pub fn computer(&self) -> Mark {
        self.config.computer
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// 为当前局面选择电脑的走法，并记入本局历史
    pub fn choose_move(&mut self, board: &Board) -> Result<usize, GameError> {
        let (index, decision) = self.decide(board)?;

        debug!(
            "电脑走 {} ({:?})，搜索节点数: {}",
            index,
            decision,
            self.search.nodes_searched()
        );

        self.history.push(HistoryEntry {
            key: board.state_key(),
            index,
        });
        Ok(index)
    }

    /// 选择走法但不记录历史
    pub fn decide(&mut self, board: &Board) -> Result<(usize, Decision), GameError> {
        if board.winner().is_some() {
            return Err(GameError::GameOver);
        }
        if board.is_full() {
            return Err(GameError::NoLegalMove);
        }

        let key = board.state_key();
        let computer = self.computer();
        self.search.reset_stats();

        if let Some(index) = self.first_allowed(&key, winning_moves(board, computer)) {
            return Ok((index, Decision::Win));
        }
        if let Some(index) = self.first_allowed(&key, winning_moves(board, computer.opponent())) {
            return Ok((index, Decision::Block));
        }

        let mut candidates = self.rank_candidates(board);
        if candidates.is_empty() {
            warn!("局面 {} 的所有走法都已禁用，忽略禁用重新排序", key);
            candidates = self.rank(board, &key, board.empty_cells());
        }

        candidates
            .iter()
            .find(|candidate| candidate.score >= 0)
            .or_else(|| candidates.first())
            .map(|candidate| (candidate.index, Decision::Search))
            .ok_or(GameError::NoLegalMove)
    }

    /// 未禁用的空格按优先级排好的候选列表
    pub fn rank_candidates(&mut self, board: &Board) -> Vec<Candidate> {
        let key = board.state_key();
        let allowed = board
            .empty_cells()
            .into_iter()
            .filter(|&index| !self.store.is_banned(&key, index))
            .collect();
        self.rank(board, &key, allowed)
    }

    /// 单个走法的搜索得分，校验越界和占用
    pub fn score_candidate(&mut self, board: &Board, index: usize) -> Result<i32, GameError> {
        self.search.score_move(board, index)
    }

    fn rank(&mut self, board: &Board, key: &StateKey, indices: Vec<usize>) -> Vec<Candidate> {
        let mut candidates = Vec::with_capacity(indices.len());
        for index in indices {
            // 调用方只传入空格
            let score = match self.search.score_move(board, index) {
                Ok(score) => score,
                Err(_) => continue,
            };
            candidates.push(Candidate {
                index,
                score,
                bias: self.store.get_bias(key, index),
            });
        }
        candidates.sort_by(compare_candidates);
        candidates
    }

    fn first_allowed(
        &self,
        key: &StateKey,
        mut indices: impl Iterator<Item = usize>,
    ) -> Option<usize> {
        indices.find(|&index| !self.store.is_banned(key, index))
    }

    /// 对局结束，根据结果更新本局历史中的每一步
    ///
    /// 无论成功与否都会清空历史。所有更新都会尝试，返回第一个保存错误；
    /// 成功时返回更新的步数。
    pub fn report_outcome(&mut self, outcome: ComputerOutcome) -> Result<usize, PersistenceError> {
        let history = std::mem::take(&mut self.history);
        let mut first_error = None;
        let mut updated = 0;

        for entry in &history {
            let result = match outcome {
                ComputerOutcome::Loss => self.store.ban(&entry.key, entry.index),
                ComputerOutcome::Win => {
                    self.store
                        .apply_reward(&entry.key, entry.index, self.config.win_reward)
                }
                ComputerOutcome::Draw if self.config.draw_reward == 0.0 => continue,
                ComputerOutcome::Draw => {
                    self.store
                        .apply_reward(&entry.key, entry.index, self.config.draw_reward)
                }
            };
            updated += 1;

            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        info!("对局结束 ({:?})，更新 {} 步经验", outcome, updated);

        match first_error {
            Some(e) => Err(e),
            None => Ok(updated),
        }
    }

    /// 开始新对局，清空历史
    pub fn new_game(&mut self) {
        self.history.clear();
    }

    /// 本局电脑走过的步
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn store(&self) -> &ExperienceStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ExperienceStore<S> {
        &mut self.store
    }

    /// 取回经验存储
    pub fn into_store(self) -> ExperienceStore<S> {
        self.store
    }
}

/// 中心 0，角 1，边 2
fn positional_rank(index: usize) -> u8 {
    if index == CENTER {
        0
    } else if CORNERS.contains(&index) {
        1
    } else {
        2
    }
}

/// 得分高者优先，其次偏好高者，再次中心、角、边，最后索引小者
fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.bias.preference_cmp(&a.bias))
        .then_with(|| positional_rank(a.index).cmp(&positional_rank(b.index)))
        .then_with(|| a.index.cmp(&b.index))
}
