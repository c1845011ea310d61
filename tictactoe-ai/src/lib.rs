//! 井字棋 AI 引擎
//!
//! 包含:
//! - 完整 Minimax 搜索（可选 Alpha-Beta 剪枝）
//! - 持久化的经验表（奖励与禁用）
//! - 组合两者的走法选择器

mod config;
mod error;
mod experience;
mod search;
mod selector;
mod storage;

pub use config::{SelectorConfig, DEFAULT_DRAW_REWARD, DEFAULT_WIN_REWARD};
pub use error::PersistenceError;
pub use experience::{Bias, ExperienceStore, ExperienceTable, EXPERIENCE_KEY, EXPERIENCE_VERSION};
pub use search::{immediate_winning_move, winning_moves, SearchEngine, WIN_SCORE};
pub use selector::{Candidate, Decision, HistoryEntry, MoveSelector};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
