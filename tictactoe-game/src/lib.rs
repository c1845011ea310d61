//! 井字棋对局层
//!
//! 包含:
//! - 人机 / 双人两种模式
//! - 轮流落子与终局判定
//! - 比分统计
//! - 终局结果反馈给 AI
//! - 设置持久化

pub mod session;
pub mod settings;

pub use session::{GameMode, GameSession, Scoreboard, Turn};
pub use settings::GameSettings;
