//! AI 配置

use serde::{Deserialize, Serialize};
use tictactoe_core::Mark;

/// 默认胜局奖励
pub const DEFAULT_WIN_REWARD: f64 = 1.0;

/// 默认和局奖励（小幅惩罚，让同分走法里偏向没有和过的）
pub const DEFAULT_DRAW_REWARD: f64 = -0.1;

/// 走法选择器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// 电脑执子（搜索中的最大化方）
    pub computer: Mark,
    /// 电脑获胜时每步的奖励
    pub win_reward: f64,
    /// 和局时每步的奖励，0 表示不写入
    pub draw_reward: f64,
    /// 是否启用 Alpha-Beta 剪枝（不影响结果）
    pub pruning: bool,
}

impl SelectorConfig {
    /// 指定电脑执子，其余使用默认值
    pub fn for_computer(computer: Mark) -> Self {
        Self {
            computer,
            ..Self::default()
        }
    }

    /// 奖励必须是有限值，否则经验表无法保存
    pub fn has_finite_rewards(&self) -> bool {
        self.win_reward.is_finite() && self.draw_reward.is_finite()
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            computer: Mark::O,
            win_reward: DEFAULT_WIN_REWARD,
            draw_reward: DEFAULT_DRAW_REWARD,
            pruning: true,
        }
    }
}
