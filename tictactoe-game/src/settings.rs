//! 游戏设置
//!
//! 设置文件为 JSON，缺失或无效时使用默认值。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tictactoe_ai::{ExperienceStore, FileStore, MoveSelector, SelectorConfig};
use tracing::{info, warn};

use crate::session::{GameMode, GameSession};

/// 游戏设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GameSettings {
    /// 默认对局模式
    pub mode: GameMode,
    /// AI 配置
    pub selector: SelectorConfig,
    /// 经验表目录，未设置时使用系统数据目录
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_dir: Option<PathBuf>,
}

impl GameSettings {
    /// 获取设置文件路径
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("tictactoe");
            path.push("settings.json");
            path
        })
    }

    /// 从默认位置加载设置
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("无法获取配置目录，使用默认设置");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// 从指定文件加载设置
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("设置文件不存在，使用默认设置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Self>(&content) {
                Ok(mut settings) => {
                    if !settings.selector.has_finite_rewards() {
                        warn!("设置中的奖励不是有限值，使用默认 AI 配置");
                        settings.selector = SelectorConfig {
                            computer: settings.selector.computer,
                            pruning: settings.selector.pruning,
                            ..SelectorConfig::default()
                        };
                    }
                    info!("已加载设置: {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("设置文件格式无效: {}，使用默认设置", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("无法读取设置文件: {}，使用默认设置", e);
                Self::default()
            }
        }
    }

    /// 保存到默认位置
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path().context("无法获取配置目录")?;
        self.save_to(&path)
    }

    /// 保存到指定文件
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if !self.selector.has_finite_rewards() {
            bail!(
                "奖励必须是有限值: win_reward={}, draw_reward={}",
                self.selector.win_reward,
                self.selector.draw_reward
            );
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("无法创建配置目录: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("序列化设置失败")?;
        fs::write(path, content).with_context(|| format!("写入设置文件失败: {:?}", path))?;

        info!("设置已保存: {:?}", path);
        Ok(())
    }

    /// 打开经验表存储
    pub fn open_store(&self) -> Result<ExperienceStore<FileStore>> {
        let backend = match &self.experience_dir {
            Some(dir) => {
                FileStore::new(dir).with_context(|| format!("无法打开经验目录: {:?}", dir))?
            }
            None => FileStore::default_location().context("无法打开默认经验目录")?,
        };
        Ok(ExperienceStore::open(backend))
    }

    /// 按设置创建对局
    pub fn new_session(&self) -> Result<GameSession<FileStore>> {
        let store = self.open_store()?;
        let selector = MoveSelector::new(store, self.selector.clone());
        GameSession::new(selector, self.mode).context("无法开始对局")
    }
}
