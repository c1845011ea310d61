//! 经验表
//!
//! 记录每个 (局面键, 走法) 的累计偏好。输掉的走法会被禁用，
//! 赢下的走法累计奖励。每次修改都会立即写回存储后端。

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tictactoe_core::{Board, StateKey, CELL_COUNT};
use tracing::{debug, info, warn};

use crate::error::{PersistenceError, Result};
use crate::storage::KeyValueStore;

/// 经验表在存储中的键
pub const EXPERIENCE_KEY: &str = "experience";

/// 持久化格式版本
pub const EXPERIENCE_VERSION: u32 = 1;

/// 走法偏好
///
/// 禁用是独立的变体，不与任何有限分值混淆。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    /// 累计奖励
    Reward(f64),
    /// 禁用：不再从该局面选择这个走法
    Banned,
}

impl Bias {
    pub fn is_banned(&self) -> bool {
        matches!(self, Bias::Banned)
    }

    /// 有限奖励值，禁用时返回 None
    pub fn reward(&self) -> Option<f64> {
        match self {
            Bias::Reward(value) => Some(*value),
            Bias::Banned => None,
        }
    }

    /// 累加奖励，禁用保持禁用
    pub fn add(self, delta: f64) -> Bias {
        match self {
            Bias::Reward(value) => Bias::Reward(value + delta),
            Bias::Banned => Bias::Banned,
        }
    }

    /// 偏好比较：禁用低于任何奖励
    pub fn preference_cmp(&self, other: &Bias) -> Ordering {
        match (self, other) {
            (Bias::Banned, Bias::Banned) => Ordering::Equal,
            (Bias::Banned, Bias::Reward(_)) => Ordering::Less,
            (Bias::Reward(_), Bias::Banned) => Ordering::Greater,
            (Bias::Reward(a), Bias::Reward(b)) => a.total_cmp(b),
        }
    }
}

impl Default for Bias {
    fn default() -> Self {
        Bias::Reward(0.0)
    }
}

/// 经验表：局面键 -> (走法 -> 偏好)
pub type ExperienceTable = BTreeMap<StateKey, BTreeMap<usize, Bias>>;

/// 持久化文档
#[derive(Debug, Serialize)]
struct ExperienceDocument<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    entries: &'a ExperienceTable,
}

/// 读取时的文档，键和走法先按字符串读入再逐条校验
#[derive(Debug, Deserialize)]
struct StoredDocument {
    version: u32,
    saved_at: DateTime<Utc>,
    entries: BTreeMap<String, BTreeMap<String, Bias>>,
}

/// 经验存储
///
/// 由调用方创建并注入走法选择器，进程内只打开一次，退出前 [`close`](Self::close)。
pub struct ExperienceStore<S: KeyValueStore> {
    backend: S,
    table: ExperienceTable,
    /// 打开时读取失败的原因；存在时拒绝写回，直到 reset
    load_error: Option<String>,
}

impl<S: KeyValueStore> ExperienceStore<S> {
    /// 打开经验表
    ///
    /// 没有已保存的数据、数据损坏或版本不符时都从空表开始，不会失败。
    /// 后端读取出错时同样使用空表，但在 [`reset`](Self::reset) 之前不会覆盖存储中的数据。
    pub fn open(backend: S) -> Self {
        let mut load_error = None;
        let table = match backend.load(EXPERIENCE_KEY) {
            Ok(Some(content)) => parse_document(&content).unwrap_or_default(),
            Ok(None) => {
                debug!("经验表不存在，使用空表");
                ExperienceTable::new()
            }
            Err(e) => {
                warn!("无法读取经验表: {}，使用空表且不写回", e);
                load_error = Some(e.to_string());
                ExperienceTable::new()
            }
        };

        Self {
            backend,
            table,
            load_error,
        }
    }

    /// 获取偏好，不存在时为 0
    pub fn get_bias(&self, key: &StateKey, index: usize) -> Bias {
        self.table
            .get(key)
            .and_then(|moves| moves.get(&index))
            .copied()
            .unwrap_or_default()
    }

    /// 走法是否被禁用
    pub fn is_banned(&self, key: &StateKey, index: usize) -> bool {
        self.get_bias(key, index).is_banned()
    }

    /// 累加奖励并保存
    ///
    /// 保存失败时内存中的修改仍然保留，错误返回给调用方。
    /// 结果不是有限值时拒绝修改。
    pub fn apply_reward(&mut self, key: &StateKey, index: usize, delta: f64) -> Result<()> {
        let updated = self.get_bias(key, index).add(delta);
        let value = updated.reward().unwrap_or(delta);
        if !value.is_finite() {
            return Err(PersistenceError::NonFiniteReward {
                key: key.to_string(),
                index,
                value,
            });
        }

        self.table
            .entry(key.clone())
            .or_default()
            .insert(index, updated);
        debug!("奖励走法: {} @ {} += {} -> {:?}", key, index, delta, updated);

        self.persist()
    }

    /// 禁用走法并保存（覆盖已有奖励）
    pub fn ban(&mut self, key: &StateKey, index: usize) -> Result<()> {
        self.table
            .entry(key.clone())
            .or_default()
            .insert(index, Bias::Banned);
        debug!("禁用走法: {} @ {}", key, index);

        self.persist()
    }

    /// 清空经验表并保存，同时解除读取失败后的写保护
    pub fn reset(&mut self) -> Result<()> {
        self.table.clear();
        self.load_error = None;
        info!("经验表已重置");
        self.persist()
    }

    /// 当前内存中的经验表
    pub fn table(&self) -> &ExperienceTable {
        &self.table
    }

    /// 已记录的局面数
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// 打开时是否读取失败（此时不会写回）
    pub fn load_failed(&self) -> bool {
        self.load_error.is_some()
    }

    /// 把当前经验表重新写入存储
    pub fn flush(&mut self) -> Result<()> {
        self.persist()
    }

    /// 保存并关闭
    pub fn close(mut self) -> Result<()> {
        self.persist()
    }

    /// 取回存储后端（不保存）
    pub fn into_backend(self) -> S {
        self.backend
    }

    fn persist(&mut self) -> Result<()> {
        if let Some(reason) = &self.load_error {
            warn!("经验表读取失败过，跳过保存");
            return Err(PersistenceError::LoadFailed {
                reason: reason.clone(),
            });
        }

        let document = ExperienceDocument {
            version: EXPERIENCE_VERSION,
            saved_at: Utc::now(),
            entries: &self.table,
        };
        let content = serde_json::to_string_pretty(&document)?;

        self.backend.save(EXPERIENCE_KEY, &content).map_err(|e| {
            warn!("经验表保存失败: {}", e);
            e
        })
    }
}

/// 解析持久化文档，无效时返回 None
fn parse_document(content: &str) -> Option<ExperienceTable> {
    match serde_json::from_str::<StoredDocument>(content) {
        Ok(document) if document.version == EXPERIENCE_VERSION => {
            let table = validate_entries(document.entries);
            info!(
                "已加载经验表: {} 个局面 (保存于 {})",
                table.len(),
                document.saved_at
            );
            Some(table)
        }
        Ok(document) => {
            warn!(
                "经验表版本不支持: {} (期望 {})，使用空表",
                document.version, EXPERIENCE_VERSION
            );
            None
        }
        Err(e) => {
            warn!("经验表格式无效: {}，使用空表", e);
            None
        }
    }
}

/// 逐条校验读入的条目
///
/// 丢弃无法解析的局面键、超出棋盘或落在已占格子上的走法，以及非有限奖励。
fn validate_entries(raw: BTreeMap<String, BTreeMap<String, Bias>>) -> ExperienceTable {
    let mut table = ExperienceTable::new();
    let mut dropped = 0usize;

    for (raw_key, raw_moves) in raw {
        let board: Board = match raw_key.parse() {
            Ok(board) => board,
            Err(e) => {
                warn!("跳过无效局面键 {:?}: {}", raw_key, e);
                dropped += raw_moves.len();
                continue;
            }
        };

        let mut moves = BTreeMap::new();
        for (raw_index, bias) in raw_moves {
            let index = raw_index
                .parse::<usize>()
                .ok()
                .filter(|&index| index < CELL_COUNT && board.get(index).is_none());
            let finite = bias.reward().map_or(true, f64::is_finite);
            match index {
                Some(index) if finite => {
                    moves.insert(index, bias);
                }
                _ => dropped += 1,
            }
        }

        if !moves.is_empty() {
            table
                .entry(board.state_key())
                .or_default()
                .extend(moves);
        }
    }

    if dropped > 0 {
        warn!("经验表中有 {} 条无效走法，已丢弃", dropped);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use tempfile::TempDir;
    use tictactoe_core::{Board, Mark};

    /// 总是写入失败的后端
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn load(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn save(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(PersistenceError::Unavailable {
                reason: "quota exceeded".to_string(),
            })
        }
    }

    fn key(s: &str) -> StateKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_absent_bias_defaults_to_zero() {
        let store = ExperienceStore::open(MemoryStore::new());
        let k = Board::empty().state_key();

        assert_eq!(store.get_bias(&k, 4), Bias::Reward(0.0));
        assert!(!store.is_banned(&k, 4));
        assert!(store.is_empty());
    }

    #[test]
    fn test_reward_accumulation() {
        let mut store = ExperienceStore::open(MemoryStore::new());
        let k = key("----X----");

        store.apply_reward(&k, 0, 2.0).unwrap();
        store.apply_reward(&k, 0, 2.0).unwrap();

        assert_eq!(store.get_bias(&k, 0), Bias::Reward(4.0));
        assert_eq!(store.get_bias(&k, 1), Bias::Reward(0.0));
    }

    #[test]
    fn test_ban_is_idempotent() {
        let mut store = ExperienceStore::open(MemoryStore::new());
        let k = key("X--------");

        store.ban(&k, 4).unwrap();
        store.ban(&k, 4).unwrap();

        assert!(store.is_banned(&k, 4));
        assert_eq!(store.get_bias(&k, 4), Bias::Banned);
        assert_eq!(store.get_bias(&k, 4).reward(), None);
    }

    #[test]
    fn test_ban_overwrites_reward_and_stays_banned() {
        let mut store = ExperienceStore::open(MemoryStore::new());
        let k = key("X--------");

        store.apply_reward(&k, 4, 10.0).unwrap();
        store.ban(&k, 4).unwrap();
        store.apply_reward(&k, 4, 10.0).unwrap();

        assert!(store.is_banned(&k, 4));
    }

    #[test]
    fn test_banned_sorts_below_any_reward() {
        let very_low = Bias::Reward(-1.0e300);
        assert_eq!(Bias::Banned.preference_cmp(&very_low), Ordering::Less);
        assert_eq!(very_low.preference_cmp(&Bias::Banned), Ordering::Greater);
        assert_eq!(Bias::Banned.preference_cmp(&Bias::Banned), Ordering::Equal);
        assert_eq!(
            Bias::Reward(1.0).preference_cmp(&Bias::Reward(0.5)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_round_trip_through_memory_store() {
        let mut store = ExperienceStore::open(MemoryStore::new());
        let a = key("---------");
        let b = key("X---O----");

        store.apply_reward(&a, 4, 1.0).unwrap();
        store.apply_reward(&a, 0, -0.1).unwrap();
        store.apply_reward(&a, 0, 0.3).unwrap();
        store.ban(&b, 8).unwrap();
        store.apply_reward(&b, 2, 1.0 / 3.0).unwrap();

        let expected = store.table().clone();
        let reopened = ExperienceStore::open(store.into_backend());

        assert_eq!(reopened.table(), &expected);
        assert!(reopened.is_banned(&b, 8));
        assert_eq!(reopened.get_bias(&b, 2), Bias::Reward(1.0 / 3.0));
    }

    #[test]
    fn test_reward_overflow_keeps_table_loadable() {
        let mut store = ExperienceStore::open(MemoryStore::new());
        let k = key("X--------");

        store.ban(&k, 4).unwrap();
        store.apply_reward(&k, 1, f64::MAX).unwrap();
        let err = store.apply_reward(&k, 1, f64::MAX).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::NonFiniteReward { index: 1, value, .. } if value.is_infinite()
        ));
        assert_eq!(store.get_bias(&k, 1), Bias::Reward(f64::MAX));

        assert!(matches!(
            store.apply_reward(&k, 2, f64::NAN),
            Err(PersistenceError::NonFiniteReward { index: 2, .. })
        ));
        assert_eq!(store.get_bias(&k, 2), Bias::Reward(0.0));

        let reopened = ExperienceStore::open(store.into_backend());
        assert!(reopened.is_banned(&k, 4));
        assert_eq!(reopened.get_bias(&k, 1), Bias::Reward(f64::MAX));
    }

    #[test]
    fn test_invalid_entries_dropped_on_load() {
        let mut backend = MemoryStore::new();
        backend.insert(
            EXPERIENCE_KEY,
            r#"{"version":1,"saved_at":"2026-01-09T15:30:22Z","entries":{
                "garbage":{"4":"banned"},
                "---------":{"42":"banned","abc":"banned","4":{"reward":1.0}},
                "x--------":{"0":"banned","8":"banned"}
            }}"#,
        );

        let store = ExperienceStore::open(backend);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get_bias(&key("---------"), 4), Bias::Reward(1.0));
        assert_eq!(store.table()[&key("---------")].len(), 1);

        // 小写键规范化，已占格子上的走法丢弃
        let k = key("X--------");
        assert!(store.is_banned(&k, 8));
        assert!(!store.table()[&k].contains_key(&0));
    }

    #[test]
    fn test_read_failure_protects_stored_data() {
        /// 读取失败、写入正常的后端
        struct UnreadableStore {
            saved: Vec<String>,
        }

        impl KeyValueStore for UnreadableStore {
            fn load(&self, _key: &str) -> Result<Option<String>> {
                Err(PersistenceError::Unavailable {
                    reason: "permission denied".to_string(),
                })
            }

            fn save(&mut self, _key: &str, value: &str) -> Result<()> {
                self.saved.push(value.to_string());
                Ok(())
            }
        }

        let mut store = ExperienceStore::open(UnreadableStore { saved: Vec::new() });
        let k = key("---------");
        assert!(store.load_failed());

        let err = store.ban(&k, 4).unwrap_err();
        assert!(matches!(err, PersistenceError::LoadFailed { .. }));
        assert!(store.is_banned(&k, 4));
        assert!(store.flush().is_err());

        store.reset().unwrap();
        assert!(!store.load_failed());
        store.ban(&k, 4).unwrap();
        assert_eq!(store.into_backend().saved.len(), 2);
    }

    #[test]
    fn test_round_trip_through_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let k = Board::empty().with_mark(4, Mark::X).state_key();

        {
            let mut store = ExperienceStore::open(FileStore::new(temp_dir.path()).unwrap());
            store.ban(&k, 0).unwrap();
            store.apply_reward(&k, 2, 1.0).unwrap();
            store.close().unwrap();
        }

        let store = ExperienceStore::open(FileStore::new(temp_dir.path()).unwrap());
        assert!(store.is_banned(&k, 0));
        assert_eq!(store.get_bias(&k, 2), Bias::Reward(1.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_persisted_format() {
        let mut store = ExperienceStore::open(MemoryStore::new());
        let k = key("----X----");
        store.ban(&k, 0).unwrap();
        store.apply_reward(&k, 2, 1.5).unwrap();

        let backend = store.into_backend();
        let raw: serde_json::Value =
            serde_json::from_str(backend.get(EXPERIENCE_KEY).unwrap()).unwrap();

        assert_eq!(raw["version"], 1);
        assert_eq!(raw["entries"]["----X----"]["0"], "banned");
        assert_eq!(raw["entries"]["----X----"]["2"]["reward"], 1.5);
    }

    #[test]
    fn test_corrupt_data_falls_back_to_empty() {
        let mut backend = MemoryStore::new();
        backend.insert(EXPERIENCE_KEY, "{ not json");

        let store = ExperienceStore::open(backend);
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_version_falls_back_to_empty() {
        let mut backend = MemoryStore::new();
        backend.insert(
            EXPERIENCE_KEY,
            r#"{"version":99,"saved_at":"2026-01-09T15:30:22Z","entries":{"---------":{"4":"banned"}}}"#,
        );

        let store = ExperienceStore::open(backend);
        assert!(store.is_empty());
    }

    #[test]
    fn test_persistence_failure_keeps_memory_update() {
        let mut store = ExperienceStore::open(BrokenStore);
        let k = key("---------");

        let err = store.apply_reward(&k, 4, 2.0).unwrap_err();
        assert!(matches!(err, PersistenceError::Unavailable { .. }));
        assert_eq!(store.get_bias(&k, 4), Bias::Reward(2.0));

        assert!(store.ban(&k, 0).is_err());
        assert!(store.is_banned(&k, 0));
    }

    #[test]
    fn test_reset_clears_table() {
        let mut store = ExperienceStore::open(MemoryStore::new());
        store.ban(&key("---------"), 4).unwrap();

        store.reset().unwrap();
        assert!(store.is_empty());

        let reopened = ExperienceStore::open(store.into_backend());
        assert!(reopened.is_empty());
    }
}
