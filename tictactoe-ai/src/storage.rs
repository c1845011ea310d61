//! 键值存储后端
//!
//! 经验表只依赖 [`KeyValueStore`] 这一最小接口，文件系统和内存两种实现。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PersistenceError, Result};

/// 键值存储
pub trait KeyValueStore {
    /// 读取键值，不存在返回 `Ok(None)`
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// 写入键值，返回前必须已落盘
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
}

/// 文件存储：每个键对应目录下一个 `<key>.json` 文件
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// 在指定目录创建存储，目录不存在时自动创建
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        if !dir.exists() {
            fs::create_dir_all(&dir)
                .map_err(|e| PersistenceError::io(format!("create directory {:?}", dir), e))?;
        }

        Ok(Self { dir })
    }

    /// 使用跨平台数据目录
    pub fn default_location() -> Result<Self> {
        let data_dir = dirs::data_dir().ok_or_else(|| PersistenceError::Unavailable {
            reason: "no application data directory".to_string(),
        })?;

        Self::new(data_dir.join("tictactoe"))
    }

    /// 获取存储目录路径
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);

        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| PersistenceError::io(format!("read {:?}", path), e))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        // 先写临时文件再重命名，避免半截文件
        fs::write(&tmp, value).map_err(|e| PersistenceError::io(format!("write {:?}", tmp), e))?;
        fs::rename(&tmp, &path)
            .map_err(|e| PersistenceError::io(format!("rename {:?} to {:?}", tmp, path), e))?;

        Ok(())
    }
}

/// 内存存储，进程退出即丢失
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接读取原始内容
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// 直接写入原始内容
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 清理键中不能出现在文件名里的字符
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
