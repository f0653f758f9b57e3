//! 配置 - `~/.config/aquadash/notify.json`
//!
//! 所有字段都有默认值，文件不存在时使用默认配置。
//! 环境变量 `AQUADASH_HOME` 覆盖 `~/.config/aquadash` 根目录。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::notification::{FileBackend, KeyValueRepository, DEFAULT_STORAGE_KEY, MAX_NOTIFICATIONS};
use crate::toast::{ToastHostConfig, DEFAULT_DURATION, DEFAULT_MAX_VISIBLE};

/// 根目录环境变量
pub const HOME_ENV: &str = "AQUADASH_HOME";

/// 通知核心配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// 数据目录（默认 `<root>/data`）
    pub data_dir: Option<PathBuf>,
    /// 存储 key，升级 schema 时改版本后缀
    pub storage_key: String,
    /// 最多保留的通知数
    pub capacity: usize,
    /// 同时可见的 toast 数
    pub toast_max_visible: usize,
    /// toast 显示时长（毫秒）
    pub toast_duration_ms: u64,
    /// 持久化失败时发 error toast
    pub toast_on_storage_failure: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            capacity: MAX_NOTIFICATIONS,
            toast_max_visible: DEFAULT_MAX_VISIBLE,
            toast_duration_ms: DEFAULT_DURATION.as_millis() as u64,
            toast_on_storage_failure: true,
        }
    }
}

impl NotifyConfig {
    /// 配置根目录
    pub fn root_dir() -> PathBuf {
        if let Ok(home) = std::env::var(HOME_ENV) {
            if !home.is_empty() {
                return PathBuf::from(home);
            }
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("aquadash")
    }

    /// 默认配置文件路径
    pub fn path() -> PathBuf {
        Self::root_dir().join("notify.json")
    }

    /// 从默认路径加载
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    /// 从指定文件加载；文件不存在时返回默认值，格式错误时报错
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: NotifyConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// 实际使用的数据目录
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| Self::root_dir().join("data"))
    }

    pub fn toast_host_config(&self) -> ToastHostConfig {
        ToastHostConfig {
            max_visible: self.toast_max_visible,
            duration: Duration::from_millis(self.toast_duration_ms),
        }
    }

    /// 按配置创建文件仓库
    pub fn file_repository(&self) -> KeyValueRepository<FileBackend> {
        KeyValueRepository::new(Arc::new(FileBackend::new(self.data_dir())))
            .with_key(self.storage_key.clone())
            .with_capacity(self.capacity)
    }
}
