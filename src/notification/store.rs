//! 通知存储 - 整表读写到可替换的后端
//!
//! 策略：
//! - `load` 软失败：key 不存在、数据损坏、后端读取失败都返回空列表（记录 warn）
//! - `save` 显式失败：编码/写入/配额错误返回 `StorageError`
//! - 容量上限在 `save` 时截断（保留最新的 N 条），reducer 保持纯函数

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::backend::KeyValueBackend;
use super::error::StorageError;
use super::record::Notification;

/// 默认容量上限
pub const MAX_NOTIFICATIONS: usize = 200;

/// 默认存储 key，schema 不兼容时升级 `v` 后缀
pub const DEFAULT_STORAGE_KEY: &str = "aquadash:notif:v1";

/// 通知仓库（可以是本地存储，也可以是远程数据库）
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 读取全部记录（最新在前）
    async fn load(&self) -> Result<Vec<Notification>, StorageError>;

    /// 整表覆盖写入
    async fn save(&self, notifications: &[Notification]) -> Result<(), StorageError>;
}

/// 基于键值后端的仓库：单个 key 存 JSON 数组
pub struct KeyValueRepository<B: KeyValueBackend> {
    backend: Arc<B>,
    key: String,
    capacity: usize,
}

impl<B: KeyValueBackend> KeyValueRepository<B> {
    /// 使用默认 key 和容量
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            key: DEFAULT_STORAGE_KEY.to_string(),
            capacity: MAX_NOTIFICATIONS,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn load_sync(&self) -> Vec<Notification> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read notifications, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Notification>>(&raw) {
            Ok(list) => list,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Corrupt notification data, starting empty");
                Vec::new()
            }
        }
    }

    fn save_sync(&self, notifications: &[Notification]) -> Result<(), StorageError> {
        let kept = &notifications[..notifications.len().min(self.capacity)];
        if kept.len() < notifications.len() {
            debug!(
                dropped = notifications.len() - kept.len(),
                capacity = self.capacity,
                "Truncating notifications to capacity"
            );
        }

        let json = serde_json::to_string(kept)?;
        self.backend.set(&self.key, &json)
    }
}

#[async_trait]
impl<B: KeyValueBackend + 'static> NotificationRepository for KeyValueRepository<B> {
    async fn load(&self) -> Result<Vec<Notification>, StorageError> {
        Ok(self.load_sync())
    }

    async fn save(&self, notifications: &[Notification]) -> Result<(), StorageError> {
        self.save_sync(notifications)
    }
}
