//! 通知核心的错误类型

use thiserror::Error;

/// 存储失败（在 repository 边界捕获）
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode notifications: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage quota exceeded: {needed} bytes needed, {limit} bytes allowed")]
    Quota { needed: usize, limit: usize },
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Facade 操作失败
#[derive(Debug, Error)]
pub enum NotifyError {
    /// 内存状态已更新，但持久化失败
    #[error("notification state not persisted: {0}")]
    Storage(#[from] StorageError),
    #[error("notification not found: {0}")]
    NotFound(String),
    #[error("notification center has been disposed")]
    Disposed,
}

/// Facade 操作的返回类型
pub type OpResult<T = ()> = Result<T, NotifyError>;
