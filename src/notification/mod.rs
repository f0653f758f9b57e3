//! 通知核心 - 持久化通知的数据模型、状态转换与存储
//!
//! 数据流：界面操作 -> `NotificationCenter` -> `reduce`（纯函数）-> `NotificationRepository`
//!
//! # 使用示例
//! ```ignore
//! use aquadash_notify::notification::{KeyValueRepository, MemoryBackend, NewNotification, Kind, NotificationCenter};
//!
//! let repo = Arc::new(KeyValueRepository::new(Arc::new(MemoryBackend::new())));
//! let center = NotificationCenter::builder(repo).build().await;
//! let record = center.add(NewNotification::new("Low oxygen", Kind::Warning)).await?;
//! center.mark_read(&record.id).await?;
//! ```

pub mod backend;
pub mod center;
pub mod error;
pub mod kind;
pub mod record;
pub mod reducer;
pub mod store;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use center::{NotificationCenter, NotificationCenterBuilder, Snapshot};
pub use error::{NotifyError, OpResult, StorageError};
pub use kind::Kind;
pub use record::{NewNotification, Notification, NotificationId};
pub use reducer::{reduce, Action};
pub use store::{KeyValueRepository, NotificationRepository, DEFAULT_STORAGE_KEY, MAX_NOTIFICATIONS};
