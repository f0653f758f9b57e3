//! AquaDash Notify - 养殖运营看板的通知核心
//!
//! - `notification`: 持久化通知（reducer、仓库、通知中心）
//! - `toast`: 短暂提示（总线、宿主、定时调度）

pub mod cli;
pub mod config;
pub mod ids;
pub mod notification;
pub mod toast;

pub use config::NotifyConfig;
pub use ids::{Clock, IdGenerator, SequentialIds, SystemClock, UuidGenerator};
pub use notification::{
    Action, FileBackend, KeyValueBackend, KeyValueRepository, Kind, MemoryBackend, NewNotification,
    Notification, NotificationCenter, NotificationRepository, NotifyError, OpResult, StorageError,
};
pub use toast::{
    ManualScheduler, Scheduler, Toast, ToastBus, ToastHost, ToastHostConfig, TokioScheduler,
};
