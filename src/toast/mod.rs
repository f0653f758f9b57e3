//! Toast - 短暂提示：总线、宿主、定时调度

pub mod bus;
pub mod host;
pub mod scheduler;

pub use bus::{DisposeHook, Subscription, Toast, ToastBus, ToastListener};
pub use host::{RemovalReason, ToastHost, ToastHostConfig, DEFAULT_DURATION, DEFAULT_MAX_VISIBLE};
pub use scheduler::{ManualScheduler, Scheduler, Task, TimerHandle, TokioScheduler};
