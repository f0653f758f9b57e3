//! Toast 总线 - 同步发布/订阅，与持久化通知解耦
//!
//! - 没有缓冲：发布时没有订阅者，toast 直接丢弃
//! - 每次发布按订阅顺序依次调用监听器
//! - 单个监听器 panic 不影响其余监听器

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ids::{IdGenerator, UuidGenerator};
use crate::notification::Kind;

/// 短暂提示消息（不持久化）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// 每次发布唯一，与通知 id 无关
    pub id: String,
    pub message: String,
    pub kind: Kind,
}

/// 监听器
pub type ToastListener = Arc<dyn Fn(&Toast) + Send + Sync>;

/// 总线释放时对订阅者的回调
pub type DisposeHook = Box<dyn FnOnce() + Send>;

struct BusInner {
    listeners: Mutex<Vec<(u64, ToastListener)>>,
    dispose_hooks: Mutex<Vec<(u64, DisposeHook)>>,
    next_listener: AtomicU64,
    ids: Arc<dyn IdGenerator>,
    disposed: AtomicBool,
}

impl BusInner {
    fn remove(&self, listener_id: u64) {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.retain(|(id, _)| *id != listener_id);
        drop(listeners);

        let mut hooks = self.dispose_hooks.lock().unwrap_or_else(|e| e.into_inner());
        hooks.retain(|(id, _)| *id != listener_id);
    }
}

/// Toast 总线实例（clone 共享同一组订阅者）
#[derive(Clone)]
pub struct ToastBus {
    inner: Arc<BusInner>,
}

impl ToastBus {
    pub fn new() -> Self {
        Self::with_id_generator(Arc::new(UuidGenerator))
    }

    /// 注入 toast id 生成器
    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            inner: Arc::new(BusInner {
                listeners: Mutex::new(Vec::new()),
                dispose_hooks: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
                ids,
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// 生成新 id 并发布，返回构造出的 toast（总线已释放时返回 None）
    pub fn publish(&self, message: impl Into<String>, kind: Kind) -> Option<Toast> {
        if self.is_disposed() {
            return None;
        }
        let toast = Toast {
            id: self.inner.ids.next_id(),
            message: message.into(),
            kind,
        };
        self.publish_toast(&toast);
        Some(toast)
    }

    /// 发布已构造好的 toast，返回成功调用的监听器数量
    pub fn publish_toast(&self, toast: &Toast) -> usize {
        if self.is_disposed() {
            return 0;
        }

        // 先复制一份，监听器内部可以安全地订阅/取消订阅
        let listeners: Vec<(u64, ToastListener)> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        if listeners.is_empty() {
            debug!(toast_id = %toast.id, "Toast published with no listeners, dropped");
            return 0;
        }

        let mut delivered = 0;
        for (listener_id, listener) in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(toast))) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    warn!(listener = listener_id, toast_id = %toast.id, "Toast listener panicked");
                }
            }
        }
        delivered
    }

    /// 注册监听器，返回取消订阅句柄
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Toast) + Send + Sync + 'static,
    {
        self.register(Arc::new(listener), None)
    }

    /// 注册监听器，并在总线 `dispose` 时调用 `on_dispose`
    ///
    /// 取消订阅后 `on_dispose` 不再被调用。
    pub fn subscribe_with_dispose<F, D>(&self, listener: F, on_dispose: D) -> Subscription
    where
        F: Fn(&Toast) + Send + Sync + 'static,
        D: FnOnce() + Send + 'static,
    {
        self.register(Arc::new(listener), Some(Box::new(on_dispose)))
    }

    fn register(&self, listener: ToastListener, on_dispose: Option<DisposeHook>) -> Subscription {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        if self.is_disposed() {
            // 已释放的总线上订阅，立即通知
            if let Some(hook) = on_dispose {
                hook();
            }
            return Subscription {
                bus: Weak::new(),
                id,
                active: AtomicBool::new(false),
            };
        }

        self.inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, listener));
        if let Some(hook) = on_dispose {
            self.inner
                .dispose_hooks
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((id, hook));
        }

        Subscription {
            bus: Arc::downgrade(&self.inner),
            id,
            active: AtomicBool::new(true),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// 释放总线：移除所有监听器并通知订阅者，之后的发布/订阅都是空操作
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();

        // 锁外执行回调，回调里可以取消订阅
        let hooks: Vec<(u64, DisposeHook)> = std::mem::take(
            &mut *self
                .inner
                .dispose_hooks
                .lock()
                .unwrap_or_else(|e| e.into_inner()),
        );
        for (listener_id, hook) in hooks {
            if catch_unwind(AssertUnwindSafe(hook)).is_err() {
                warn!(listener = listener_id, "Toast bus dispose hook panicked");
            }
        }
        debug!("Toast bus disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }
}

impl Default for ToastBus {
    fn default() -> Self {
        Self::new()
    }
}

/// 取消订阅句柄
///
/// 只移除自己注册的监听器；重复调用是空操作。drop 不会自动取消订阅。
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<BusInner>,
    id: u64,
    active: AtomicBool,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
