//! Toast 宿主 - 订阅总线，维护有上限、自动过期的可见队列
//!
//! 生命周期：收到 (Pending) -> 入队并启动倒计时 (Visible) -> 过期/关闭/被挤出 (Expired)
//!
//! 每个 toast 有独立的定时器；关闭一个 toast 不影响其他定时器。
//! `dispose`（或 drop）以及总线释放都会取消订阅并取消所有未触发的定时器。

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use super::bus::{Subscription, Toast, ToastBus};
use super::scheduler::{Scheduler, TimerHandle};

/// 默认同时可见数量
pub const DEFAULT_MAX_VISIBLE: usize = 3;
/// 默认显示时长
pub const DEFAULT_DURATION: Duration = Duration::from_millis(3500);

/// 宿主配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastHostConfig {
    pub max_visible: usize,
    pub duration: Duration,
}

impl Default for ToastHostConfig {
    fn default() -> Self {
        Self {
            max_visible: DEFAULT_MAX_VISIBLE,
            duration: DEFAULT_DURATION,
        }
    }
}

/// toast 离开可见队列的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// 倒计时结束
    Expired,
    /// 用户关闭
    Dismissed,
    /// 超出容量被挤出
    Evicted,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::Expired => "expired",
            RemovalReason::Dismissed => "dismissed",
            RemovalReason::Evicted => "evicted",
        }
    }
}

struct HostState {
    config: ToastHostConfig,
    visible: VecDeque<Toast>,
    timers: HashMap<String, TimerHandle>,
    disposed: bool,
    snapshots: watch::Sender<Vec<Toast>>,
}

impl HostState {
    fn publish_snapshot(&self) {
        self.snapshots.send_replace(self.visible.iter().cloned().collect());
    }

    /// 取消所有定时器并清空队列；已释放时返回 false
    fn shutdown(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        for (_, mut timer) in self.timers.drain() {
            timer.cancel();
        }
        self.visible.clear();
        self.publish_snapshot();
        true
    }

    /// 按 id 移除；不存在时静默返回 false
    fn remove(&mut self, id: &str, reason: RemovalReason) -> bool {
        if let Some(mut timer) = self.timers.remove(id) {
            if reason != RemovalReason::Expired {
                timer.cancel();
            }
        }

        let Some(pos) = self.visible.iter().position(|t| t.id == id) else {
            return false;
        };
        self.visible.remove(pos);
        debug!(toast_id = %id, reason = reason.as_str(), "Toast removed");
        true
    }
}

/// Toast 宿主
pub struct ToastHost {
    state: Arc<Mutex<HostState>>,
    subscription: Subscription,
}

impl ToastHost {
    /// 挂载到总线上
    pub fn mount(bus: &ToastBus, scheduler: Arc<dyn Scheduler>, config: ToastHostConfig) -> Self {
        let config = ToastHostConfig {
            max_visible: config.max_visible.max(1),
            ..config
        };
        let (snapshots, _) = watch::channel(Vec::new());
        let state = Arc::new(Mutex::new(HostState {
            config,
            visible: VecDeque::new(),
            timers: HashMap::new(),
            disposed: false,
            snapshots,
        }));

        let weak = Arc::downgrade(&state);
        let on_dispose = weak.clone();
        let subscription = bus.subscribe_with_dispose(
            move |toast: &Toast| {
                on_toast(&weak, &scheduler, toast.clone());
            },
            move || {
                // 总线释放等同于卸载
                if let Some(state) = on_dispose.upgrade() {
                    if lock(&state).shutdown() {
                        debug!("Toast host disposed with its bus");
                    }
                }
            },
        );

        debug!(
            max_visible = config.max_visible,
            duration_ms = config.duration.as_millis() as u64,
            "Toast host mounted"
        );

        Self { state, subscription }
    }

    /// 当前可见的 toast（最旧在前）
    pub fn visible(&self) -> Vec<Toast> {
        lock(&self.state).visible.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> ToastHostConfig {
        lock(&self.state).config
    }

    /// 订阅可见队列变化
    pub fn subscribe(&self) -> watch::Receiver<Vec<Toast>> {
        lock(&self.state).snapshots.subscribe()
    }

    /// 用户关闭；id 不存在时返回 false
    pub fn dismiss(&self, id: &str) -> bool {
        let mut state = lock(&self.state);
        let removed = state.remove(id, RemovalReason::Dismissed);
        if removed {
            state.publish_snapshot();
        }
        removed
    }

    /// 取消订阅、取消所有定时器、清空队列；可重复调用
    pub fn dispose(&self) {
        self.subscription.unsubscribe();

        if lock(&self.state).shutdown() {
            debug!("Toast host disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.state).disposed
    }

    /// 尚未触发的定时器数量
    pub fn pending_timers(&self) -> usize {
        lock(&self.state).timers.len()
    }
}

impl Drop for ToastHost {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn lock(state: &Mutex<HostState>) -> MutexGuard<'_, HostState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn on_toast(weak: &Weak<Mutex<HostState>>, scheduler: &Arc<dyn Scheduler>, toast: Toast) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    let mut guard = lock(&state);
    if guard.disposed {
        return;
    }

    let id = toast.id.clone();
    // 同 id 重复发布时替换旧条目
    guard.remove(&id, RemovalReason::Evicted);
    guard.visible.push_back(toast);
    debug!(toast_id = %id, "Toast visible");

    while guard.visible.len() > guard.config.max_visible {
        if let Some(oldest) = guard.visible.front().map(|t| t.id.clone()) {
            guard.remove(&oldest, RemovalReason::Evicted);
        }
    }

    let timer_state = weak.clone();
    let timer_id = id.clone();
    let handle = scheduler.schedule(
        guard.config.duration,
        Box::new(move || {
            let Some(state) = timer_state.upgrade() else {
                return;
            };
            let mut guard = lock(&state);
            if guard.disposed {
                return;
            }
            if guard.remove(&timer_id, RemovalReason::Expired) {
                guard.publish_snapshot();
            }
        }),
    );
    guard.timers.insert(id, handle);
    guard.publish_snapshot();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Kind;
    use crate::toast::scheduler::ManualScheduler;

    fn mount(bus: &ToastBus, max_visible: usize) -> (ToastHost, ManualScheduler) {
        let scheduler = ManualScheduler::new();
        let host = ToastHost::mount(
            bus,
            Arc::new(scheduler.clone()),
            ToastHostConfig {
                max_visible,
                duration: DEFAULT_DURATION,
            },
        );
        (host, scheduler)
    }

    fn messages(host: &ToastHost) -> Vec<String> {
        host.visible().into_iter().map(|t| t.message).collect()
    }

    #[test]
    fn test_capacity_keeps_most_recent() {
        let bus = ToastBus::new();
        let (host, scheduler) = mount(&bus, 3);

        for i in 1..=5 {
            bus.publish(format!("t{}", i), Kind::Info);
        }

        assert_eq!(messages(&host), vec!["t3", "t4", "t5"]);
        // 被挤出的 toast 定时器已取消
        assert_eq!(host.pending_timers(), 3);
        assert_eq!(scheduler.pending(), 3);
    }

    #[test]
    fn test_auto_expiry() {
        let bus = ToastBus::new();
        let (host, scheduler) = mount(&bus, 3);

        bus.publish("saved", Kind::Success);
        assert_eq!(messages(&host), vec!["saved"]);

        scheduler.advance(Duration::from_millis(3499));
        assert_eq!(host.len(), 1);

        scheduler.advance(Duration::from_millis(1));
        assert!(host.is_empty());
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn test_dismiss_does_not_affect_other_timers() {
        let bus = ToastBus::new();
        let (host, scheduler) = mount(&bus, 3);

        let first = bus.publish("first", Kind::Info).unwrap();
        scheduler.advance(Duration::from_millis(1000));
        bus.publish("second", Kind::Info);

        assert!(host.dismiss(&first.id));
        assert!(!host.dismiss(&first.id));
        assert_eq!(messages(&host), vec!["second"]);

        scheduler.advance(Duration::from_millis(2500));
        assert_eq!(messages(&host), vec!["second"]);
        scheduler.advance(Duration::from_millis(1000));
        assert!(host.is_empty());
    }

    #[test]
    fn test_dismiss_unknown_or_evicted_is_noop() {
        let bus = ToastBus::new();
        let (host, _scheduler) = mount(&bus, 1);

        let old = bus.publish("old", Kind::Info).unwrap();
        bus.publish("new", Kind::Info);

        assert!(!host.dismiss(&old.id));
        assert!(!host.dismiss("never-existed"));
        assert_eq!(messages(&host), vec!["new"]);
    }

    #[test]
    fn test_dispose_unsubscribes_and_cancels_timers() {
        let bus = ToastBus::new();
        let (host, scheduler) = mount(&bus, 3);

        bus.publish("a", Kind::Info);
        bus.publish("b", Kind::Info);
        assert_eq!(bus.listener_count(), 1);

        host.dispose();
        host.dispose();

        assert!(host.is_disposed());
        assert!(host.is_empty());
        assert_eq!(bus.listener_count(), 0);
        assert_eq!(scheduler.pending(), 0);

        bus.publish("after", Kind::Info);
        assert!(host.is_empty());
    }

    #[test]
    fn test_bus_dispose_unmounts_host() {
        let bus = ToastBus::new();
        let (host, scheduler) = mount(&bus, 3);
        bus.publish("a", Kind::Info);
        assert_eq!(host.pending_timers(), 1);

        bus.dispose();

        assert!(host.is_disposed());
        assert!(host.is_empty());
        assert_eq!(host.pending_timers(), 0);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(bus.listener_count(), 0);

        // 之后再卸载宿主是空操作
        host.dispose();
        assert!(host.is_disposed());
    }

    #[test]
    fn test_mount_on_disposed_bus_is_disposed() {
        let bus = ToastBus::new();
        bus.dispose();
        let (host, _scheduler) = mount(&bus, 3);

        assert!(host.is_disposed());
        bus.publish("ignored", Kind::Info);
        assert!(host.is_empty());
    }

    #[test]
    fn test_drop_cleans_up() {
        let bus = ToastBus::new();
        let (host, scheduler) = mount(&bus, 3);
        bus.publish("a", Kind::Info);

        drop(host);
        assert_eq!(bus.listener_count(), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_two_hosts_each_show_toast() {
        let bus = ToastBus::new();
        let (a, _sa) = mount(&bus, 3);
        let (b, _sb) = mount(&bus, 3);

        bus.publish("shared", Kind::Warning);
        assert_eq!(messages(&a), vec!["shared"]);
        assert_eq!(messages(&b), vec!["shared"]);

        a.dispose();
        bus.publish("only b", Kind::Info);
        assert!(a.is_empty());
        assert_eq!(messages(&b), vec!["shared", "only b"]);
    }

    #[test]
    fn test_watch_snapshot_tracks_queue() {
        let bus = ToastBus::new();
        let (host, scheduler) = mount(&bus, 3);
        let rx = host.subscribe();

        bus.publish("hello", Kind::Info);
        assert_eq!(rx.borrow().len(), 1);

        scheduler.advance(DEFAULT_DURATION);
        assert!(rx.borrow().is_empty());
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let bus = ToastBus::new();
        let (host, _scheduler) = mount(&bus, 0);
        assert_eq!(host.config().max_visible, 1);

        bus.publish("x", Kind::Info);
        assert_eq!(host.len(), 1);
    }
}
