//! 通知中心 - reducer + repository 的唯一持有者
//!
//! 所有界面（铃铛、下拉列表、toast）共享同一个实例并通过 `subscribe` 观察状态，
//! 不各自从仓库加载。每次 dispatch：
//! 1. 在写锁内 reduce 得到新状态并立即广播（界面不等待持久化）
//! 2. 仍在写锁内整表 `save`，保证同一仓库的写入不交错
//! 3. 持久化失败时返回 `NotifyError::Storage`，并可选地发一条 error toast

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::error::{NotifyError, OpResult};
use super::kind::Kind;
use super::record::{NewNotification, Notification};
use super::reducer::{reduce, Action};
use super::store::{NotificationRepository, MAX_NOTIFICATIONS};
use crate::ids::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::toast::{Toast, ToastBus};

/// 通知状态快照
pub type Snapshot = Arc<Vec<Notification>>;

struct CenterInner {
    state: Mutex<Vec<Notification>>,
    snapshots: watch::Sender<Snapshot>,
    repo: Arc<dyn NotificationRepository>,
    bus: ToastBus,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    capacity: usize,
    toast_on_storage_failure: bool,
    disposed: AtomicBool,
}

/// 通知中心（clone 共享同一状态）
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<CenterInner>,
}

impl NotificationCenter {
    pub fn builder(repo: Arc<dyn NotificationRepository>) -> NotificationCenterBuilder {
        NotificationCenterBuilder::new(repo)
    }

    /// 按默认配置从仓库加载
    pub async fn load(repo: Arc<dyn NotificationRepository>) -> Self {
        NotificationCenterBuilder::new(repo).build().await
    }

    /// 释放：之后所有变更操作返回 `NotifyError::Disposed`，快照保持最后状态
    ///
    /// 不会释放共享的 toast 总线。
    pub async fn dispose(&self) {
        // 等待进行中的 dispatch 保存完成
        let _state = self.inner.state.lock().await;
        if !self.inner.disposed.swap(true, Ordering::SeqCst) {
            info!("Notification center disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// 当前快照（最新在前）
    pub fn items(&self) -> Snapshot {
        self.inner.snapshots.borrow().clone()
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.items().iter().find(|n| n.id == id).cloned()
    }

    /// 铃铛角标数字
    pub fn unread_count(&self) -> usize {
        self.items().iter().filter(|n| !n.read).count()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn bus(&self) -> &ToastBus {
        &self.inner.bus
    }

    /// 新建通知；id 和创建时间在内部生成
    ///
    /// 持久化失败时记录仍保留在内存中（`items()[0]`），但返回错误。
    pub async fn add(&self, new: NewNotification) -> OpResult<Notification> {
        let record = new.into_record(self.inner.ids.next_id(), self.inner.clock.now());
        self.dispatch(Action::Add(record.clone())).await?;
        Ok(record)
    }

    /// 新建通知并同时发一条同类 toast
    pub async fn add_with_toast(&self, new: NewNotification) -> OpResult<Notification> {
        let text = new.title.clone();
        let kind = new.kind;
        let result = self.add(new).await;
        self.toast(text, kind);
        result
    }

    pub async fn mark_read(&self, id: &str) -> OpResult {
        self.dispatch(Action::MarkRead(id.to_string())).await
    }

    pub async fn mark_unread(&self, id: &str) -> OpResult {
        self.dispatch(Action::MarkUnread(id.to_string())).await
    }

    pub async fn mark_all_read(&self) -> OpResult {
        self.dispatch(Action::MarkAllRead).await
    }

    pub async fn dismiss(&self, id: &str) -> OpResult {
        self.dispatch(Action::Dismiss(id.to_string())).await
    }

    pub async fn clear_all(&self) -> OpResult {
        self.dispatch(Action::ClearAll).await
    }

    /// 只发 toast，不改动持久化状态
    pub fn toast(&self, message: impl Into<String>, kind: Kind) -> Option<Toast> {
        self.inner.bus.publish(message, kind)
    }

    /// 打开一条通知：标记已读，若 `data.route` 存在则交给 `navigate`
    ///
    /// 核心本身不做导航。返回被导航的路由。
    pub async fn open<F>(&self, id: &str, navigate: F) -> OpResult<Option<String>>
    where
        F: FnOnce(&str),
    {
        let record = self
            .get(id)
            .ok_or_else(|| NotifyError::NotFound(id.to_string()))?;
        let route = record.route().map(str::to_string);

        let result = self.mark_read(id).await;
        if let Some(route) = &route {
            navigate(route.as_str());
        }
        result.map(|_| route)
    }

    /// 按顺序应用动作并持久化
    pub async fn dispatch(&self, action: Action) -> OpResult {
        let mut state = self.inner.state.lock().await;
        if self.is_disposed() {
            return Err(NotifyError::Disposed);
        }

        let mut next = reduce(&state, &action);
        next.truncate(self.inner.capacity);
        *state = next;
        self.inner.snapshots.send_replace(Arc::new(state.clone()));
        debug!(action = action.name(), len = state.len(), "Notification action applied");

        // 持有写锁直到保存完成
        let saved = self.inner.repo.save(&state).await;
        drop(state);

        if let Err(e) = saved {
            warn!(action = action.name(), error = %e, "Failed to persist notifications");
            if self.inner.toast_on_storage_failure {
                self.inner
                    .bus
                    .publish(format!("Notifications could not be saved: {}", e), Kind::Error);
            }
            return Err(e.into());
        }
        Ok(())
    }
}

/// 通知中心构建器
pub struct NotificationCenterBuilder {
    repo: Arc<dyn NotificationRepository>,
    bus: Option<ToastBus>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    capacity: usize,
    toast_on_storage_failure: bool,
}

impl NotificationCenterBuilder {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self {
            repo,
            bus: None,
            ids: Arc::new(UuidGenerator),
            clock: Arc::new(SystemClock),
            capacity: MAX_NOTIFICATIONS,
            toast_on_storage_failure: true,
        }
    }

    /// 使用外部总线（默认新建一个）
    pub fn bus(mut self, bus: ToastBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 内存中保留的最大条数
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// 持久化失败时是否发 error toast
    pub fn toast_on_storage_failure(mut self, enable: bool) -> Self {
        self.toast_on_storage_failure = enable;
        self
    }

    /// 从仓库加载初始状态并构建
    pub async fn build(self) -> NotificationCenter {
        let mut initial = match self.repo.load().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "Failed to load notifications, starting empty");
                Vec::new()
            }
        };
        initial.truncate(self.capacity);
        info!(count = initial.len(), "Notification center ready");

        let (snapshots, _) = watch::channel(Arc::new(initial.clone()));
        NotificationCenter {
            inner: Arc::new(CenterInner {
                state: Mutex::new(initial),
                snapshots,
                repo: self.repo,
                bus: self.bus.unwrap_or_default(),
                ids: self.ids,
                clock: self.clock,
                capacity: self.capacity,
                toast_on_storage_failure: self.toast_on_storage_failure,
                disposed: AtomicBool::new(false),
            }),
        }
    }
}
