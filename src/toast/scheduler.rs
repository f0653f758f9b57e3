//! 定时任务抽象 - `schedule(delay, task) -> TimerHandle`
//!
//! - `TokioScheduler`: spawn 一个 sleep 任务，取消时 abort
//! - `ManualScheduler`: 由调用方 `advance` 推进时间，适合嵌入事件循环和测试

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::runtime::Handle;

/// 到期执行的回调
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// 可取消的定时器句柄；`cancel` 可重复调用
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// 无需取消动作的句柄
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_none()
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// 定时任务调度器
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;
}

/// 基于 tokio runtime 的调度器
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// 使用当前 runtime，不在 runtime 内时返回 None
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        TimerHandle::new(move || join.abort())
    }
}

struct ManualEntry {
    seq: u64,
    due: Duration,
    task: Task,
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    next_seq: u64,
    entries: Vec<ManualEntry>,
}

/// 手动推进时间的调度器
///
/// 同一时刻到期的任务按调度顺序执行；任务在锁外执行，可以在回调里再次调度。
#[derive(Default, Clone)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从创建起经过的虚拟时间
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// 尚未执行也未取消的任务数
    pub fn pending(&self) -> usize {
        self.lock().entries.len()
    }

    /// 推进虚拟时间并执行所有到期任务，返回执行数量
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.lock().now + by;
        let mut fired = 0;

        loop {
            let task = {
                let mut inner = self.lock();
                let next = inner
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.due <= target)
                    .min_by_key(|(_, e)| (e.due, e.seq))
                    .map(|(i, _)| i);

                match next {
                    Some(i) => {
                        let entry = inner.entries.remove(i);
                        inner.now = entry.due;
                        entry.task
                    }
                    None => {
                        inner.now = target;
                        break;
                    }
                }
            };
            task();
            fired += 1;
        }

        fired
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let seq = {
            let mut inner = self.lock();
            let seq = inner.next_seq;
            inner.next_seq += 1;
            let due = inner.now + delay;
            inner.entries.push(ManualEntry { seq, due, task });
            seq
        };

        let weak: Weak<Mutex<ManualInner>> = Arc::downgrade(&self.inner);
        TimerHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
                inner.entries.retain(|e| e.seq != seq);
            }
        })
    }
}
