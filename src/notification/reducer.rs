//! 通知 reducer - 纯状态转换 `(state, action) -> state`
//!
//! 不做校验、不去重、不报错；输入状态不会被修改，每次返回新列表。
//! 容量上限不在这里处理，由存储层在 `save` 时截断。

use super::record::{Notification, NotificationId};

/// 通知动作
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// 插入到列表头部（最新在前）
    Add(Notification),
    MarkRead(NotificationId),
    MarkUnread(NotificationId),
    /// 全部标记为已读
    MarkAllRead,
    Dismiss(NotificationId),
    ClearAll,
}

impl Action {
    /// 日志用的动作名
    pub fn name(&self) -> &'static str {
        match self {
            Action::Add(_) => "ADD",
            Action::MarkRead(_) => "MARK_READ",
            Action::MarkUnread(_) => "MARK_UNREAD",
            Action::MarkAllRead => "MARK_ALL_READ",
            Action::Dismiss(_) => "DISMISS",
            Action::ClearAll => "CLEAR_ALL",
        }
    }
}

/// 应用一个动作，返回新状态
pub fn reduce(state: &[Notification], action: &Action) -> Vec<Notification> {
    match action {
        Action::Add(notification) => {
            let mut next = Vec::with_capacity(state.len() + 1);
            next.push(notification.clone());
            next.extend_from_slice(state);
            next
        }
        Action::MarkRead(id) => set_read(state, Some(id), true),
        Action::MarkUnread(id) => set_read(state, Some(id), false),
        Action::MarkAllRead => set_read(state, None, true),
        Action::Dismiss(id) => state.iter().filter(|n| &n.id != id).cloned().collect(),
        Action::ClearAll => Vec::new(),
    }
}

/// `target` 为 None 时作用于全部记录
fn set_read(
    state: &[Notification],
    target: Option<&NotificationId>,
    read: bool,
) -> Vec<Notification> {
    state
        .iter()
        .map(|n| {
            if target.map_or(true, |id| &n.id == id) {
                Notification { read, ..n.clone() }
            } else {
                n.clone()
            }
        })
        .collect()
}
