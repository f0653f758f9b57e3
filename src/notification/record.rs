//! 通知记录 - 持久化的数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::kind::Kind;

/// 通知 ID（创建时生成，永不复用）
pub type NotificationId = String;

/// 通知记录
///
/// `id` 和 `created_at` 由 [`NotificationCenter`](super::NotificationCenter) 生成，
/// 创建后不可变；只有 `read` 会被修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    /// 简短标题（必填）
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub kind: Kind,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    /// 自由格式 payload，核心不解释（例如 `route` 深链接）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl Notification {
    /// `data.route` 是字符串时返回深链接目标
    pub fn route(&self) -> Option<&str> {
        self.data.as_ref()?.get("route")?.as_str()
    }
}

/// 新建通知的输入（调用方不提供 id / createdAt / read）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub title: String,
    pub message: Option<String>,
    pub kind: Kind,
    pub data: Option<Map<String, Value>>,
}

impl NewNotification {
    pub fn new(title: impl Into<String>, kind: Kind) -> Self {
        Self {
            title: title.into(),
            message: None,
            kind,
            data: None,
        }
    }

    /// 设置正文
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 设置 data 中的一个字段
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// 设置深链接 `data.route`
    pub fn with_route(self, route: impl Into<String>) -> Self {
        let route: String = route.into();
        self.with_data("route", route)
    }

    /// 补全生成字段，得到一条未读记录
    pub fn into_record(self, id: NotificationId, created_at: DateTime<Utc>) -> Notification {
        Notification {
            id,
            title: self.title,
            message: self.message,
            kind: self.kind,
            created_at,
            read: false,
            data: self.data,
        }
    }
}
