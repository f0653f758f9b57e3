//! Output formatting for CLI commands

use serde::Serialize;

use crate::notification::Notification;

/// Format output as pretty JSON
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// 单行展示一条通知：`● ⚠️ Low oxygen - Pond 3  [id] 2026-05-01 06:30`
pub fn format_notification_line(n: &Notification) -> String {
    let marker = if n.read { " " } else { "●" };
    let mut line = format!("{} {} {}", marker, n.kind.icon(), n.title);
    if let Some(message) = &n.message {
        line.push_str(" - ");
        line.push_str(message);
    }
    line.push_str(&format!(
        "  [{}] {}",
        n.id,
        n.created_at.format("%Y-%m-%d %H:%M")
    ));
    if let Some(route) = n.route() {
        line.push_str(&format!(" -> {}", route));
    }
    line
}

/// 列表输出（空列表时给出提示）
pub fn format_notification_list(items: &[Notification]) -> String {
    if items.is_empty() {
        return "No notifications".to_string();
    }
    let unread = items.iter().filter(|n| !n.read).count();
    let mut out = format!("{} notifications ({} unread)\n", items.len(), unread);
    for n in items {
        out.push_str(&format_notification_line(n));
        out.push('\n');
    }
    out
}
