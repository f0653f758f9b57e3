//! 通知命令 - list / add / read / unread / read-all / dismiss / clear
//!
//! 基于文件后端操作同一份通知数据；持久化失败时 error toast 输出到 stderr。

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Args;
use tracing::info;

use super::output::{format_json, format_notification_line, format_notification_list};
use crate::config::NotifyConfig;
use crate::notification::{Kind, NewNotification, NotificationCenter};
use crate::toast::{Subscription, Toast, ToastBus};

/// list 命令参数
#[derive(Args, Debug)]
pub struct ListArgs {
    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
    /// 只显示未读
    #[arg(long)]
    pub unread: bool,
}

/// add 命令参数
#[derive(Args, Debug)]
pub struct AddArgs {
    /// 标题
    #[arg(long, short)]
    pub title: String,
    /// 正文
    #[arg(long, short)]
    pub message: Option<String>,
    /// 类别: info, success, warning, error
    #[arg(long, short, default_value = "info")]
    pub kind: String,
    /// 深链接路由（写入 data.route）
    #[arg(long, short)]
    pub route: Option<String>,
    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 打开通知中心，并把总线上的 toast 打印到 stderr
pub async fn open_center(config: &NotifyConfig) -> (NotificationCenter, Subscription) {
    let bus = ToastBus::new();
    let printer = bus.subscribe(|t: &Toast| eprintln!("{} {}", t.kind.icon(), t.message));

    let center = NotificationCenter::builder(Arc::new(config.file_repository()))
        .bus(bus)
        .capacity(config.capacity)
        .toast_on_storage_failure(config.toast_on_storage_failure)
        .build()
        .await;
    (center, printer)
}

/// 处理 list 命令
pub async fn handle_list(args: ListArgs, config: &NotifyConfig) -> Result<()> {
    let (center, _printer) = open_center(config).await;
    let items: Vec<_> = center
        .items()
        .iter()
        .filter(|n| !args.unread || !n.read)
        .cloned()
        .collect();

    if args.json {
        println!("{}", format_json(&items));
    } else {
        println!("{}", format_notification_list(&items).trim_end());
    }
    Ok(())
}

/// 处理 add 命令
pub async fn handle_add(args: AddArgs, config: &NotifyConfig) -> Result<()> {
    let kind: Kind = args.kind.parse().map_err(|e: String| anyhow!(e))?;

    let mut new = NewNotification::new(args.title, kind);
    if let Some(message) = args.message {
        new = new.with_message(message);
    }
    if let Some(route) = args.route {
        new = new.with_route(route);
    }

    let (center, _printer) = open_center(config).await;
    let record = center.add(new).await?;
    info!(id = %record.id, kind = %record.kind, "Notification added");

    if args.json {
        println!("{}", format_json(&record));
    } else {
        println!("{}", format_notification_line(&record));
    }
    Ok(())
}

/// 单个 id 的变更操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOp {
    Read,
    Unread,
    Dismiss,
}

/// 处理 read / unread / dismiss 命令
pub async fn handle_record_op(op: RecordOp, id: &str, config: &NotifyConfig) -> Result<()> {
    let (center, _printer) = open_center(config).await;
    if center.get(id).is_none() {
        return Err(anyhow!("Notification not found: {}", id));
    }

    match op {
        RecordOp::Read => center.mark_read(id).await?,
        RecordOp::Unread => center.mark_unread(id).await?,
        RecordOp::Dismiss => center.dismiss(id).await?,
    }
    println!("✅ {:?} {}", op, id);
    Ok(())
}

/// 处理 read-all 命令
pub async fn handle_read_all(config: &NotifyConfig) -> Result<()> {
    let (center, _printer) = open_center(config).await;
    let unread = center.unread_count();
    center.mark_all_read().await?;
    println!("✅ Marked {} notifications as read", unread);
    Ok(())
}

/// 处理 clear 命令
pub async fn handle_clear(config: &NotifyConfig) -> Result<()> {
    let (center, _printer) = open_center(config).await;
    let count = center.items().len();
    center.clear_all().await?;
    println!("✅ Cleared {} notifications", count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config(dir: &std::path::Path) -> NotifyConfig {
        NotifyConfig {
            data_dir: Some(dir.to_path_buf()),
            ..NotifyConfig::default()
        }
    }

    #[tokio::test]
    async fn test_add_then_read_via_commands() {
        let temp = tempdir().unwrap();
        let config = test_config(temp.path());

        handle_add(
            AddArgs {
                title: "Low oxygen".to_string(),
                message: None,
                kind: "warning".to_string(),
                route: Some("/ponds/3".to_string()),
                json: false,
            },
            &config,
        )
        .await
        .unwrap();

        let (center, _p) = open_center(&config).await;
        let id = center.items()[0].id.clone();
        assert_eq!(center.items()[0].route(), Some("/ponds/3"));
        drop(center);

        handle_record_op(RecordOp::Read, &id, &config).await.unwrap();
        let (center, _p) = open_center(&config).await;
        assert_eq!(center.unread_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_id_and_bad_kind_are_errors() {
        let temp = tempdir().unwrap();
        let config = test_config(temp.path());

        assert!(handle_record_op(RecordOp::Dismiss, "missing", &config).await.is_err());

        let bad = AddArgs {
            title: "x".to_string(),
            message: None,
            kind: "critical".to_string(),
            route: None,
            json: true,
        };
        assert!(handle_add(bad, &config).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_command() {
        let temp = tempdir().unwrap();
        let config = test_config(temp.path());
        let (center, _p) = open_center(&config).await;
        center.add(NewNotification::new("a", Kind::Info)).await.unwrap();
        center.add(NewNotification::new("b", Kind::Info)).await.unwrap();

        handle_read_all(&config).await.unwrap();
        handle_clear(&config).await.unwrap();

        let (reopened, _p) = open_center(&config).await;
        assert!(reopened.items().is_empty());
    }
}
