//! toast 命令 - 挂载一个 toast 宿主，发布消息并打印可见队列直到全部过期

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Args;

use crate::config::NotifyConfig;
use crate::notification::Kind;
use crate::toast::{Toast, ToastBus, ToastHost, TokioScheduler};

/// toast 命令参数
#[derive(Args, Debug)]
pub struct ToastArgs {
    /// 消息（可以多条，依次发布）
    #[arg(required = true)]
    pub messages: Vec<String>,
    /// 类别: info, success, warning, error
    #[arg(long, short, default_value = "info")]
    pub kind: String,
    /// 显示时长（毫秒），默认取配置
    #[arg(long)]
    pub duration_ms: Option<u64>,
}

fn format_visible(visible: &[Toast]) -> String {
    if visible.is_empty() {
        return "(no toasts)".to_string();
    }
    visible
        .iter()
        .map(|t| format!("{} {}", t.kind.icon(), t.message))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// 处理 toast 命令
pub async fn handle_toast(args: ToastArgs, config: &NotifyConfig) -> Result<()> {
    let kind: Kind = args.kind.parse().map_err(|e: String| anyhow!(e))?;
    let scheduler = TokioScheduler::try_current()
        .ok_or_else(|| anyhow!("toast command requires a tokio runtime"))?;

    let mut host_config = config.toast_host_config();
    if let Some(ms) = args.duration_ms {
        host_config.duration = Duration::from_millis(ms);
    }

    let bus = ToastBus::new();
    let host = ToastHost::mount(&bus, Arc::new(scheduler), host_config);
    let mut rx = host.subscribe();

    for message in &args.messages {
        bus.publish(message.clone(), kind);
    }
    println!("{}", format_visible(&rx.borrow_and_update()));

    while rx.changed().await.is_ok() {
        let visible = rx.borrow_and_update().clone();
        println!("{}", format_visible(&visible));
        if visible.is_empty() {
            break;
        }
    }

    host.dispose();
    bus.dispose();
    Ok(())
}
