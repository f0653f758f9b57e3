//! AquaDash Notify CLI
//!
//! 养殖运营看板通知核心的命令行入口

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use aquadash_notify::cli::{
    handle_add, handle_clear, handle_list, handle_read_all, handle_record_op, handle_toast, AddArgs,
    ListArgs, RecordOp, ToastArgs,
};
use aquadash_notify::NotifyConfig;

#[derive(Parser)]
#[command(name = "aqn")]
#[command(about = "AquaDash Notify - 通知与 toast 管理")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出通知（最新在前）
    List(ListArgs),
    /// 新建通知
    Add(AddArgs),
    /// 标记为已读
    Read {
        /// 通知 ID
        id: String,
    },
    /// 标记为未读
    Unread {
        /// 通知 ID
        id: String,
    },
    /// 全部标记为已读
    ReadAll,
    /// 删除一条通知
    Dismiss {
        /// 通知 ID
        id: String,
    },
    /// 清空所有通知
    Clear,
    /// 发布 toast 并显示直到过期
    Toast(ToastArgs),
    /// 打印当前生效的配置
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化 tracing 日志系统
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug aqn toast "Pond 3 aerator on"
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("aquadash_notify=info,aqn=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let config = NotifyConfig::load()?;

    match cli.command {
        Commands::List(args) => handle_list(args, &config).await?,
        Commands::Add(args) => handle_add(args, &config).await?,
        Commands::Read { id } => handle_record_op(RecordOp::Read, &id, &config).await?,
        Commands::Unread { id } => handle_record_op(RecordOp::Unread, &id, &config).await?,
        Commands::ReadAll => handle_read_all(&config).await?,
        Commands::Dismiss { id } => handle_record_op(RecordOp::Dismiss, &id, &config).await?,
        Commands::Clear => handle_clear(&config).await?,
        Commands::Toast(args) => handle_toast(args, &config).await?,
        Commands::Config => {
            println!("# {}", NotifyConfig::path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            println!("# data dir: {}", config.data_dir().display());
        }
    }

    Ok(())
}
