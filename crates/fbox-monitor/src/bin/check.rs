use anyhow::Result;
use clap::Parser;
use fbox_api::FboxClient;
use fbox_config::{ConfigLoader, MonitorProfile};
use fbox_monitor::setup::{init_tracing, telegram_bot_config};
use fbox_monitor::CheckService;
use fbox_notify::{
    ConsoleNotifier, NotifyChannel, NotifyLevel, NotifyManager, TelegramClient, TelegramNotifier,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "FBOX fleet check", long_about = None)]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config/fbox.toml")]
    config: PathBuf,

    /// 监控模式：container 或 tank
    #[arg(short, long, default_value = "container")]
    profile: MonitorProfile,

    /// 按检查间隔常驻运行，直到 Ctrl-C
    #[arg(short, long)]
    watch: bool,

    /// 只输出到日志，不发送 Telegram、不写状态文件
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = Args::parse();
    info!(profile = ?args.profile, watch = args.watch, dry_run = args.dry_run, "Starting fbox-check");

    let config = ConfigLoader::with_file(&args.config)
        .from_process_env()
        .load()?;

    if args.dry_run {
        config.validate_api()?;
    } else {
        config.validate()?;
    }

    let notify_manager = Arc::new(NotifyManager::new(NotifyLevel::Info));
    if args.dry_run {
        notify_manager
            .register(NotifyChannel::Console, Box::new(ConsoleNotifier))
            .await;
    } else {
        let telegram = Arc::new(TelegramClient::new(telegram_bot_config(&config)?));
        let chat_id = telegram.default_chat().to_string();
        notify_manager
            .register(
                NotifyChannel::Telegram,
                Box::new(TelegramNotifier::new(telegram, chat_id)),
            )
            .await;
    }

    let source = Arc::new(FboxClient::new(&config.api)?);
    let service = Arc::new(
        CheckService::new(&config, args.profile, source, notify_manager).read_only(args.dry_run),
    );

    if !args.watch {
        service.run_cycle(config.schedule.now()).await;
        return Ok(());
    }

    let handle = service.start_task();
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    handle.shutdown().await;

    Ok(())
}
