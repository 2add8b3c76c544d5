use anyhow::Result;
use clap::Parser;
use fbox_bot::{bot_commands, BotPoller, CommandHandler};
use fbox_config::ConfigLoader;
use fbox_monitor::setup::{init_tracing, telegram_bot_config};
use fbox_notify::TelegramClient;
use fbox_storage::StateStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "FBOX Telegram command bot", long_about = None)]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config/fbox.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = Args::parse();
    info!("Starting fbox-bot");

    let config = ConfigLoader::with_file(&args.config)
        .from_process_env()
        .load()?;
    config.validate_telegram()?;

    let client = Arc::new(TelegramClient::new(telegram_bot_config(&config)?));
    if let Err(e) = client.set_my_commands(&bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    let store = StateStore::new(config.storage.data_dir.clone()).with_caps(
        config.storage.history_max_records,
        config.storage.alerts_max_records,
    );
    let handler = CommandHandler::new(
        store.clone(),
        config.units.iter().map(|u| u.name.clone()).collect(),
        config.storage.data_dir.clone(),
        config.schedule.check_interval_minutes,
    );
    let poller = BotPoller::new(
        client.clone(),
        handler,
        store,
        client.default_chat().to_string(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let schedule = config.schedule.clone();
    let polling = async { poller.run(&client, || schedule.now(), shutdown_rx).await };

    tokio::pin!(polling);
    tokio::select! {
        _ = &mut polling => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutting down");
            let _ = shutdown_tx.send(true);
            polling.await;
        }
    }

    Ok(())
}
