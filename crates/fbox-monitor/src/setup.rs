//! 进程启动时的公共步骤

use anyhow::{anyhow, Result};
use fbox_config::FboxConfig;
use fbox_notify::TelegramBotConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化日志，`RUST_LOG` 未设置时使用 info
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// 由已校验的配置构造 Telegram 客户端配置
pub fn telegram_bot_config(config: &FboxConfig) -> Result<TelegramBotConfig> {
    let telegram = &config.telegram;
    let bot_token = telegram
        .bot_token
        .clone()
        .ok_or_else(|| anyhow!("telegram.bot_token is not set"))?;
    let chat_id = telegram
        .chat_id
        .clone()
        .ok_or_else(|| anyhow!("telegram.chat_id is not set"))?;

    Ok(TelegramBotConfig {
        api_base: telegram.api_base.clone(),
        bot_token: bot_token.trim().to_string(),
        chat_id: chat_id.trim().to_string(),
        send_timeout_secs: telegram.send_timeout_secs,
        upload_timeout_secs: telegram.upload_timeout_secs,
        poll_timeout_secs: telegram.poll_timeout_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telegram_bot_config() {
        let mut config = FboxConfig::default();
        assert!(telegram_bot_config(&config).is_err());

        config.telegram.bot_token = Some(" 123:abc ".into());
        config.telegram.chat_id = Some("-100".into());
        let bot = telegram_bot_config(&config).unwrap();
        assert_eq!(bot.bot_token, "123:abc");
        assert_eq!(bot.send_timeout_secs, 10);
        assert_eq!(bot.upload_timeout_secs, 30);
    }
}
