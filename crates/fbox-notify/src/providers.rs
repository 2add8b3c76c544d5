use crate::message::NotifyMessage;
use crate::notifier::{ChatTransport, Notifier, NotifyResult};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Telegram 通知
// ============================================================================

pub struct TelegramNotifier {
    transport: Arc<dyn ChatTransport>,
    /// 告警会话
    chat_id: String,
    enabled: bool,
}

impl TelegramNotifier {
    pub fn new(transport: Arc<dyn ChatTransport>, chat_id: impl Into<String>) -> Self {
        Self {
            transport,
            chat_id: chat_id.into(),
            enabled: true,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &NotifyMessage) -> Result<NotifyResult> {
        match self.transport.send_text(&self.chat_id, &message.content).await {
            Ok(()) => Ok(NotifyResult::success()),
            Err(e) => Ok(NotifyResult::failure(format!("Telegram send failed: {}", e))),
        }
    }

    fn name(&self) -> &str {
        "telegram"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

// ============================================================================
// 控制台通知（演练模式，只写日志）
// ============================================================================

#[derive(Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, message: &NotifyMessage) -> Result<NotifyResult> {
        info!(
            title = %message.title,
            level = ?message.level,
            "\n{}",
            message.content
        );
        Ok(NotifyResult::success())
    }

    fn name(&self) -> &str {
        "console"
    }
}
