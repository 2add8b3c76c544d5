use crate::handler::{CommandHandler, Reply};
use chrono::{DateTime, FixedOffset};
use fbox_notify::{ChatTransport, TelegramClient, Update};
use fbox_storage::StateStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// 拉取失败后的等待时间
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// 消息轮询与分发
///
/// 只响应私聊或配置的会话，回复发到消息来源会话。
/// 群组消息必须以 / 开头，私聊可以省略。
/// 每条更新处理前先持久化 update id，重启后不会重复处理。
pub struct BotPoller {
    transport: Arc<dyn ChatTransport>,
    handler: CommandHandler,
    store: StateStore,
    allowed_chat: String,
}

impl BotPoller {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        handler: CommandHandler,
        store: StateStore,
        allowed_chat: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            handler,
            store,
            allowed_chat: allowed_chat.into(),
        }
    }

    fn is_allowed(&self, update: &Update) -> bool {
        update
            .message
            .as_ref()
            .map(|m| m.chat.is_private() || m.chat.id.to_string() == self.allowed_chat)
            .unwrap_or(false)
    }

    /// 处理一批更新，返回处理的命令数
    pub async fn process_updates(&self, updates: Vec<Update>, now: DateTime<FixedOffset>) -> usize {
        let mut handled = 0;

        for update in updates {
            self.store.save_last_update_id(update.update_id).await;

            if !self.is_allowed(&update) {
                debug!(update_id = update.update_id, "Ignoring update from foreign chat");
                continue;
            }

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
            else {
                continue;
            };

            // 群组里只响应 / 开头的命令，普通聊天不回复
            if !message.chat.is_private() && !text.starts_with('/') {
                debug!(update_id = update.update_id, "Ignoring plain group message");
                continue;
            }

            let chat_id = message.chat.id.to_string();
            info!(chat_id = %chat_id, text = %text, "Command received");

            for reply in self.handler.handle_text(text, now).await {
                self.deliver(&chat_id, reply).await;
            }
            handled += 1;
        }

        handled
    }

    async fn deliver(&self, chat_id: &str, reply: Reply) {
        let result = match &reply {
            Reply::Text(text) => self.transport.send_text(chat_id, text).await,
            Reply::File { path, caption } => {
                self.transport
                    .send_file(chat_id, path, Some(caption.as_str()))
                    .await
            }
        };

        if let Err(e) = result {
            warn!(chat_id = %chat_id, error = %e, "Failed to deliver reply");
        }
    }

    /// 长轮询直到收到关闭信号
    pub async fn run<F>(
        &self,
        client: &TelegramClient,
        clock: F,
        mut shutdown_rx: watch::Receiver<bool>,
    ) where
        F: Fn() -> DateTime<FixedOffset>,
    {
        info!("Bot polling started");

        loop {
            let offset = self.store.last_update_id().await.map(|id| id + 1);

            tokio::select! {
                result = client.get_updates(offset) => match result {
                    Ok(updates) if updates.is_empty() => {}
                    Ok(updates) => {
                        let handled = self.process_updates(updates, clock()).await;
                        debug!(handled, "Updates processed");
                    }
                    Err(e) => {
                        warn!(error = %e, "getUpdates failed, retrying");
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                },
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Bot polling stopped");
    }
}
