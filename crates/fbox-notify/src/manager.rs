use crate::message::{NotifyChannel, NotifyLevel, NotifyMessage};
use crate::notifier::{Notifier, NotifyResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// 通知管理器
///
/// 发送是尽力而为的：单个渠道失败只记录日志，不影响其它渠道和调用方。
pub struct NotifyManager {
    /// 通知器列表
    notifiers: Arc<RwLock<HashMap<NotifyChannel, Box<dyn Notifier>>>>,

    /// 最小通知级别
    min_level: NotifyLevel,
}

impl NotifyManager {
    pub fn new(min_level: NotifyLevel) -> Self {
        Self {
            notifiers: Arc::new(RwLock::new(HashMap::new())),
            min_level,
        }
    }

    /// 注册通知器
    pub async fn register(&self, channel: NotifyChannel, notifier: Box<dyn Notifier>) {
        let mut notifiers = self.notifiers.write().await;
        info!("Registered notifier: {}", notifier.name());
        notifiers.insert(channel, notifier);
    }

    /// 发送到指定渠道，返回是否送达
    pub async fn send(&self, channel: NotifyChannel, message: &NotifyMessage) -> bool {
        if !self.should_notify(message.level) {
            return false;
        }

        let notifiers = self.notifiers.read().await;
        match notifiers.get(&channel) {
            Some(notifier) if notifier.is_enabled() => {
                let result = notifier.send(message).await;
                log_result(notifier.name(), &message.title, result)
            }
            _ => false,
        }
    }

    /// 发送到所有渠道，返回送达的渠道数
    pub async fn broadcast(&self, message: &NotifyMessage) -> usize {
        if !self.should_notify(message.level) {
            return 0;
        }

        let notifiers = self.notifiers.read().await;
        let mut delivered = 0;

        for notifier in notifiers.values() {
            if notifier.is_enabled() {
                let result = notifier.send(message).await;
                if log_result(notifier.name(), &message.title, result) {
                    delivered += 1;
                }
            }
        }

        delivered
    }

    fn should_notify(&self, level: NotifyLevel) -> bool {
        level >= self.min_level
    }
}

fn log_result(name: &str, title: &str, result: anyhow::Result<NotifyResult>) -> bool {
    match result {
        Ok(result) if result.success => {
            info!("Notification sent via {}: {}", name, title);
            true
        }
        Ok(result) => {
            error!("Notification failed via {}: {}", name, result.message);
            false
        }
        Err(e) => {
            error!("Notification error via {}: {}", name, e);
            false
        }
    }
}

impl Default for NotifyManager {
    fn default() -> Self {
        Self::new(NotifyLevel::Info)
    }
}
