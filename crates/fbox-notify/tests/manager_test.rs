use anyhow::{anyhow, Result};
use async_trait::async_trait;
use fbox_notify::{
    ConsoleNotifier, Notifier, NotifyChannel, NotifyLevel, NotifyManager, NotifyMessage,
    NotifyResult,
};

struct BrokenNotifier;

#[async_trait]
impl Notifier for BrokenNotifier {
    async fn send(&self, _message: &NotifyMessage) -> Result<NotifyResult> {
        Err(anyhow!("connection reset"))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

#[tokio::test]
async fn test_failing_channel_does_not_block_others() {
    let manager = NotifyManager::new(NotifyLevel::Info);
    manager
        .register(NotifyChannel::Telegram, Box::new(BrokenNotifier))
        .await;
    manager
        .register(NotifyChannel::Console, Box::new(ConsoleNotifier))
        .await;

    let delivered = manager
        .broadcast(&NotifyMessage::critical("alert", "C01 offline"))
        .await;
    assert_eq!(delivered, 1);

    assert!(!manager.send(NotifyChannel::Telegram, &NotifyMessage::info("t", "x")).await);
}

#[tokio::test]
async fn test_level_filter() {
    let manager = NotifyManager::new(NotifyLevel::Critical);
    manager
        .register(NotifyChannel::Console, Box::new(ConsoleNotifier))
        .await;

    assert_eq!(manager.broadcast(&NotifyMessage::warning("w", "x")).await, 0);
    assert_eq!(manager.broadcast(&NotifyMessage::critical("c", "x")).await, 1);
}
