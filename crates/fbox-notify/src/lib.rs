pub mod error;
pub mod manager;
pub mod message;
pub mod notifier;
pub mod providers;
pub mod telegram;

pub use error::NotifyError;
pub use manager::NotifyManager;
pub use message::{NotifyChannel, NotifyLevel, NotifyMessage};
pub use notifier::{ChatTransport, Notifier, NotifyResult};
pub use providers::{ConsoleNotifier, TelegramNotifier};
pub use telegram::{BotCommand, Chat, IncomingMessage, TelegramBotConfig, TelegramClient, Update};
