pub mod commands;
pub mod handler;
pub mod poller;

pub use commands::{bot_commands, help_text, Command};
pub use handler::{CommandHandler, Reply};
pub use poller::BotPoller;
