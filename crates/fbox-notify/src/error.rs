use thiserror::Error;

/// 通知发送错误
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error on {method}: {description}")]
    Api { method: String, description: String },

    #[error("Cannot read attachment: {0}")]
    Io(#[from] std::io::Error),

    #[error("Channel not supported: {0}")]
    Unsupported(String),
}
