use chrono::{DateTime, Utc};
use fbox_types::AlertSeverity;
use serde::{Deserialize, Serialize};

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// 报告、命令回复
    Info,
    /// 警告
    Warning,
    /// 严重
    Critical,
}

impl From<AlertSeverity> for NotifyLevel {
    fn from(severity: AlertSeverity) -> Self {
        match severity {
            AlertSeverity::Warning => NotifyLevel::Warning,
            AlertSeverity::Critical => NotifyLevel::Critical,
        }
    }
}

/// 通知渠道
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotifyChannel {
    Telegram,
    /// 仅写日志（演练模式）
    Console,
}

/// 通知消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyMessage {
    /// 标题，只用于日志
    pub title: String,

    /// 发送给操作员的正文
    pub content: String,

    pub level: NotifyLevel,

    pub timestamp: DateTime<Utc>,
}

impl NotifyMessage {
    pub fn new(title: impl Into<String>, content: impl Into<String>, level: NotifyLevel) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            level,
            timestamp: Utc::now(),
        }
    }

    pub fn info(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(title, content, NotifyLevel::Info)
    }

    pub fn warning(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(title, content, NotifyLevel::Warning)
    }

    pub fn critical(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(title, content, NotifyLevel::Critical)
    }
}
