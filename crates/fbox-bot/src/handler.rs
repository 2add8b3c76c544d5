use crate::commands::{help_text, unknown_command_text, Command};
use chrono::{DateTime, FixedOffset};
use fbox_monitor::report::{alert_summary, weekly_digest};
use fbox_monitor::{aggregate, export_alerts_csv};
use fbox_storage::StateStore;
use std::path::PathBuf;
use tracing::{error, info};

/// 一条回复
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    File { path: PathBuf, caption: String },
}

impl Reply {
    fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}

/// 命令处理：只读取状态文件，不发送任何东西
pub struct CommandHandler {
    store: StateStore,
    units: Vec<String>,
    export_dir: PathBuf,
    check_interval_minutes: u64,
}

impl CommandHandler {
    pub fn new(
        store: StateStore,
        units: Vec<String>,
        export_dir: PathBuf,
        check_interval_minutes: u64,
    ) -> Self {
        Self {
            store,
            units,
            export_dir,
            check_interval_minutes,
        }
    }

    /// 处理一条消息文本；无法识别的命令返回提示
    pub async fn handle_text(&self, text: &str, now: DateTime<FixedOffset>) -> Vec<Reply> {
        match Command::parse(text) {
            Some(command) => self.handle(command, now).await,
            None => vec![Reply::Text(unknown_command_text(text))],
        }
    }

    pub async fn handle(&self, command: Command, now: DateTime<FixedOffset>) -> Vec<Reply> {
        info!(?command, "Handling command");

        match command {
            Command::Summary => {
                let history = self.store.load_alert_history().await;
                vec![Reply::Text(alert_summary(&history))]
            }
            Command::Export { days } => self.export(days, now).await,
            Command::Weekly => {
                let history = self.store.load_history().await;
                let stats = aggregate(&history);
                vec![Reply::Text(weekly_digest(
                    &stats,
                    now,
                    self.check_interval_minutes,
                ))]
            }
            Command::Help => vec![Reply::Text(help_text())],
        }
    }

    async fn export(&self, days: u32, now: DateTime<FixedOffset>) -> Vec<Reply> {
        let period = period_label(days);
        let mut replies = vec![Reply::Text(format!("⏳ Building alert export ({})...", period))];

        let history = self.store.load_alert_history().await;
        match export_alerts_csv(&history, days, now, &self.export_dir, &self.units) {
            Ok(Some(path)) => {
                replies.push(Reply::File {
                    path: path.clone(),
                    caption: format!("📊 Alert export - {}", period),
                });
                replies.push(Reply::text(format!("✅ Export saved to: {}", path.display())));
            }
            Ok(None) => replies.push(Reply::text(format!("📊 No alerts recorded in {}.", period))),
            Err(e) => {
                error!(error = %e, days, "Alert export failed");
                replies.push(Reply::text("❌ Failed to build the export."));
            }
        }

        replies
    }
}

fn period_label(days: u32) -> String {
    match days {
        0 => "full history".to_string(),
        1 => "last day".to_string(),
        n => format!("last {} days", n),
    }
}
