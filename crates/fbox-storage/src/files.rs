/// 持久化文件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFile {
    State,
    History,
    AlertsHistory,
    LastFullReport,
    LastWeeklyReport,
    LastUpdate,
}

impl StoreFile {
    pub fn file_name(&self) -> &'static str {
        match self {
            StoreFile::State => "fbox_state.json",
            StoreFile::History => "fbox_history.json",
            StoreFile::AlertsHistory => "fbox_alerts_history.json",
            StoreFile::LastFullReport => "last_report_time.json",
            StoreFile::LastWeeklyReport => "last_weekly_report.json",
            StoreFile::LastUpdate => "last_telegram_update.json",
        }
    }

    /// 单值文件中的键名
    pub fn scalar_key(&self) -> Option<&'static str> {
        match self {
            StoreFile::LastFullReport => Some("last_report_time"),
            StoreFile::LastWeeklyReport => Some("last_weekly_report"),
            StoreFile::LastUpdate => Some("last_update_id"),
            _ => None,
        }
    }
}
