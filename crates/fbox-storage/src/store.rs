use crate::error::StoreError;
use crate::files::StoreFile;
use chrono::{DateTime, FixedOffset};
use fbox_types::{AlertRecord, HistoryRecord, StateMap};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, warn};

/// 默认历史上限：7 天 × 288 次检查
pub const DEFAULT_HISTORY_CAP: usize = 2016;
/// 默认告警历史上限
pub const DEFAULT_ALERTS_CAP: usize = 3000;

/// JSON 状态存储
///
/// 每个实体一个文件，整文件原子替换。读失败退回默认值，写失败只记录日志，
/// 因此检查周期不会因持久化问题中断。
#[derive(Debug, Clone)]
pub struct StateStore {
    /// 数据目录
    base_dir: PathBuf,
    /// 文件名前缀（油箱模式为 `tank_`）
    prefix: String,
    history_cap: usize,
    alerts_cap: usize,
}

impl StateStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            prefix: String::new(),
            history_cap: DEFAULT_HISTORY_CAP,
            alerts_cap: DEFAULT_ALERTS_CAP,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_caps(mut self, history_cap: usize, alerts_cap: usize) -> Self {
        self.history_cap = history_cap.max(1);
        self.alerts_cap = alerts_cap.max(1);
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 文件完整路径
    pub fn path_of(&self, file: StoreFile) -> PathBuf {
        self.base_dir
            .join(format!("{}{}", self.prefix, file.file_name()))
    }

    // ---- 快照 ----

    /// 读取上次快照；文件缺失或损坏时返回空表
    pub async fn load_state(&self) -> StateMap {
        self.read_or_default(StoreFile::State).await
    }

    /// 整体覆盖快照
    pub async fn save_state(&self, state: &StateMap) {
        if let Err(e) = self.write_json(StoreFile::State, state).await {
            error!(error = %e, "Failed to save state");
        }
    }

    // ---- 历史 ----

    pub async fn load_history(&self) -> Vec<HistoryRecord> {
        self.read_or_default(StoreFile::History).await
    }

    /// 追加一条历史快照，超出上限时淘汰最旧记录
    pub async fn append_history(&self, state: &StateMap, now: DateTime<FixedOffset>) {
        let mut history = self.load_history().await;
        history.push(HistoryRecord {
            timestamp: now,
            data: state.clone(),
        });
        trim_front(&mut history, self.history_cap);

        match self.write_json(StoreFile::History, &history).await {
            Ok(()) => debug!(records = history.len(), "History appended"),
            Err(e) => error!(error = %e, "Failed to append history"),
        }
    }

    pub async fn load_alert_history(&self) -> Vec<AlertRecord> {
        self.read_or_default(StoreFile::AlertsHistory).await
    }

    /// 追加本周期的告警文本；空列表不写入
    pub async fn append_alerts(&self, alerts: &[String], now: DateTime<FixedOffset>) {
        if alerts.is_empty() {
            return;
        }

        let mut history = self.load_alert_history().await;
        history.push(AlertRecord {
            timestamp: now,
            alerts: alerts.to_vec(),
        });
        trim_front(&mut history, self.alerts_cap);

        match self.write_json(StoreFile::AlertsHistory, &history).await {
            Ok(()) => debug!(records = history.len(), "Alert history appended"),
            Err(e) => error!(error = %e, "Failed to append alert history"),
        }
    }

    // ---- 报告时间戳 ----

    /// 上次整点报告时间（原始字符串，由调度器解析）
    pub async fn last_full_report(&self) -> Option<String> {
        self.read_scalar(StoreFile::LastFullReport)
            .await
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub async fn mark_full_report_sent(&self, now: DateTime<FixedOffset>) {
        self.write_scalar(StoreFile::LastFullReport, json!(now.to_rfc3339()))
            .await;
    }

    pub async fn last_weekly_report(&self) -> Option<String> {
        self.read_scalar(StoreFile::LastWeeklyReport)
            .await
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub async fn mark_weekly_report_sent(&self, now: DateTime<FixedOffset>) {
        self.write_scalar(StoreFile::LastWeeklyReport, json!(now.to_rfc3339()))
            .await;
    }

    // ---- 机器人更新偏移 ----

    pub async fn last_update_id(&self) -> Option<i64> {
        self.read_scalar(StoreFile::LastUpdate)
            .await
            .and_then(|v| v.as_i64())
    }

    pub async fn save_last_update_id(&self, update_id: i64) {
        self.write_scalar(StoreFile::LastUpdate, json!(update_id))
            .await;
    }

    // ---- 内部 ----

    async fn read_or_default<T: DeserializeOwned + Default>(&self, file: StoreFile) -> T {
        match self.read_json(file).await {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                warn!(error = %e, "Unreadable store file, using default");
                T::default()
            }
        }
    }

    async fn read_scalar(&self, file: StoreFile) -> Option<Value> {
        let key = file.scalar_key()?;
        let value: Value = self.read_or_default(file).await;
        value.get(key).cloned().filter(|v| !v.is_null())
    }

    async fn write_scalar(&self, file: StoreFile, value: Value) {
        let Some(key) = file.scalar_key() else {
            return;
        };
        let mut object = serde_json::Map::new();
        object.insert(key.to_string(), value);
        if let Err(e) = self.write_json(file, &Value::Object(object)).await {
            error!(file = file.file_name(), error = %e, "Failed to write timestamp file");
        }
    }

    /// 读取 JSON；文件不存在返回 `Ok(None)`
    async fn read_json<T: DeserializeOwned>(&self, file: StoreFile) -> Result<Option<T>, StoreError> {
        let path = self.path_of(file);

        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|source| StoreError::Json { path, source })
    }

    /// 先写同目录临时文件再改名，读者只会看到旧文件或新文件
    async fn write_json<T: Serialize + ?Sized>(&self, file: StoreFile, value: &T) -> Result<(), StoreError> {
        let path = self.path_of(file);
        let tmp_path = self.base_dir.join(format!(
            ".{}{}.{}.tmp",
            self.prefix,
            file.file_name(),
            std::process::id()
        ));

        let data = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        self.ensure_dir().await?;

        fs::write(&tmp_path, &data)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;

        if let Err(source) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io { path, source });
        }

        debug!(path = %path.display(), size = data.len(), "Store file written");
        Ok(())
    }

    async fn ensure_dir(&self) -> Result<(), StoreError> {
        if !self.base_dir.exists() {
            fs::create_dir_all(&self.base_dir)
                .await
                .map_err(|source| StoreError::Io {
                    path: self.base_dir.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// 只保留最后 `cap` 条
fn trim_front<T>(records: &mut Vec<T>, cap: usize) {
    if records.len() > cap {
        let excess = records.len() - cap;
        records.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fbox_types::UnitSnapshot;
    use tempfile::TempDir;

    fn at(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 6, hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_trim_front() {
        let mut records = vec![1, 2, 3, 4, 5];
        trim_front(&mut records, 3);
        assert_eq!(records, vec![3, 4, 5]);

        trim_front(&mut records, 10);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_prefixed_paths() {
        let store = StateStore::new("/data").with_prefix("tank_");
        assert_eq!(
            store.path_of(StoreFile::State),
            PathBuf::from("/data/tank_fbox_state.json")
        );
    }

    #[tokio::test]
    async fn test_missing_files_yield_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::new(temp_dir.path());

        assert!(store.load_state().await.is_empty());
        assert!(store.load_history().await.is_empty());
        assert!(store.last_full_report().await.is_none());
        assert!(store.last_update_id().await.is_none());
    }

    #[tokio::test]
    async fn test_report_timestamp_file_format() {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::new(temp_dir.path());

        store.mark_full_report_sent(at(10)).await;

        let raw = std::fs::read_to_string(temp_dir.path().join("last_report_time.json")).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["last_report_time"], "2025-01-06T10:00:00-03:00");
        assert_eq!(
            store.last_full_report().await.as_deref(),
            Some("2025-01-06T10:00:00-03:00")
        );
    }

    #[tokio::test]
    async fn test_empty_alert_list_not_appended() {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::new(temp_dir.path());

        store.append_alerts(&[], at(10)).await;
        assert!(!store.path_of(StoreFile::AlertsHistory).exists());
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::new(temp_dir.path());

        let mut state = StateMap::new();
        state.insert("C01".into(), UnitSnapshot::offline(0));
        store.save_state(&state).await;

        let names: Vec<String> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["fbox_state.json".to_string()]);
    }
}
