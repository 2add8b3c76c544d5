use crate::thresholds::{AlertThresholds, ThresholdsConfig};
use chrono::{DateTime, FixedOffset, Offset, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// 配置错误（启动时致命）
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required credential: {0}")]
    MissingCredential(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// 全局配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FboxConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// 被监控的单元
    #[serde(default = "default_units")]
    pub units: Vec<UnitConfig>,

    #[serde(default)]
    pub thresholds: ThresholdsConfig,
}

impl Default for FboxConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            telegram: TelegramConfig::default(),
            storage: StorageConfig::default(),
            schedule: ScheduleConfig::default(),
            units: default_units(),
            thresholds: ThresholdsConfig::default(),
        }
    }
}

impl FboxConfig {
    /// 检查监控进程运行所需的凭据
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_telegram()?;
        self.validate_api()
    }

    /// 只检查厂商 API 凭据（演练模式不需要 Telegram）
    pub fn validate_api(&self) -> Result<(), ConfigError> {
        if is_blank(&self.api.ssid) {
            return Err(ConfigError::MissingCredential("api.ssid"));
        }
        if is_blank(&self.api.admin_token) {
            return Err(ConfigError::MissingCredential("api.admin_token"));
        }

        self.validate_common()
    }

    /// 命令机器人只需要 Telegram 凭据
    pub fn validate_telegram(&self) -> Result<(), ConfigError> {
        if is_blank(&self.telegram.bot_token) {
            return Err(ConfigError::MissingCredential("telegram.bot_token"));
        }
        if is_blank(&self.telegram.chat_id) {
            return Err(ConfigError::MissingCredential("telegram.chat_id"));
        }
        Ok(())
    }

    fn validate_common(&self) -> Result<(), ConfigError> {
        if self.units.is_empty() {
            return Err(ConfigError::Invalid("at least one unit must be configured".into()));
        }
        if self.storage.history_max_records == 0 || self.storage.alerts_max_records == 0 {
            return Err(ConfigError::Invalid("history caps must be greater than 0".into()));
        }
        if self.schedule.utc_offset().is_none() {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_hours out of range: {}",
                self.schedule.utc_offset_hours
            )));
        }
        Ok(())
    }

    /// 按监控模式取阈值（预设 + 覆盖）
    pub fn thresholds_for(&self, profile: MonitorProfile) -> AlertThresholds {
        match profile {
            MonitorProfile::Container => self.thresholds.container.apply(AlertThresholds::container()),
            MonitorProfile::Tank => self.thresholds.tank.apply(AlertThresholds::tank()),
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

/// 厂商 API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub area_id: String,
    pub timeout_secs: u64,
    /// 详情接口候选路径，按顺序尝试
    pub detail_paths: Vec<String>,
    /// 功率接口候选路径，按顺序尝试
    pub power_paths: Vec<String>,
    pub ssid: Option<String>,
    pub admin_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://america.fboxdata.com".to_string(),
            area_id: "10000013".to_string(),
            timeout_secs: 30,
            detail_paths: [
                "api/index/fbox.boxlist/detail",
                "api/index/fbox.boxdetail/detail",
                "api/index/fbox.boxinfo/detail",
                "api/index/fbox.box/detail",
                "api/index/fbox.boxlist/index",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            power_paths: [
                "api/index/fbox.boxlist/getelectricity",
                "api/index/fbox.electricity/getelectricity",
                "api/index/fbox.power/getelectricity",
                "api/index/fbox.elec/getelectricity",
                "api/index/fbox.boxdetail/getelectricity",
                "api/index/fbox.boxlist/electricity",
                "api/index/fbox.electricity/index",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            ssid: None,
            admin_token: None,
        }
    }
}

/// Telegram 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_base: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub send_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    /// getUpdates 长轮询时长
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            bot_token: None,
            chat_id: None,
            send_timeout_secs: 10,
            upload_timeout_secs: 30,
            poll_timeout_secs: 30,
        }
    }
}

/// 状态文件存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// 历史快照上限（7 天 × 每天 288 次检查）
    pub history_max_records: usize,
    /// 告警历史上限
    pub alerts_max_records: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            history_max_records: 2016,
            alerts_max_records: 3000,
        }
    }
}

/// 检查与报告节奏
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub check_interval_minutes: u64,
    pub full_report_interval_minutes: i64,
    pub weekly_report_enabled: bool,
    pub weekly_report_day: Weekday,
    pub weekly_min_gap_hours: i64,
    /// 本地时区相对 UTC 的小时数（America/Asuncion 为 -3）
    pub utc_offset_hours: i32,
    /// 舰队无变化时是否仍发送整点报告
    pub report_unchanged: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            check_interval_minutes: 5,
            full_report_interval_minutes: 60,
            weekly_report_enabled: true,
            weekly_report_day: Weekday::Mon,
            weekly_min_gap_hours: 144,
            utc_offset_hours: -3,
            report_unchanged: false,
        }
    }
}

impl ScheduleConfig {
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours.checked_mul(3600)?)
    }

    /// 当前本地时间；偏移无效时退回 UTC
    pub fn now(&self) -> DateTime<FixedOffset> {
        let offset = self.utc_offset().unwrap_or_else(|| Utc.fix());
        Utc::now().with_timezone(&offset)
    }
}

/// 单元定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConfig {
    pub name: String,
    pub id: u32,
}

fn default_units() -> Vec<UnitConfig> {
    vec![
        UnitConfig {
            name: "C01".to_string(),
            id: 290,
        },
        UnitConfig {
            name: "C02".to_string(),
            id: 291,
        },
    ]
}

/// 监控模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorProfile {
    /// 集装箱：在线状态、矿机、算力、功率
    #[default]
    Container,
    /// 油箱：液位、流量、压力、泵与过滤器
    Tank,
}

impl MonitorProfile {
    /// 状态文件名前缀
    pub fn file_prefix(&self) -> &'static str {
        match self {
            MonitorProfile::Container => "",
            MonitorProfile::Tank => "tank_",
        }
    }
}

impl FromStr for MonitorProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "container" => Ok(MonitorProfile::Container),
            "tank" => Ok(MonitorProfile::Tank),
            other => Err(format!("unknown profile: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_credentials() -> FboxConfig {
        let mut config = FboxConfig::default();
        config.telegram.bot_token = Some("123:abc".into());
        config.telegram.chat_id = Some("-100".into());
        config.api.ssid = Some("ssid".into());
        config.api.admin_token = Some("token".into());
        config
    }

    #[test]
    fn test_default_config() {
        let config = FboxConfig::default();
        assert_eq!(config.units.len(), 2);
        assert_eq!(config.units[0].id, 290);
        assert_eq!(config.schedule.weekly_report_day, Weekday::Mon);
        assert_eq!(config.storage.history_max_records, 2016);
        assert_eq!(config.api.detail_paths.len(), 5);
        assert_eq!(config.api.power_paths.len(), 7);
    }

    #[test]
    fn test_validate_requires_credentials() {
        let config = FboxConfig::default();
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingCredential("telegram.bot_token"))
        );

        let mut config = with_credentials();
        config.api.admin_token = Some("  ".into());
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingCredential("api.admin_token"))
        );

        assert!(with_credentials().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_offset() {
        let mut config = with_credentials();
        config.schedule.utc_offset_hours = 30;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_profile_serde_name() {
        assert_eq!(serde_json::to_string(&MonitorProfile::Tank).unwrap(), "\"tank\"");
        let profile: MonitorProfile = serde_json::from_str("\"container\"").unwrap();
        assert_eq!(profile, MonitorProfile::Container);
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!("Tank".parse::<MonitorProfile>(), Ok(MonitorProfile::Tank));
        assert_eq!(MonitorProfile::Tank.file_prefix(), "tank_");
        assert!("pool".parse::<MonitorProfile>().is_err());
    }

    #[test]
    fn test_thresholds_for_profile() {
        let mut config = FboxConfig::default();
        config.thresholds.tank.temp_warning = Some(50.0);

        assert_eq!(config.thresholds_for(MonitorProfile::Container).temp_critical, 55.0);
        let tank = config.thresholds_for(MonitorProfile::Tank);
        assert_eq!(tank.temp_critical, 58.0);
        assert_eq!(tank.temp_warning, Some(50.0));
    }
}
