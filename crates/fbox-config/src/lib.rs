pub mod global;
pub mod loader;
pub mod thresholds;

pub use global::{
    ApiConfig, ConfigError, FboxConfig, MonitorProfile, ScheduleConfig, StorageConfig,
    TelegramConfig, UnitConfig,
};
pub use loader::ConfigLoader;
pub use thresholds::{AlertThresholds, ThresholdOverrides, ThresholdsConfig};
