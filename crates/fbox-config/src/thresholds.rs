use serde::{Deserialize, Serialize};

/// 告警阈值
///
/// 可选字段为 `None` 时表示该档位不启用。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// 油温严重阈值（°C，>=）
    pub temp_critical: f64,
    /// 油温警告阈值（°C，>=）
    pub temp_warning: Option<f64>,

    /// 矿机掉线数量阈值
    pub miners_drop: u32,

    /// 功率下降百分比阈值
    pub power_drop_percent: f64,

    /// 浸没百分比下限（低于即警告）
    pub immersion_min_percent: f64,
    /// 浸没百分比严重下限
    pub immersion_critical_percent: Option<f64>,

    /// 油箱液位（%）
    pub tank_level_min: f64,
    pub tank_level_critical: f64,

    /// 油流量（L/min）
    pub oil_flow_min: f64,
    pub oil_flow_critical: f64,

    /// 系统压力正常区间（bar）
    pub pressure_min: f64,
    pub pressure_max: f64,

    /// 油温与环境温度最大温差（°C）
    pub temp_diff_max: f64,

    /// 冷却效率下限（%）
    pub cooling_efficiency_min: f64,

    /// 过滤器压差上限（bar）
    pub filter_diff_pressure_max: f64,
}

impl AlertThresholds {
    /// 集装箱监控预设
    pub fn container() -> Self {
        Self {
            temp_critical: 55.0,
            temp_warning: None,
            miners_drop: 1,
            power_drop_percent: 30.0,
            immersion_min_percent: 90.0,
            immersion_critical_percent: None,
            ..Self::tank()
        }
    }

    /// 油箱监控预设
    pub fn tank() -> Self {
        Self {
            temp_critical: 58.0,
            temp_warning: Some(52.0),
            miners_drop: 1,
            power_drop_percent: 30.0,
            immersion_min_percent: 88.0,
            immersion_critical_percent: Some(80.0),
            tank_level_min: 75.0,
            tank_level_critical: 60.0,
            oil_flow_min: 8.0,
            oil_flow_critical: 3.0,
            pressure_min: 0.8,
            pressure_max: 4.5,
            temp_diff_max: 15.0,
            cooling_efficiency_min: 70.0,
            filter_diff_pressure_max: 0.5,
        }
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self::container()
    }
}

/// 配置文件中的阈值覆盖项，未给出的字段沿用预设
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdOverrides {
    pub temp_critical: Option<f64>,
    pub temp_warning: Option<f64>,
    pub miners_drop: Option<u32>,
    pub power_drop_percent: Option<f64>,
    pub immersion_min_percent: Option<f64>,
    pub immersion_critical_percent: Option<f64>,
    pub tank_level_min: Option<f64>,
    pub tank_level_critical: Option<f64>,
    pub oil_flow_min: Option<f64>,
    pub oil_flow_critical: Option<f64>,
    pub pressure_min: Option<f64>,
    pub pressure_max: Option<f64>,
    pub temp_diff_max: Option<f64>,
    pub cooling_efficiency_min: Option<f64>,
    pub filter_diff_pressure_max: Option<f64>,
}

impl ThresholdOverrides {
    pub fn apply(&self, base: AlertThresholds) -> AlertThresholds {
        AlertThresholds {
            temp_critical: self.temp_critical.unwrap_or(base.temp_critical),
            temp_warning: self.temp_warning.or(base.temp_warning),
            miners_drop: self.miners_drop.unwrap_or(base.miners_drop),
            power_drop_percent: self.power_drop_percent.unwrap_or(base.power_drop_percent),
            immersion_min_percent: self
                .immersion_min_percent
                .unwrap_or(base.immersion_min_percent),
            immersion_critical_percent: self
                .immersion_critical_percent
                .or(base.immersion_critical_percent),
            tank_level_min: self.tank_level_min.unwrap_or(base.tank_level_min),
            tank_level_critical: self.tank_level_critical.unwrap_or(base.tank_level_critical),
            oil_flow_min: self.oil_flow_min.unwrap_or(base.oil_flow_min),
            oil_flow_critical: self.oil_flow_critical.unwrap_or(base.oil_flow_critical),
            pressure_min: self.pressure_min.unwrap_or(base.pressure_min),
            pressure_max: self.pressure_max.unwrap_or(base.pressure_max),
            temp_diff_max: self.temp_diff_max.unwrap_or(base.temp_diff_max),
            cooling_efficiency_min: self
                .cooling_efficiency_min
                .unwrap_or(base.cooling_efficiency_min),
            filter_diff_pressure_max: self
                .filter_diff_pressure_max
                .unwrap_or(base.filter_diff_pressure_max),
        }
    }
}

/// `[thresholds.container]` 与 `[thresholds.tank]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub container: ThresholdOverrides,
    pub tank: ThresholdOverrides,
}
