use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// 厂商 API 表示"在线"的状态码
pub const ONLINE_CODE: i64 = 1;

/// 响应中缺少状态码时使用的占位值
pub const UNKNOWN_CODE: i64 = -1;

/// 单元名称 -> 最近一次快照
///
/// 使用有序映射，保证告警评估与报告输出的顺序稳定。
pub type StateMap = BTreeMap<String, UnitSnapshot>;

/// 单个集装箱/油箱的规范化指标快照
///
/// 所有读数都是可空的：`None` 表示"未知"，`Some(0.0)` 是真实的零读数。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSnapshot {
    /// 在线状态码（1 = 在线）
    #[serde(default = "default_code")]
    pub code: i64,

    /// 集装箱类型（如 "Exhaust Fan"）
    #[serde(deserialize_with = "lenient_text")]
    pub container_type: Option<String>,

    /// 油温均值（°C）
    pub oil_temp: Option<f64>,

    /// 集装箱/油箱环境温度（°C）
    #[serde(alias = "tank_temp")]
    pub container_temp: Option<f64>,

    #[serde(deserialize_with = "lenient_count")]
    pub miner_online: Option<u32>,

    #[serde(deserialize_with = "lenient_count")]
    pub miner_offline: Option<u32>,

    /// 实时算力（PH/s）
    pub hashrate_ph: Option<f64>,

    /// 实时功率（kW）
    pub power_kw: Option<f64>,

    #[serde(deserialize_with = "lenient_text")]
    pub immersion_status: Option<String>,
    pub immersion_percent: Option<f64>,

    #[serde(deserialize_with = "lenient_text")]
    pub fan_status: Option<String>,

    // 油箱相关读数
    pub tank_level: Option<f64>,
    pub oil_flow: Option<f64>,
    pub pressure: Option<f64>,
    #[serde(deserialize_with = "lenient_text")]
    pub pump_status: Option<String>,
    pub pump_rpm: Option<f64>,
    #[serde(deserialize_with = "lenient_text")]
    pub filter_status: Option<String>,
    pub filter_diff_pressure: Option<f64>,
    pub temp_inlet: Option<f64>,
    pub temp_outlet: Option<f64>,

    // 派生指标
    pub temp_diff: Option<f64>,
    pub cooling_efficiency: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub temp_range: Option<f64>,
}

fn default_code() -> i64 {
    UNKNOWN_CODE
}

impl UnitSnapshot {
    /// 离线快照：只保留状态码，所有读数未知
    pub fn offline(code: i64) -> Self {
        Self {
            code,
            ..Default::default()
        }
    }

    pub fn is_online(&self) -> bool {
        self.code == ONLINE_CODE
    }

    /// 在线与离线矿机数都已知时返回 `(online, offline)`
    pub fn miner_counts(&self) -> Option<(u32, u32)> {
        match (self.miner_online, self.miner_offline) {
            (Some(on), Some(off)) => Some((on, off)),
            _ => None,
        }
    }
}

/// 兼容旧状态文件中的 "N/A" 字符串与浮点计数
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_u64())
        .and_then(|n| u32::try_from(n).ok()))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
                None
            } else {
                Some(s)
            }
        }
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
