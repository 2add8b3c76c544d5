use serde::{Deserialize, Serialize};

/// 告警级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn tag(&self) -> &'static str {
        match self {
            AlertSeverity::Warning => "WARNING",
            AlertSeverity::Critical => "CRITICAL",
        }
    }
}

/// 告警类别（对应评估规则）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    Offline,
    Temperature,
    MinerDrop,
    PowerDrop,
    Immersion,
    Fan,
    Pump,
    Filter,
    TankLevel,
    OilFlow,
    Pressure,
    CoolingEfficiency,
    TemperatureDifferential,
    FilterPressure,
}

impl AlertKind {
    pub const ALL: [AlertKind; 14] = [
        AlertKind::Offline,
        AlertKind::Temperature,
        AlertKind::MinerDrop,
        AlertKind::PowerDrop,
        AlertKind::Immersion,
        AlertKind::Fan,
        AlertKind::Pump,
        AlertKind::Filter,
        AlertKind::TankLevel,
        AlertKind::OilFlow,
        AlertKind::Pressure,
        AlertKind::CoolingEfficiency,
        AlertKind::TemperatureDifferential,
        AlertKind::FilterPressure,
    ];

    /// 消息中的标签
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::Offline => "OFFLINE",
            AlertKind::Temperature => "HIGH TEMPERATURE",
            AlertKind::MinerDrop => "MINERS DOWN",
            AlertKind::PowerDrop => "POWER DROP",
            AlertKind::Immersion => "IMMERSION",
            AlertKind::Fan => "FAN",
            AlertKind::Pump => "PUMP",
            AlertKind::Filter => "FILTER",
            AlertKind::TankLevel => "TANK LEVEL",
            AlertKind::OilFlow => "OIL FLOW",
            AlertKind::Pressure => "PRESSURE",
            AlertKind::CoolingEfficiency => "COOLING EFFICIENCY",
            AlertKind::TemperatureDifferential => "TEMPERATURE DIFFERENTIAL",
            AlertKind::FilterPressure => "FILTER PRESSURE",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AlertKind::Offline => "🚨",
            AlertKind::Temperature => "🔥",
            AlertKind::MinerDrop => "🔻",
            AlertKind::PowerDrop => "⚡",
            AlertKind::Immersion => "💧",
            AlertKind::Fan => "🌀",
            AlertKind::Pump => "⚙️",
            AlertKind::Filter | AlertKind::FilterPressure => "🔍",
            AlertKind::TankLevel => "📊",
            AlertKind::OilFlow => "🌊",
            AlertKind::Pressure => "💪",
            AlertKind::CoolingEfficiency => "❄️",
            AlertKind::TemperatureDifferential => "🌡️",
        }
    }

    /// 导出报表中的分类名
    pub fn category(&self) -> &'static str {
        match self {
            AlertKind::Offline => "Offline",
            AlertKind::Temperature | AlertKind::TemperatureDifferential => "Temperature",
            AlertKind::MinerDrop => "Miners",
            AlertKind::PowerDrop => "Power",
            AlertKind::Immersion => "Immersion",
            AlertKind::Fan => "Fan",
            AlertKind::Pump => "Pump",
            AlertKind::Filter | AlertKind::FilterPressure => "Filter",
            AlertKind::TankLevel | AlertKind::OilFlow | AlertKind::Pressure => "Oil Circuit",
            AlertKind::CoolingEfficiency => "Cooling",
        }
    }
}

/// 一条告警事件
///
/// 消息格式为 `"<icon> <SEVERITY> <LABEL>: <unit> - <detail>"`，
/// 告警历史只持久化消息文本，导出时再用 [`AlertEvent::parse_message`] 反解析类别与单元。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub severity: AlertSeverity,
    pub kind: AlertKind,
    pub unit: String,
    pub message: String,
}

impl AlertEvent {
    pub fn new(
        severity: AlertSeverity,
        kind: AlertKind,
        unit: impl Into<String>,
        detail: impl AsRef<str>,
    ) -> Self {
        let unit = unit.into();
        let message = format!(
            "{} {} {}: {} - {}",
            kind.icon(),
            severity.tag(),
            kind.label(),
            unit,
            detail.as_ref()
        );
        Self {
            severity,
            kind,
            unit,
            message,
        }
    }

    pub fn warning(kind: AlertKind, unit: impl Into<String>, detail: impl AsRef<str>) -> Self {
        Self::new(AlertSeverity::Warning, kind, unit, detail)
    }

    pub fn critical(kind: AlertKind, unit: impl Into<String>, detail: impl AsRef<str>) -> Self {
        Self::new(AlertSeverity::Critical, kind, unit, detail)
    }

    /// 从持久化的消息文本中恢复 `(类别, 单元)`
    pub fn parse_message(message: &str) -> Option<(AlertKind, String)> {
        let (head, rest) = message.split_once(": ")?;
        let label = head.splitn(3, ' ').nth(2)?;
        let kind = AlertKind::ALL.iter().copied().find(|k| k.label() == label)?;
        let unit = rest.split(" - ").next().unwrap_or(rest).trim().to_string();
        Some((kind, unit))
    }
}
