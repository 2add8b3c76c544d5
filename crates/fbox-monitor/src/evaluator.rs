use crate::fmt::num;
use fbox_config::{AlertThresholds, MonitorProfile};
use fbox_types::{AlertEvent, AlertKind, StateMap, UnitSnapshot};

/// 单条评估规则：`(单元名, 旧快照, 新快照, 阈值)`
pub type Rule = fn(&str, Option<&UnitSnapshot>, &UnitSnapshot, &AlertThresholds) -> Option<AlertEvent>;

/// 规则按此顺序执行
pub const RULES: &[Rule] = &[
    offline_rule,
    temperature_rule,
    miner_drop_rule,
    power_drop_rule,
    immersion_rule,
    fan_rule,
    pump_rule,
    filter_rule,
    tank_level_rule,
    oil_flow_rule,
    pressure_rule,
    cooling_efficiency_rule,
    temperature_differential_rule,
    filter_pressure_rule,
];

/// 集装箱：在线、温度、矿机、功率、浸没、风扇
pub const CONTAINER_RULES: &[Rule] = &[
    offline_rule,
    temperature_rule,
    miner_drop_rule,
    power_drop_rule,
    immersion_rule,
    fan_rule,
];

/// 油箱：不看矿机、功率和风扇
pub const TANK_RULES: &[Rule] = &[
    offline_rule,
    temperature_rule,
    immersion_rule,
    pump_rule,
    filter_rule,
    tank_level_rule,
    oil_flow_rule,
    pressure_rule,
    cooling_efficiency_rule,
    temperature_differential_rule,
    filter_pressure_rule,
];

// 各设备的坏状态词表分开维护：风扇只认 off/offline/error/fault（及 "0"），stop 只对泵生效
const FAN_BAD_TOKENS: &[&str] = &["off", "offline", "error", "fault"];
const PUMP_BAD_TOKENS: &[&str] = &["off", "offline", "error", "fault", "stop"];
const FILTER_BAD_TOKENS: &[&str] = &["dirty", "clogged", "blocked", "error", "fault"];

/// 告警评估器
///
/// 逐单元（按名称排序）比较旧快照与新快照，依次套用规则列表。
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    thresholds: AlertThresholds,
    rules: &'static [Rule],
}

impl AlertEvaluator {
    /// 使用全部规则
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self {
            thresholds,
            rules: RULES,
        }
    }

    pub fn for_profile(profile: MonitorProfile, thresholds: AlertThresholds) -> Self {
        let rules = match profile {
            MonitorProfile::Container => CONTAINER_RULES,
            MonitorProfile::Tank => TANK_RULES,
        };
        Self { thresholds, rules }
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    pub fn evaluate(&self, old: &StateMap, new: &StateMap) -> Vec<AlertEvent> {
        new.iter()
            .flat_map(|(unit, snapshot)| self.evaluate_unit(unit, old.get(unit), snapshot))
            .collect()
    }

    pub fn evaluate_unit(
        &self,
        unit: &str,
        old: Option<&UnitSnapshot>,
        new: &UnitSnapshot,
    ) -> Vec<AlertEvent> {
        self.rules
            .iter()
            .filter_map(|rule| rule(unit, old, new, &self.thresholds))
            .collect()
    }
}

fn contains_any(status: &str, tokens: &[&str]) -> bool {
    let lower = status.to_lowercase();
    tokens.iter().any(|t| lower.contains(t))
}

pub fn offline_rule(
    unit: &str,
    _old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    _t: &AlertThresholds,
) -> Option<AlertEvent> {
    (!new.is_online())
        .then(|| AlertEvent::critical(AlertKind::Offline, unit, format!("status code {}", new.code)))
}

pub fn temperature_rule(
    unit: &str,
    old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    t: &AlertThresholds,
) -> Option<AlertEvent> {
    let temp = new.oil_temp?;
    let previous = old
        .and_then(|o| o.oil_temp)
        .map(|p| format!(", previous {}°C", num(p)))
        .unwrap_or_default();

    if temp >= t.temp_critical {
        return Some(AlertEvent::critical(
            AlertKind::Temperature,
            unit,
            format!("oil {}°C (limit {}°C{})", num(temp), num(t.temp_critical), previous),
        ));
    }

    let warning = t.temp_warning?;
    (temp >= warning).then(|| {
        AlertEvent::warning(
            AlertKind::Temperature,
            unit,
            format!("oil {}°C (warning limit {}°C)", num(temp), num(warning)),
        )
    })
}

/// 旧计数必须已知且至少一个大于 0（单元之前确实在运行），新计数也必须已知
pub fn miner_drop_rule(
    unit: &str,
    old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    t: &AlertThresholds,
) -> Option<AlertEvent> {
    let (old_on, old_off) = old?.miner_counts()?;
    let (new_on, new_off) = new.miner_counts()?;
    if old_on == 0 && old_off == 0 {
        return None;
    }

    let drop_online = i64::from(old_on) - i64::from(new_on);
    let increase_offline = i64::from(new_off) - i64::from(old_off);
    let threshold = i64::from(t.miners_drop);

    if drop_online < threshold && increase_offline < threshold {
        return None;
    }

    let magnitude = drop_online.max(increase_offline);
    Some(AlertEvent::warning(
        AlertKind::MinerDrop,
        unit,
        format!(
            "{} miner(s) down, now {} online / {} offline",
            magnitude, new_on, new_off
        ),
    ))
}

pub fn power_drop_rule(
    unit: &str,
    old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    t: &AlertThresholds,
) -> Option<AlertEvent> {
    let old_kw = old?.power_kw.filter(|kw| *kw > 0.0)?;
    let new_kw = new.power_kw?;

    let drop_percent = (old_kw - new_kw) / old_kw * 100.0;
    (drop_percent >= t.power_drop_percent).then(|| {
        AlertEvent::warning(
            AlertKind::PowerDrop,
            unit,
            format!(
                "dropped {:.1}% ({} → {} kW)",
                drop_percent,
                num(old_kw),
                num(new_kw)
            ),
        )
    })
}

pub fn immersion_rule(
    unit: &str,
    _old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    t: &AlertThresholds,
) -> Option<AlertEvent> {
    if let Some(status) = &new.immersion_status {
        if status.to_lowercase().contains("offline") {
            return Some(AlertEvent::critical(
                AlertKind::Immersion,
                unit,
                "immersion system offline",
            ));
        }
    }

    let percent = new.immersion_percent?;
    if let Some(critical) = t.immersion_critical_percent {
        if percent < critical {
            return Some(AlertEvent::critical(
                AlertKind::Immersion,
                unit,
                format!("immersion {}% (critical below {}%)", num(percent), num(critical)),
            ));
        }
    }

    (percent < t.immersion_min_percent).then(|| {
        AlertEvent::warning(
            AlertKind::Immersion,
            unit,
            format!(
                "immersion {}% (minimum {}%)",
                num(percent),
                num(t.immersion_min_percent)
            ),
        )
    })
}

pub fn fan_rule(
    unit: &str,
    _old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    _t: &AlertThresholds,
) -> Option<AlertEvent> {
    let status = new.fan_status.as_deref()?;
    (status.trim() == "0" || contains_any(status, FAN_BAD_TOKENS))
        .then(|| AlertEvent::warning(AlertKind::Fan, unit, format!("fan status {}", status)))
}

pub fn pump_rule(
    unit: &str,
    _old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    _t: &AlertThresholds,
) -> Option<AlertEvent> {
    let status = new.pump_status.as_deref()?;
    contains_any(status, PUMP_BAD_TOKENS)
        .then(|| AlertEvent::critical(AlertKind::Pump, unit, format!("pump offline or failing: {}", status)))
}

pub fn filter_rule(
    unit: &str,
    _old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    _t: &AlertThresholds,
) -> Option<AlertEvent> {
    let status = new.filter_status.as_deref()?;
    contains_any(status, FILTER_BAD_TOKENS).then(|| {
        AlertEvent::warning(
            AlertKind::Filter,
            unit,
            format!("filters need maintenance: {}", status),
        )
    })
}

pub fn tank_level_rule(
    unit: &str,
    _old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    t: &AlertThresholds,
) -> Option<AlertEvent> {
    let level = new.tank_level?;
    if level < t.tank_level_critical {
        Some(AlertEvent::critical(
            AlertKind::TankLevel,
            unit,
            format!("level {}% (critical below {}%)", num(level), num(t.tank_level_critical)),
        ))
    } else if level < t.tank_level_min {
        Some(AlertEvent::warning(
            AlertKind::TankLevel,
            unit,
            format!("level {}% (minimum {}%)", num(level), num(t.tank_level_min)),
        ))
    } else {
        None
    }
}

pub fn oil_flow_rule(
    unit: &str,
    old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    t: &AlertThresholds,
) -> Option<AlertEvent> {
    let flow = new.oil_flow?;
    if flow < t.oil_flow_critical {
        let previous = old
            .and_then(|o| o.oil_flow)
            .map(|p| format!(", previous {} L/min", num(p)))
            .unwrap_or_default();
        Some(AlertEvent::critical(
            AlertKind::OilFlow,
            unit,
            format!(
                "flow {} L/min (critical below {} L/min{})",
                num(flow),
                num(t.oil_flow_critical),
                previous
            ),
        ))
    } else if flow < t.oil_flow_min {
        Some(AlertEvent::warning(
            AlertKind::OilFlow,
            unit,
            format!("flow {} L/min (minimum {} L/min)", num(flow), num(t.oil_flow_min)),
        ))
    } else {
        None
    }
}

pub fn pressure_rule(
    unit: &str,
    _old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    t: &AlertThresholds,
) -> Option<AlertEvent> {
    let pressure = new.pressure?;
    if pressure < t.pressure_min {
        Some(AlertEvent::critical(
            AlertKind::Pressure,
            unit,
            format!("low pressure {} bar (minimum {} bar)", num(pressure), num(t.pressure_min)),
        ))
    } else if pressure > t.pressure_max {
        Some(AlertEvent::critical(
            AlertKind::Pressure,
            unit,
            format!("high pressure {} bar (maximum {} bar)", num(pressure), num(t.pressure_max)),
        ))
    } else {
        None
    }
}

pub fn cooling_efficiency_rule(
    unit: &str,
    _old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    t: &AlertThresholds,
) -> Option<AlertEvent> {
    let efficiency = new.cooling_efficiency?;
    (efficiency < t.cooling_efficiency_min).then(|| {
        AlertEvent::warning(
            AlertKind::CoolingEfficiency,
            unit,
            format!(
                "cooling efficiency {}% (expected at least {}%)",
                num(efficiency),
                num(t.cooling_efficiency_min)
            ),
        )
    })
}

pub fn temperature_differential_rule(
    unit: &str,
    _old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    t: &AlertThresholds,
) -> Option<AlertEvent> {
    let diff = new.temp_diff?;
    (diff > t.temp_diff_max).then(|| {
        AlertEvent::warning(
            AlertKind::TemperatureDifferential,
            unit,
            format!("oil/ambient difference {}°C (maximum {}°C)", num(diff), num(t.temp_diff_max)),
        )
    })
}

pub fn filter_pressure_rule(
    unit: &str,
    _old: Option<&UnitSnapshot>,
    new: &UnitSnapshot,
    t: &AlertThresholds,
) -> Option<AlertEvent> {
    let diff = new.filter_diff_pressure?;
    (diff > t.filter_diff_pressure_max).then(|| {
        AlertEvent::warning(
            AlertKind::FilterPressure,
            unit,
            format!(
                "differential pressure {} bar (maximum {} bar)",
                num(diff),
                num(t.filter_diff_pressure_max)
            ),
        )
    })
}
