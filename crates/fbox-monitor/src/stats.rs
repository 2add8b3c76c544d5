use crate::fmt::round_to;
use fbox_types::HistoryRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// 风扇"运转中"的状态值
const FAN_UP_VALUES: &[&str] = &["on", "online", "1", "running"];

/// 单元在历史窗口内的汇总统计
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UnitStats {
    pub avg_oil_temp: Option<f64>,
    pub max_oil_temp: Option<f64>,
    pub min_oil_temp: Option<f64>,
    pub avg_container_temp: Option<f64>,
    pub avg_hashrate: Option<f64>,
    pub avg_power: Option<f64>,
    pub avg_miners_online: Option<f64>,
    pub avg_miners_offline: Option<f64>,
    /// 在线记录占比（%），没有记录时为 0
    pub uptime_percent: f64,
    /// 没有风扇读数时为 `None`
    pub fan_uptime_percent: Option<f64>,
    /// 窗口内的记录总数
    pub total_records: usize,
}

#[derive(Default)]
struct Accumulator {
    oil_temps: Vec<f64>,
    container_temps: Vec<f64>,
    hashrates: Vec<f64>,
    powers: Vec<f64>,
    miners_online: Vec<f64>,
    miners_offline: Vec<f64>,
    online: usize,
    offline: usize,
    fan_up: usize,
    fan_down: usize,
}

impl Accumulator {
    fn finish(self, total_records: usize) -> UnitStats {
        let samples = self.online + self.offline;
        let fan_samples = self.fan_up + self.fan_down;

        UnitStats {
            avg_oil_temp: mean(&self.oil_temps, 1),
            max_oil_temp: self.oil_temps.iter().copied().reduce(f64::max).map(|v| round_to(v, 1)),
            min_oil_temp: self.oil_temps.iter().copied().reduce(f64::min).map(|v| round_to(v, 1)),
            avg_container_temp: mean(&self.container_temps, 1),
            avg_hashrate: mean(&self.hashrates, 2),
            avg_power: mean(&self.powers, 1),
            avg_miners_online: mean(&self.miners_online, 1),
            avg_miners_offline: mean(&self.miners_offline, 1),
            uptime_percent: percent(self.online, samples).unwrap_or(0.0),
            fan_uptime_percent: percent(self.fan_up, fan_samples),
            total_records,
        }
    }
}

fn mean(values: &[f64], decimals: i32) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(round_to(values.iter().sum::<f64>() / values.len() as f64, decimals))
}

fn percent(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| round_to(part as f64 / whole as f64 * 100.0, 1))
}

/// 将历史窗口归约为每个单元的统计
///
/// 历史为空时返回空映射。
pub fn aggregate(history: &[HistoryRecord]) -> BTreeMap<String, UnitStats> {
    let mut acc: BTreeMap<String, Accumulator> = BTreeMap::new();

    for record in history {
        for (unit, snap) in &record.data {
            let entry = acc.entry(unit.clone()).or_default();

            entry.oil_temps.extend(snap.oil_temp);
            entry.container_temps.extend(snap.container_temp);
            entry.hashrates.extend(snap.hashrate_ph);
            entry.powers.extend(snap.power_kw);
            entry.miners_online.extend(snap.miner_online.map(f64::from));
            entry.miners_offline.extend(snap.miner_offline.map(f64::from));

            if snap.is_online() {
                entry.online += 1;
            } else {
                entry.offline += 1;
            }

            if let Some(fan) = snap.fan_status.as_deref() {
                if FAN_UP_VALUES.contains(&fan.to_lowercase().as_str()) {
                    entry.fan_up += 1;
                } else {
                    entry.fan_down += 1;
                }
            }
        }
    }

    acc.into_iter()
        .map(|(unit, a)| (unit, a.finish(history.len())))
        .collect()
}
