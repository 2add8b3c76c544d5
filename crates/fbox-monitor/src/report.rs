//! 发送给操作员的文本报告
//!
//! 所有 "N/A" 格式化只在这里发生，快照中的未知值始终是 `None`。

use crate::fmt::{num, opt_num};
use crate::service::UnitReading;
use crate::stats::UnitStats;
use chrono::{DateTime, FixedOffset};
use fbox_config::{AlertThresholds, MonitorProfile};
use fbox_types::{AlertEvent, AlertRecord, UnitSnapshot};
use std::collections::BTreeMap;
use std::fmt::Write;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━━━━━";

/// 整点状态报告
pub fn status_report(
    profile: MonitorProfile,
    readings: &[UnitReading],
    thresholds: &AlertThresholds,
    now: DateTime<FixedOffset>,
) -> String {
    let title = match profile {
        MonitorProfile::Container => "📦 FBOX STATUS",
        MonitorProfile::Tank => "🛢️ TANK STATUS",
    };

    let mut msg = format!("{}\n{}\n\n", title, now.format(TIME_FORMAT));

    for reading in readings {
        let _ = writeln!(msg, "🔹 {}", reading.unit);
        match &reading.outcome {
            Err(failure) => {
                let _ = writeln!(msg, "⚠️ Error reading {}", failure.what);
            }
            Ok(snap) => match profile {
                MonitorProfile::Container => container_block(&mut msg, snap),
                MonitorProfile::Tank => tank_block(&mut msg, snap, thresholds),
            },
        }
        msg.push('\n');
    }

    msg.trim_end().to_string()
}

fn status_line(snap: &UnitSnapshot) -> &'static str {
    if snap.is_online() {
        "🟢 ONLINE"
    } else {
        "🔴 OFFLINE"
    }
}

fn container_block(msg: &mut String, snap: &UnitSnapshot) {
    let _ = writeln!(msg, "{}", status_line(snap));
    let _ = writeln!(msg, "🔥 Oil: {} °C", opt_num(snap.oil_temp));

    if let Some(temp) = snap.container_temp {
        let _ = writeln!(msg, "🌡️ Container: {} °C", num(temp));
    }

    match snap.miner_counts() {
        Some((on, off)) => {
            let _ = writeln!(msg, "⛏ Miners: {} online / {} offline", on, off);
        }
        None => {
            let _ = writeln!(msg, "⛏ Miners: N/A");
        }
    }

    if let Some(hashrate) = snap.hashrate_ph {
        let _ = writeln!(msg, "⚙️ Hashrate: {} PH/s", num(hashrate));
    }

    match snap.power_kw {
        Some(kw) => {
            let _ = writeln!(msg, "⚡ Power: {} kW", num(kw));
        }
        None => {
            let _ = writeln!(msg, "⚡ Power: N/A");
        }
    }
}

/// 低于严重档 🔴，低于下限 ⚠️，否则使用正常图标
fn tier_marker(value: f64, critical: f64, min: f64, normal: &'static str) -> &'static str {
    if value < critical {
        "🔴"
    } else if value < min {
        "⚠️"
    } else {
        normal
    }
}

fn tank_block(msg: &mut String, snap: &UnitSnapshot, t: &AlertThresholds) {
    let _ = writeln!(msg, "{}", status_line(snap));

    match snap.oil_temp {
        Some(oil) => {
            let icon = if oil >= t.temp_critical {
                "🔴"
            } else if t.temp_warning.is_some_and(|w| oil >= w) {
                "🟡"
            } else {
                "🔥"
            };
            let _ = write!(msg, "{} Oil: {} °C", icon, num(oil));
            if let (Some(min), Some(max)) = (snap.temp_min, snap.temp_max) {
                let _ = write!(msg, " (range: {}-{} °C)", num(min), num(max));
            }
            msg.push('\n');
        }
        None => {
            let _ = writeln!(msg, "🔥 Oil: N/A");
        }
    }

    if let Some(tank_temp) = snap.container_temp {
        let _ = write!(msg, "🌡️ Tank: {} °C", num(tank_temp));
        if let Some(diff) = snap.temp_diff {
            let _ = write!(msg, " (Δ{}°C)", num(diff));
            if diff > t.temp_diff_max {
                msg.push_str(" ⚠️");
            }
        }
        msg.push('\n');
    }

    if let Some(efficiency) = snap.cooling_efficiency {
        let icon = if efficiency < t.cooling_efficiency_min {
            "⚠️"
        } else {
            "❄️"
        };
        let _ = writeln!(msg, "{} Cooling: {}%", icon, num(efficiency));
    }

    let _ = write!(
        msg,
        "💧 Immersion: {}",
        snap.immersion_status.as_deref().unwrap_or("N/A")
    );
    if let Some(percent) = snap.immersion_percent {
        let critical = t.immersion_critical_percent.unwrap_or(f64::NEG_INFINITY);
        let icon = tier_marker(percent, critical, t.immersion_min_percent, "✅");
        let _ = write!(msg, " ({}%) {}", num(percent), icon);
    }
    msg.push('\n');

    if let Some(level) = snap.tank_level {
        let icon = tier_marker(level, t.tank_level_critical, t.tank_level_min, "📊");
        let _ = writeln!(msg, "{} Level: {}%", icon, num(level));
    }

    if let Some(flow) = snap.oil_flow {
        let icon = tier_marker(flow, t.oil_flow_critical, t.oil_flow_min, "🌊");
        let _ = writeln!(msg, "{} Flow: {} L/min", icon, num(flow));
    }

    if let Some(pressure) = snap.pressure {
        let icon = if pressure < t.pressure_min || pressure > t.pressure_max {
            "🔴"
        } else {
            "💪"
        };
        let _ = writeln!(msg, "{} Pressure: {} bar", icon, num(pressure));
    }

    if let Some(pump) = snap.pump_status.as_deref() {
        let icon = if pump.to_lowercase().contains("on") {
            "⚙️"
        } else {
            "⚠️"
        };
        let _ = write!(msg, "{} Pumps: {}", icon, pump);
        if let Some(rpm) = snap.pump_rpm {
            let _ = write!(msg, " ({} RPM)", num(rpm));
        }
        msg.push('\n');
    }

    if let Some(filter) = snap.filter_status.as_deref() {
        let icon = if filter.to_lowercase().contains("ok") {
            "🔍"
        } else {
            "⚠️"
        };
        let _ = write!(msg, "{} Filters: {}", icon, filter);
        if let Some(dp) = snap.filter_diff_pressure {
            let _ = write!(msg, " (ΔP: {} bar)", num(dp));
        }
        msg.push('\n');
    }

    if snap.temp_inlet.is_some() || snap.temp_outlet.is_some() {
        let mut parts = Vec::new();
        if let Some(inlet) = snap.temp_inlet {
            parts.push(format!("In: {}°C", num(inlet)));
        }
        if let Some(outlet) = snap.temp_outlet {
            parts.push(format!("Out: {}°C", num(outlet)));
        }
        let _ = writeln!(msg, "🔄 {}", parts.join(" "));
    }
}

/// 一个检查周期的告警汇总消息
pub fn alert_message(alerts: &[AlertEvent], now: DateTime<FixedOffset>) -> String {
    let mut msg = format!("🚨 FBOX ALERT\n{}\n\n", now.format(TIME_FORMAT));
    for alert in alerts {
        msg.push_str(&alert.message);
        msg.push('\n');
    }
    msg.trim_end().to_string()
}

/// 周报
pub fn weekly_digest(
    stats: &BTreeMap<String, UnitStats>,
    now: DateTime<FixedOffset>,
    check_interval_minutes: u64,
) -> String {
    if stats.is_empty() {
        return "📊 WEEKLY REPORT\n\nNot enough data to build the report.".to_string();
    }

    let mut msg = format!(
        "📊 FBOX WEEKLY REPORT\n📅 {}\nPeriod: last 7 days\n\n",
        now.format("%Y-%m-%d")
    );

    for (unit, s) in stats {
        let _ = writeln!(msg, "━━━━━ {} ━━━━━", unit);
        let _ = writeln!(msg, "✅ Uptime: {}%", num(s.uptime_percent));

        if let Some(avg) = s.avg_oil_temp {
            let _ = writeln!(msg, "🔥 Oil temperature:");
            let _ = writeln!(msg, "   • Average: {}°C", num(avg));
            let _ = writeln!(msg, "   • Max: {}°C", opt_num(s.max_oil_temp));
            let _ = writeln!(msg, "   • Min: {}°C", opt_num(s.min_oil_temp));
        }
        if let Some(avg) = s.avg_container_temp {
            let _ = writeln!(msg, "🌡️ Container: {}°C (avg)", num(avg));
        }
        if let Some(online) = s.avg_miners_online {
            let _ = writeln!(msg, "⛏ Miners:");
            let _ = writeln!(msg, "   • Online: {} (avg)", num(online));
            let _ = writeln!(msg, "   • Offline: {} (avg)", opt_num(s.avg_miners_offline));
        }
        if let Some(hashrate) = s.avg_hashrate {
            let _ = writeln!(msg, "⚙️ Hashrate: {} PH/s (avg)", num(hashrate));
        }
        if let Some(power) = s.avg_power {
            let _ = writeln!(msg, "⚡ Power: {} kW (avg)", num(power));
        }
        if let Some(fan) = s.fan_uptime_percent {
            let _ = writeln!(msg, "🌀 Fan uptime: {}%", num(fan));
        }
        msg.push('\n');
    }

    let total = stats.values().next().map(|s| s.total_records).unwrap_or(0);
    let _ = writeln!(msg, "📈 Total measurements: {}", total);
    let _ = write!(msg, "⏱️ Frequency: every {} minutes", check_interval_minutes);
    msg
}

/// 告警历史概要
pub fn alert_summary(history: &[AlertRecord]) -> String {
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return "📊 No alerts recorded yet.".to_string();
    };

    let total_alerts: usize = history.iter().map(|r| r.alerts.len()).sum();

    let mut msg = String::from("📊 ALERT SUMMARY\n");
    let _ = writeln!(msg, "{}", SEPARATOR);
    let _ = writeln!(msg, "Total events: {}", history.len());
    let _ = writeln!(msg, "Total alerts: {}", total_alerts);
    let _ = writeln!(msg, "First record: {}", first.timestamp.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(msg, "Last record: {}", last.timestamp.format("%Y-%m-%d %H:%M"));
    msg.push('\n');
    msg.push_str("📥 Use /summary_7_days for a 7-day export\n");
    msg.push_str("📥 Use /summary_30_days for a 30-day export\n");
    msg.push_str("📥 Use /summary_all for every alert");
    msg
}
