use anyhow::{Context, Result};
use chrono::{DateTime, Duration, FixedOffset};
use fbox_types::{AlertEvent, AlertRecord};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// 无法从消息中识别单元时的占位
const UNKNOWN_UNIT: &str = "N/A";

/// 旧格式消息的分类关键字，按顺序匹配
const CATEGORY_KEYWORDS: &[(&[&str], &str)] = &[
    (&["offline", "crítico", "critical"], "Offline"),
    (&["temperatur"], "Temperature"),
    (&["miner", "mineros"], "Miners"),
    (&["power", "potencia"], "Power"),
    (&["immersion", "inmersión"], "Immersion"),
    (&["fan", "ventilador"], "Fan"),
];

/// 导出文件中的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub date: String,
    pub time: String,
    pub weekday: String,
    pub unit: String,
    pub category: String,
    pub message: String,
}

/// 按关键字推断旧消息的类别
pub fn categorize(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, category)| *category)
        .unwrap_or("Other")
}

/// 展开告警历史为导出行
///
/// `days == 0` 表示全部历史；否则只保留 `now - days` 之后的记录。
pub fn export_rows(
    history: &[AlertRecord],
    days: u32,
    now: DateTime<FixedOffset>,
    units: &[String],
) -> Vec<ExportRow> {
    let cutoff = (days > 0).then(|| now - Duration::days(i64::from(days)));

    history
        .iter()
        .filter(|record| cutoff.map_or(true, |c| record.timestamp >= c))
        .flat_map(|record| {
            let local = record.timestamp.with_timezone(now.offset());
            record.alerts.iter().map(move |message| {
                let (category, unit) = match AlertEvent::parse_message(message) {
                    Some((kind, unit)) => (kind.category().to_string(), unit),
                    None => (
                        categorize(message).to_string(),
                        units
                            .iter()
                            .find(|u| message.contains(u.as_str()))
                            .cloned()
                            .unwrap_or_else(|| UNKNOWN_UNIT.to_string()),
                    ),
                };

                ExportRow {
                    date: local.format("%Y-%m-%d").to_string(),
                    time: local.format("%H:%M:%S").to_string(),
                    weekday: local.format("%A").to_string(),
                    unit,
                    category,
                    message: message.clone(),
                }
            })
        })
        .collect()
}

/// 导出告警历史为 CSV 文件
///
/// 过滤后没有任何告警时返回 `Ok(None)`，不创建文件。
pub fn export_alerts_csv(
    history: &[AlertRecord],
    days: u32,
    now: DateTime<FixedOffset>,
    dir: &Path,
    units: &[String],
) -> Result<Option<PathBuf>> {
    let rows = export_rows(history, days, now, units);
    if rows.is_empty() {
        info!(days, "No alerts to export");
        return Ok(None);
    }

    let path = dir.join(format!("fbox_alerts_{}.csv", now.format("%Y%m%d_%H%M%S")));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), days, "Alert export written");
    Ok(Some(path))
}
