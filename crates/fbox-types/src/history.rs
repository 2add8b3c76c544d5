use crate::snapshot::StateMap;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// 历史快照记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: DateTime<FixedOffset>,
    pub data: StateMap,
}

/// 告警历史记录（一次检查周期产生的全部告警文本）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub timestamp: DateTime<FixedOffset>,
    pub alerts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_microsecond_timestamp_with_offset() {
        let json = r#"{"timestamp": "2025-01-06T10:15:00.123456-03:00", "alerts": ["a", "b"]}"#;
        let record: AlertRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.alerts.len(), 2);
        assert_eq!(record.timestamp.offset().local_minus_utc(), -3 * 3600);
    }
}
