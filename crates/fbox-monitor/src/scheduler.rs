use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDateTime, TimeZone, Weekday};
use fbox_config::ScheduleConfig;
use tracing::warn;

/// 周期报告调度
///
/// 只做判断，不读写文件；"已发送"时间戳由调用方从状态存储取出后传入。
/// 时间戳无法解析时视为到期。
#[derive(Debug, Clone)]
pub struct ReportScheduler {
    full_interval: Duration,
    weekly_enabled: bool,
    weekly_day: Weekday,
    weekly_min_gap: Duration,
}

impl ReportScheduler {
    pub fn new(full_interval: Duration, weekly_day: Weekday, weekly_min_gap: Duration) -> Self {
        Self {
            full_interval,
            weekly_enabled: true,
            weekly_day,
            weekly_min_gap,
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            full_interval: Duration::minutes(config.full_report_interval_minutes),
            weekly_enabled: config.weekly_report_enabled,
            weekly_day: config.weekly_report_day,
            weekly_min_gap: Duration::hours(config.weekly_min_gap_hours),
        }
    }

    /// 整点报告：无记录或距上次已满间隔
    pub fn full_report_due(&self, last: Option<&str>, now: DateTime<FixedOffset>) -> bool {
        let Some(raw) = last else {
            return true;
        };

        match parse_timestamp(raw, now.offset()) {
            Some(last) => now - last >= self.full_interval,
            None => {
                warn!(timestamp = %raw, "Unparseable full report timestamp, treating as due");
                true
            }
        }
    }

    /// 周报：必须是指定星期几，且（无记录，或间隔足够并且不在同一 ISO 周）
    pub fn weekly_report_due(&self, last: Option<&str>, now: DateTime<FixedOffset>) -> bool {
        if !self.weekly_enabled || now.weekday() != self.weekly_day {
            return false;
        }

        let Some(raw) = last else {
            return true;
        };

        match parse_timestamp(raw, now.offset()) {
            Some(last) => {
                let local_last = last.with_timezone(now.offset());
                let same_week = local_last.iso_week() == now.iso_week();
                now - last >= self.weekly_min_gap && !same_week
            }
            None => {
                warn!(timestamp = %raw, "Unparseable weekly report timestamp, treating as due");
                true
            }
        }
    }
}

/// 解析 RFC 3339 时间戳；不带偏移的旧格式按本地偏移解释
pub fn parse_timestamp(raw: &str, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| offset.from_local_datetime(&naive).single())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paraguay() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        paraguay().with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn scheduler() -> ReportScheduler {
        ReportScheduler::from_config(&ScheduleConfig::default())
    }

    #[test]
    fn test_full_report_due() {
        let s = scheduler();
        let now = at(2025, 1, 6, 10);

        assert!(s.full_report_due(None, now));
        let half_hour_ago = (now - Duration::minutes(30)).to_rfc3339();
        assert!(!s.full_report_due(Some(&half_hour_ago), now));
        assert!(s.full_report_due(Some(&at(2025, 1, 6, 9).to_rfc3339()), now));
        assert!(s.full_report_due(Some("garbage"), now));
    }

    #[test]
    fn test_full_report_accepts_naive_timestamp() {
        let s = scheduler();
        let now = at(2025, 1, 6, 10);
        assert!(!s.full_report_due(Some("2025-01-06T09:45:00.123456"), now));
    }

    #[test]
    fn test_weekly_only_on_configured_day() {
        let s = scheduler();
        // 2025-01-07 是星期二
        assert!(!s.weekly_report_due(None, at(2025, 1, 7, 10)));
        assert!(s.weekly_report_due(None, at(2025, 1, 6, 10)));
    }

    #[test]
    fn test_weekly_same_iso_week_is_not_due() {
        // 2025-01-11 星期六，120 小时前是同一 ISO 周的星期一
        let s = ReportScheduler::new(Duration::minutes(60), Weekday::Sat, Duration::hours(144));
        let now = at(2025, 1, 11, 8);
        let last = (now - Duration::hours(120)).to_rfc3339();
        assert!(!s.weekly_report_due(Some(&last), now));

        // 间隔已满但仍在同一 ISO 周
        let s = ReportScheduler::new(Duration::minutes(60), Weekday::Sun, Duration::hours(144));
        let now = at(2025, 1, 12, 10);
        let monday = at(2025, 1, 6, 1).to_rfc3339();
        assert!(!s.weekly_report_due(Some(&monday), now));

        // 同一个星期一稍早时候已发送
        let earlier = at(2025, 1, 13, 1).to_rfc3339();
        assert!(!scheduler().weekly_report_due(Some(&earlier), at(2025, 1, 13, 8)));
    }

    #[test]
    fn test_weekly_eight_days_later_is_due() {
        let s = scheduler();
        let now = at(2025, 1, 13, 8);
        let last = (now - Duration::days(8)).to_rfc3339();
        assert!(s.weekly_report_due(Some(&last), now));
    }

    #[test]
    fn test_weekly_unparseable_is_due() {
        assert!(scheduler().weekly_report_due(Some("N/A"), at(2025, 1, 13, 8)));
    }

    #[test]
    fn test_weekly_disabled() {
        let config = ScheduleConfig {
            weekly_report_enabled: false,
            ..Default::default()
        };
        assert!(!ReportScheduler::from_config(&config).weekly_report_due(None, at(2025, 1, 13, 8)));
    }
}
