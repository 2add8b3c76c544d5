//! 报告与告警文本中的数值格式

/// 整数值保留一位小数（`56.0`），其余按最短表示输出
pub fn num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// 未知值显示为 `N/A`
pub fn opt_num(value: Option<f64>) -> String {
    value.map(num).unwrap_or_else(|| "N/A".to_string())
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num() {
        assert_eq!(num(56.0), "56.0");
        assert_eq!(num(48.35), "48.35");
        assert_eq!(opt_num(None), "N/A");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.345_6, 2), 12.35);
        assert_eq!(round_to(47.25, 1), 47.3);
    }
}
