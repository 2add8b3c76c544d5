use crate::fmt::round_to;
use fbox_types::{UnitSnapshot, ONLINE_CODE, UNKNOWN_CODE};
use serde_json::{Map, Value};

/// 厂商用 -999 之类的值表示"无读数"
pub const SENTINEL_FLOOR: f64 = -900.0;

/// 冷却效率计算中的理想温差（°C）
const IDEAL_COOLING_DIFF: f64 = 20.0;

/// 数值字段转换：数字或数字字符串；解析失败或哨兵值返回 `None`
pub fn to_float(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !v.is_finite() || v <= SENTINEL_FLOOR {
        None
    } else {
        Some(v)
    }
}

fn to_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 按别名顺序取第一个可用的数值
fn first_float(data: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| data.get(*k).and_then(to_float))
}

fn first_text(data: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| data.get(*k).and_then(to_text))
}

fn first_count(data: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    keys.iter().find_map(|k| data.get(*k).and_then(to_count))
}

/// 定位数据对象
///
/// 优先使用非空的 `data` 对象；否则解析字符串形式的 `info`（或直接使用 `info` 对象）；
/// 都没有时返回空表。
pub fn locate_data(response: &Value) -> Map<String, Value> {
    if let Some(Value::Object(data)) = response.get("data") {
        if !data.is_empty() {
            return data.clone();
        }
    }

    match response.get("info") {
        Some(Value::String(info)) => match serde_json::from_str::<Value>(info) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

/// 顶层状态码，缺失或无法识别时为 -1
pub fn status_code(response: &Value) -> i64 {
    match response.get("code") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .unwrap_or(UNKNOWN_CODE),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(UNKNOWN_CODE),
        _ => UNKNOWN_CODE,
    }
}

/// 所有子单元的主温度读数
pub fn sub_unit_temperatures(data: &Map<String, Value>) -> Vec<f64> {
    let Some(Value::Array(sub_boxes)) = data.get("sub_box_list") else {
        return Vec::new();
    };

    sub_boxes
        .iter()
        .filter_map(|sb| match sb.get("main_temperatures") {
            Some(Value::Array(temps)) => Some(temps),
            _ => None,
        })
        .flatten()
        .filter_map(|t| t.get("num").and_then(to_float))
        .collect()
}

/// 把一个单元的原始响应规范化为快照
///
/// 不会失败：最坏情况下所有字段为 `None`。状态码不是在线码的单元只保留状态码。
pub fn extract_snapshot(detail: &Value, power: Option<&Value>) -> UnitSnapshot {
    let code = status_code(detail);
    if code != ONLINE_CODE {
        return UnitSnapshot::offline(code);
    }

    let data = locate_data(detail);
    let temps = sub_unit_temperatures(&data);

    let oil_temp = if temps.is_empty() {
        None
    } else {
        Some(round_to(temps.iter().sum::<f64>() / temps.len() as f64, 1))
    };
    let container_temp = first_float(&data, &["fbox_temp"]);

    // realtime_power 单位为 GH/s
    let hashrate_ph = first_float(&data, &["realtime_power"])
        .filter(|gh| *gh > 0.0)
        .map(|gh| round_to(gh / 1000.0, 2));

    let power_kw = first_float(&data, &["total_realtime_power"]).or_else(|| {
        power
            .map(locate_data)
            .and_then(|p| first_float(&p, &["total_realtime_power"]))
    });

    let (temp_diff, cooling_efficiency) = match (oil_temp, container_temp) {
        (Some(oil), Some(ambient)) => {
            let efficiency = (oil > ambient)
                .then(|| round_to((oil - ambient) / IDEAL_COOLING_DIFF * 100.0, 1).min(100.0));
            (Some(round_to((oil - ambient).abs(), 1)), efficiency)
        }
        _ => (None, None),
    };

    let temp_min = temps.iter().copied().reduce(f64::min);
    let temp_max = temps.iter().copied().reduce(f64::max);
    let temp_range = match (temp_min, temp_max) {
        (Some(min), Some(max)) => Some(round_to(max - min, 1)),
        _ => None,
    };

    UnitSnapshot {
        code,
        container_type: first_text(&data, &["fbox_type_name", "type_name"]),
        oil_temp,
        container_temp,
        miner_online: first_count(&data, &["miner_online"]),
        miner_offline: first_count(&data, &["miner_offline"]),
        hashrate_ph,
        power_kw,
        immersion_status: first_text(&data, &["immersion_status", "immersion"]),
        immersion_percent: first_float(&data, &["immersion_percent"]),
        fan_status: first_text(&data, &["fan_status", "fan_state"]),
        tank_level: first_float(&data, &["tank_level", "oil_level"]),
        oil_flow: first_float(&data, &["oil_flow", "flow_rate"]),
        pressure: first_float(&data, &["pressure", "system_pressure"]),
        pump_status: first_text(&data, &["pump_status", "pump_state"]),
        pump_rpm: first_float(&data, &["pump_rpm"]),
        filter_status: first_text(&data, &["filter_status", "filter_state"]),
        filter_diff_pressure: first_float(&data, &["filter_diff_pressure"]),
        temp_inlet: first_float(&data, &["temp_inlet", "inlet_temp"]),
        temp_outlet: first_float(&data, &["temp_outlet", "outlet_temp"]),
        temp_diff,
        cooling_efficiency,
        temp_min,
        temp_max,
        temp_range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn online_detail(data: Value) -> Value {
        json!({ "code": 1, "data": data })
    }

    #[test]
    fn test_sentinel_values_become_none() {
        assert_eq!(to_float(&json!(-999)), None);
        assert_eq!(to_float(&json!("-900")), None);
        assert_eq!(to_float(&json!(-899.5)), Some(-899.5));
        assert_eq!(to_float(&json!(" 42.5 ")), Some(42.5));
        assert_eq!(to_float(&json!(0)), Some(0.0));
        assert_eq!(to_float(&json!("abc")), None);
        assert_eq!(to_float(&json!(null)), None);
        assert_eq!(to_float(&json!(true)), None);
    }

    #[test]
    fn test_locate_data_prefers_data_object() {
        let response = json!({"data": {"a": 1}, "info": "{\"a\": 2}"});
        assert_eq!(locate_data(&response)["a"], 1);
    }

    #[test]
    fn test_locate_data_parses_info_string() {
        let response = json!({"data": {}, "info": "{\"fbox_temp\": \"31.5\"}"});
        assert_eq!(locate_data(&response)["fbox_temp"], "31.5");

        let response = json!({"info": {"fbox_temp": 30}});
        assert_eq!(locate_data(&response)["fbox_temp"], 30);

        let response = json!({"info": "not json"});
        assert!(locate_data(&response).is_empty());
    }

    #[test]
    fn test_oil_temperature_mean_skips_sentinels() {
        let detail = online_detail(json!({
            "sub_box_list": [
                {"main_temperatures": [{"num": 48.0}, {"num": "49.0"}]},
                {"main_temperatures": [{"num": -999}, {"num": 50.5}]},
                {"other": []}
            ]
        }));

        let snap = extract_snapshot(&detail, None);
        assert_eq!(snap.oil_temp, Some(49.2));
        assert_eq!(snap.temp_min, Some(48.0));
        assert_eq!(snap.temp_max, Some(50.5));
        assert_eq!(snap.temp_range, Some(2.5));
    }

    #[test]
    fn test_hashrate_and_power() {
        let detail = online_detail(json!({
            "realtime_power": "12345.6",
            "miner_online": "118",
            "miner_offline": 2
        }));
        let power = json!({"code": 1, "data": {"total_realtime_power": 351.2}});

        let snap = extract_snapshot(&detail, Some(&power));
        assert_eq!(snap.hashrate_ph, Some(12.35));
        assert_eq!(snap.power_kw, Some(351.2));
        assert_eq!(snap.miner_counts(), Some((118, 2)));
    }

    #[test]
    fn test_zero_hashrate_is_unknown() {
        let snap = extract_snapshot(&online_detail(json!({"realtime_power": 0})), None);
        assert_eq!(snap.hashrate_ph, None);
    }

    #[test]
    fn test_detail_power_wins_over_power_response() {
        let detail = online_detail(json!({"total_realtime_power": 0}));
        let power = json!({"data": {"total_realtime_power": 300}});

        let snap = extract_snapshot(&detail, Some(&power));
        assert_eq!(snap.power_kw, Some(0.0));
    }

    #[test]
    fn test_field_aliases() {
        let detail = online_detail(json!({
            "immersion": "Normal",
            "oil_level": 80,
            "flow_rate": "9.5",
            "system_pressure": 2.1,
            "pump_state": "ON",
            "filter_state": "OK",
            "inlet_temp": 40,
            "outlet_temp": 46,
            "type_name": "Exhaust Fan"
        }));

        let snap = extract_snapshot(&detail, None);
        assert_eq!(snap.immersion_status.as_deref(), Some("Normal"));
        assert_eq!(snap.tank_level, Some(80.0));
        assert_eq!(snap.oil_flow, Some(9.5));
        assert_eq!(snap.pressure, Some(2.1));
        assert_eq!(snap.pump_status.as_deref(), Some("ON"));
        assert_eq!(snap.filter_status.as_deref(), Some("OK"));
        assert_eq!(snap.temp_inlet, Some(40.0));
        assert_eq!(snap.temp_outlet, Some(46.0));
        assert_eq!(snap.container_type.as_deref(), Some("Exhaust Fan"));
    }

    #[test]
    fn test_derived_cooling_fields() {
        let detail = online_detail(json!({
            "fbox_temp": 30.0,
            "sub_box_list": [{"main_temperatures": [{"num": 44.0}]}]
        }));

        let snap = extract_snapshot(&detail, None);
        assert_eq!(snap.temp_diff, Some(14.0));
        assert_eq!(snap.cooling_efficiency, Some(70.0));

        let detail = online_detail(json!({
            "fbox_temp": 20.0,
            "sub_box_list": [{"main_temperatures": [{"num": 50.0}]}]
        }));
        assert_eq!(extract_snapshot(&detail, None).cooling_efficiency, Some(100.0));

        let detail = online_detail(json!({
            "fbox_temp": 40.0,
            "sub_box_list": [{"main_temperatures": [{"num": 35.0}]}]
        }));
        let snap = extract_snapshot(&detail, None);
        assert_eq!(snap.temp_diff, Some(5.0));
        assert_eq!(snap.cooling_efficiency, None);
    }

    #[test]
    fn test_offline_code_yields_offline_snapshot() {
        let detail = json!({"code": 0, "data": {"miner_online": 100, "fbox_temp": 30}});
        let snap = extract_snapshot(&detail, None);

        assert_eq!(snap, UnitSnapshot::offline(0));
        assert_eq!(snap.miner_online, None);
    }

    #[test]
    fn test_missing_code() {
        let snap = extract_snapshot(&json!({"data": {"fbox_temp": 30}}), None);
        assert_eq!(snap.code, UNKNOWN_CODE);
        assert_eq!(snap.container_temp, None);
    }

    #[test]
    fn test_empty_payload_never_fails() {
        let snap = extract_snapshot(&json!({"code": 1}), None);
        assert_eq!(snap.code, ONLINE_CODE);
        assert_eq!(snap.oil_temp, None);
        assert_eq!(snap.miner_counts(), None);
        assert_eq!(snap.power_kw, None);
    }
}
