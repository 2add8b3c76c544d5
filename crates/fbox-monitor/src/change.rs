use fbox_types::{StateMap, UnitSnapshot};

/// 油温变化超过该值才算"有变化"（°C）
pub const OIL_TEMP_CHANGE: f64 = 3.0;

/// 舰队状态是否有值得报告的变化
///
/// 只用于整点报告的去重，告警评估不受影响。
pub fn has_changed(old: &StateMap, new: &StateMap) -> bool {
    if old.is_empty() {
        return true;
    }

    new.iter().any(|(unit, current)| match old.get(unit) {
        None => true,
        Some(previous) => unit_changed(previous, current),
    })
}

fn unit_changed(old: &UnitSnapshot, new: &UnitSnapshot) -> bool {
    if old.code != new.code {
        return true;
    }
    if old.miner_online != new.miner_online || old.miner_offline != new.miner_offline {
        return true;
    }

    match (old.oil_temp, new.oil_temp) {
        (Some(a), Some(b)) => (a - b).abs() > OIL_TEMP_CHANGE,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbox_types::ONLINE_CODE;

    fn unit(on: u32, off: u32, oil: f64) -> UnitSnapshot {
        UnitSnapshot {
            code: ONLINE_CODE,
            miner_online: Some(on),
            miner_offline: Some(off),
            oil_temp: Some(oil),
            ..Default::default()
        }
    }

    fn fleet(units: &[(&str, UnitSnapshot)]) -> StateMap {
        units
            .iter()
            .map(|(name, snap)| (name.to_string(), snap.clone()))
            .collect()
    }

    #[test]
    fn test_empty_old_is_changed() {
        assert!(has_changed(&StateMap::new(), &StateMap::new()));
        assert!(has_changed(&StateMap::new(), &fleet(&[("C01", unit(5, 0, 40.0))])));
    }

    #[test]
    fn test_identical_is_unchanged() {
        let state = fleet(&[("C01", unit(5, 0, 40.0)), ("C02", UnitSnapshot::offline(0))]);
        assert!(!has_changed(&state, &state.clone()));
    }

    #[test]
    fn test_small_temperature_drift_is_ignored() {
        let old = fleet(&[("C01", unit(5, 0, 40.0))]);
        assert!(!has_changed(&old, &fleet(&[("C01", unit(5, 0, 43.0))])));
        assert!(has_changed(&old, &fleet(&[("C01", unit(5, 0, 43.5))])));
    }

    #[test]
    fn test_status_counts_and_new_units() {
        let old = fleet(&[("C01", unit(5, 0, 40.0))]);
        assert!(has_changed(&old, &fleet(&[("C01", UnitSnapshot::offline(0))])));
        assert!(has_changed(&old, &fleet(&[("C01", unit(4, 1, 40.0))])));
        assert!(has_changed(
            &old,
            &fleet(&[("C01", unit(5, 0, 40.0)), ("C02", unit(5, 0, 40.0))])
        ));
    }

    #[test]
    fn test_removed_unit_alone_is_not_a_change() {
        let old = fleet(&[("C01", unit(5, 0, 40.0)), ("C02", unit(5, 0, 40.0))]);
        assert!(!has_changed(&old, &fleet(&[("C01", unit(5, 0, 40.0))])));
    }
}
