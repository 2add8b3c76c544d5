use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use fbox_storage::{StateStore, StoreFile};
use fbox_types::{StateMap, UnitSnapshot, ONLINE_CODE};
use tempfile::TempDir;
use tokio_test::assert_ok;

fn base_time() -> DateTime<FixedOffset> {
    FixedOffset::west_opt(3 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 1, 6, 8, 0, 0)
        .unwrap()
}

fn sample_state() -> StateMap {
    let mut state = StateMap::new();
    state.insert(
        "C01".to_string(),
        UnitSnapshot {
            code: ONLINE_CODE,
            oil_temp: Some(48.3),
            container_temp: Some(31.0),
            miner_online: Some(120),
            miner_offline: Some(2),
            hashrate_ph: Some(12.45),
            power_kw: Some(0.0),
            fan_status: Some("ON".to_string()),
            ..Default::default()
        },
    );
    state.insert("C02".to_string(), UnitSnapshot::offline(0));
    state
}

#[tokio::test]
async fn test_state_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let store = StateStore::new(temp_dir.path());

    let state = sample_state();
    store.save_state(&state).await;

    assert_eq!(store.load_state().await, state);
}

#[tokio::test]
async fn test_history_cap_evicts_oldest() {
    let temp_dir = TempDir::new().unwrap();
    let store = StateStore::new(temp_dir.path()).with_caps(3, 3);
    let state = sample_state();

    for i in 0..5 {
        store
            .append_history(&state, base_time() + Duration::minutes(5 * i))
            .await;
    }

    let history = store.load_history().await;
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].timestamp, base_time() + Duration::minutes(10));
    assert_eq!(history[2].timestamp, base_time() + Duration::minutes(20));
}

#[tokio::test]
async fn test_alert_history_cap() {
    let temp_dir = TempDir::new().unwrap();
    let store = StateStore::new(temp_dir.path()).with_caps(10, 2);

    for i in 0..4 {
        store
            .append_alerts(&[format!("alert {}", i)], base_time() + Duration::minutes(i))
            .await;
    }

    let alerts = store.load_alert_history().await;
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].alerts, vec!["alert 2".to_string()]);
    assert_eq!(alerts[1].alerts, vec!["alert 3".to_string()]);
}

#[tokio::test]
async fn test_corrupt_files_fall_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let store = StateStore::new(temp_dir.path());

    assert_ok!(std::fs::write(store.path_of(StoreFile::State), "{ not json"));
    assert_ok!(std::fs::write(store.path_of(StoreFile::History), "[1, 2"));
    assert_ok!(std::fs::write(store.path_of(StoreFile::LastWeeklyReport), "garbage"));

    assert!(store.load_state().await.is_empty());
    assert!(store.last_weekly_report().await.is_none());

    // 损坏的历史文件被重新开始
    store.append_history(&sample_state(), base_time()).await;
    assert_eq!(store.load_history().await.len(), 1);
}

#[tokio::test]
async fn test_reads_legacy_files() {
    let temp_dir = TempDir::new().unwrap();
    let store = StateStore::new(temp_dir.path());

    let legacy_state = r#"{
        "C01": {"code": 0, "oil_temp": null, "miner_online": "N/A", "miner_offline": "N/A"},
        "C02": {"code": 1, "oil_temp": 45.2, "miner_online": 100, "miner_offline": 0}
    }"#;
    assert_ok!(std::fs::write(store.path_of(StoreFile::State), legacy_state));
    assert_ok!(std::fs::write(
        store.path_of(StoreFile::LastFullReport),
        r#"{"last_report_time": "2025-01-06T07:00:00.512341-03:00"}"#
    ));

    let state = store.load_state().await;
    assert_eq!(state["C01"].miner_online, None);
    assert_eq!(state["C02"].miner_counts(), Some((100, 0)));
    assert_eq!(
        store.last_full_report().await.as_deref(),
        Some("2025-01-06T07:00:00.512341-03:00")
    );
}

#[tokio::test]
async fn test_profiles_do_not_share_files() {
    let temp_dir = TempDir::new().unwrap();
    let container = StateStore::new(temp_dir.path());
    let tank = StateStore::new(temp_dir.path()).with_prefix("tank_");

    container.save_state(&sample_state()).await;
    tank.mark_weekly_report_sent(base_time()).await;

    assert!(tank.load_state().await.is_empty());
    assert!(container.last_weekly_report().await.is_none());
    assert!(tank.last_weekly_report().await.is_some());
}

#[tokio::test]
async fn test_last_update_id() {
    let temp_dir = TempDir::new().unwrap();
    let store = StateStore::new(temp_dir.path().join("nested"));

    store.save_last_update_id(981_234).await;
    assert_eq!(store.last_update_id().await, Some(981_234));
}
