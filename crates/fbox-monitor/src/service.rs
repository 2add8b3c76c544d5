use crate::change::has_changed;
use crate::evaluator::AlertEvaluator;
use crate::extractor::extract_snapshot;
use crate::report;
use crate::scheduler::ReportScheduler;
use crate::stats::aggregate;
use chrono::{DateTime, FixedOffset};
use fbox_api::{FetchError, UnitSource};
use fbox_config::{FboxConfig, MonitorProfile, ScheduleConfig, UnitConfig};
use fbox_notify::{NotifyLevel, NotifyManager, NotifyMessage};
use fbox_storage::StateStore;
use fbox_types::{AlertEvent, StateMap, UnitSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// 读取单元失败：失败的接口与错误
#[derive(Debug, Clone, PartialEq)]
pub struct ReadFailure {
    /// `"detail"` 或 `"power"`
    pub what: &'static str,
    pub error: FetchError,
}

impl ReadFailure {
    pub fn detail(error: FetchError) -> Self {
        Self {
            what: "detail",
            error,
        }
    }

    pub fn power(error: FetchError) -> Self {
        Self {
            what: "power",
            error,
        }
    }
}

/// 单元在本周期的读取结果
#[derive(Debug, Clone, PartialEq)]
pub struct UnitReading {
    pub unit: String,
    pub outcome: Result<UnitSnapshot, ReadFailure>,
}

impl UnitReading {
    pub fn ok(unit: impl Into<String>, snapshot: UnitSnapshot) -> Self {
        Self {
            unit: unit.into(),
            outcome: Ok(snapshot),
        }
    }

    pub fn failed(unit: impl Into<String>, failure: ReadFailure) -> Self {
        Self {
            unit: unit.into(),
            outcome: Err(failure),
        }
    }

    pub fn snapshot(&self) -> Option<&UnitSnapshot> {
        self.outcome.as_ref().ok()
    }
}

/// 一次检查周期的结果
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub readings: Vec<UnitReading>,
    pub alerts: Vec<AlertEvent>,
    pub changed: bool,
    pub full_report_sent: bool,
    pub weekly_report_sent: bool,
}

pub struct CheckTaskHandle {
    shutdown_tx: watch::Sender<bool>,
    join_handle: JoinHandle<()>,
}

impl CheckTaskHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.join_handle.await;
    }

    pub fn abort(self) {
        self.join_handle.abort();
    }
}

/// 检查服务
///
/// 一个周期：读取 → 提取 → 评估告警 → 发送 → 持久化 → 周期报告。
/// 上游、存储和通知的失败都不会中断周期。
pub struct CheckService {
    source: Arc<dyn UnitSource>,
    notify_manager: Arc<NotifyManager>,
    store: StateStore,
    evaluator: AlertEvaluator,
    scheduler: ReportScheduler,
    units: Vec<UnitConfig>,
    profile: MonitorProfile,
    schedule: ScheduleConfig,
    /// 演练模式：不写任何状态文件
    read_only: bool,
}

impl CheckService {
    pub fn new(
        config: &FboxConfig,
        profile: MonitorProfile,
        source: Arc<dyn UnitSource>,
        notify_manager: Arc<NotifyManager>,
    ) -> Self {
        let store = StateStore::new(config.storage.data_dir.clone())
            .with_prefix(profile.file_prefix())
            .with_caps(
                config.storage.history_max_records,
                config.storage.alerts_max_records,
            );

        Self {
            source,
            notify_manager,
            store,
            evaluator: AlertEvaluator::for_profile(profile, config.thresholds_for(profile)),
            scheduler: ReportScheduler::from_config(&config.schedule),
            units: config.units.clone(),
            profile,
            schedule: config.schedule.clone(),
            read_only: false,
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// 依次读取所有单元
    pub async fn read_units(&self) -> Vec<UnitReading> {
        let mut readings = Vec::with_capacity(self.units.len());

        for unit in &self.units {
            let reading = match self.read_unit(unit).await {
                Ok(snapshot) => UnitReading::ok(&unit.name, snapshot),
                Err(failure) => {
                    warn!(
                        unit = %unit.name,
                        id = unit.id,
                        endpoint = failure.what,
                        error = %failure.error,
                        "Failed to read unit, skipping this cycle"
                    );
                    UnitReading::failed(&unit.name, failure)
                }
            };
            readings.push(reading);
        }

        readings
    }

    async fn read_unit(&self, unit: &UnitConfig) -> Result<UnitSnapshot, ReadFailure> {
        let detail = self
            .source
            .fetch_detail(unit.id)
            .await
            .map_err(ReadFailure::detail)?;

        let power = match self.profile {
            MonitorProfile::Container => Some(
                self.source
                    .fetch_power(unit.id)
                    .await
                    .map_err(ReadFailure::power)?,
            ),
            MonitorProfile::Tank => None,
        };

        let snapshot = extract_snapshot(&detail, power.as_ref());
        debug!(unit = %unit.name, code = snapshot.code, "Unit snapshot extracted");
        Ok(snapshot)
    }

    /// 执行一次检查周期
    pub async fn run_cycle(&self, now: DateTime<FixedOffset>) -> CycleOutcome {
        let readings = self.read_units().await;
        let new_state: StateMap = readings
            .iter()
            .filter_map(|r| r.snapshot().map(|s| (r.unit.clone(), s.clone())))
            .collect();

        let old_state = self.store.load_state().await;

        // 告警不受变化检测影响
        let alerts = self.evaluator.evaluate(&old_state, &new_state);
        if alerts.is_empty() {
            info!("No alerts detected");
        } else {
            self.dispatch_alerts(&alerts, now).await;
        }

        let changed = has_changed(&old_state, &new_state);
        let full_report_sent = self.maybe_send_full_report(&readings, changed, now).await;

        if !self.read_only {
            self.store.save_state(&new_state).await;
            if !new_state.is_empty() {
                self.store.append_history(&new_state, now).await;
            }
        }

        let weekly_report_sent = self.maybe_send_weekly_report(now).await;

        info!(
            profile = ?self.profile,
            units = readings.len(),
            alerts = alerts.len(),
            changed,
            full_report_sent,
            weekly_report_sent,
            "Check cycle finished"
        );

        CycleOutcome {
            readings,
            alerts,
            changed,
            full_report_sent,
            weekly_report_sent,
        }
    }

    async fn dispatch_alerts(&self, alerts: &[AlertEvent], now: DateTime<FixedOffset>) {
        let level = alerts
            .iter()
            .map(|a| NotifyLevel::from(a.severity))
            .max()
            .unwrap_or(NotifyLevel::Warning);

        let content = report::alert_message(alerts, now);
        let message = NotifyMessage::new(format!("{} FBOX alert(s)", alerts.len()), content, level);
        let delivered = self.notify_manager.broadcast(&message).await;
        warn!(alerts = alerts.len(), delivered, "Alerts dispatched");

        if !self.read_only {
            let messages: Vec<String> = alerts.iter().map(|a| a.message.clone()).collect();
            self.store.append_alerts(&messages, now).await;
        }
    }

    async fn maybe_send_full_report(
        &self,
        readings: &[UnitReading],
        changed: bool,
        now: DateTime<FixedOffset>,
    ) -> bool {
        let last = self.store.last_full_report().await;
        if !self.scheduler.full_report_due(last.as_deref(), now) {
            debug!(last = ?last, "Full report not due");
            return false;
        }

        let mut sent = false;
        if changed || self.schedule.report_unchanged {
            let content =
                report::status_report(self.profile, readings, self.evaluator.thresholds(), now);
            let delivered = self
                .notify_manager
                .broadcast(&NotifyMessage::info("Status report", content))
                .await;
            sent = delivered > 0;
        } else {
            info!("Fleet unchanged, skipping full report");
        }

        // 无论是否发送，本周期都算已处理
        if !self.read_only {
            self.store.mark_full_report_sent(now).await;
        }
        sent
    }

    async fn maybe_send_weekly_report(&self, now: DateTime<FixedOffset>) -> bool {
        if self.profile != MonitorProfile::Container {
            return false;
        }

        let last = self.store.last_weekly_report().await;
        if !self.scheduler.weekly_report_due(last.as_deref(), now) {
            return false;
        }

        let history = self.store.load_history().await;
        let stats = aggregate(&history);
        let content = report::weekly_digest(&stats, now, self.schedule.check_interval_minutes);
        let delivered = self
            .notify_manager
            .broadcast(&NotifyMessage::info("Weekly report", content))
            .await;

        if !self.read_only {
            self.store.mark_weekly_report_sent(now).await;
        }
        delivered > 0
    }

    /// 按检查间隔常驻运行
    pub fn start_task(self: Arc<Self>) -> CheckTaskHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = Duration::from_secs(self.schedule.check_interval_minutes.max(1) * 60);

        let join_handle = tokio::spawn(async move {
            let mut interval = interval(period);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let now = self.schedule.now();
                        info!("Running check at {}", now.format("%Y-%m-%d %H:%M:%S"));
                        self.run_cycle(now).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Check task stopped");
        });

        CheckTaskHandle {
            shutdown_tx,
            join_handle,
        }
    }
}
