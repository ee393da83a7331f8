//! The monitoring loop.
//!
//! A [`Monitor`] owns every collaborator of one monitoring process: it counts
//! the restart and broadcasts the startup notice, then ticks on a fixed
//! interval, each tick sampling the host, probing the gateway, evaluating
//! health, alerting the owner, and exporting a dashboard document.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate, Utc};
use hina_monitor_types::{
    DashboardSnapshot, HealthLevel, HealthSnapshot, HostMetrics, UsageStats,
};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::alert::{AlertDispatcher, DEFAULT_COOLDOWN, MONITORING_ERROR, SYSTEM_HEALTH};
use crate::broadcast::fan_out;
use crate::config::Settings;
use crate::counter::{CounterStore, DailyCounterState, RestartCounter, StartupDecision};
use crate::directory::Directory;
use crate::duration::format_uptime;
use crate::error::TickError;
use crate::evaluator::{evaluate, Thresholds};
use crate::export::DashboardOutput;
use crate::gateway::{Identity, MessagingGateway};
use crate::history::PingHistory;
use crate::messages;
use crate::prober::{ConnectivityChecker, LatencyProber};
use crate::sampler::{MetricsSource, SystemSampler};
use crate::status::{StatusHandle, StatusReport};

/// The builder was missing a collaborator or given an unusable setting.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("monitor requires a {0}")]
    Missing(&'static str),

    #[error("tick interval must be greater than zero")]
    ZeroInterval,
}

/// Lifecycle of a started monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Running,
    Stopped,
}

/// Periodic health monitor for one bot process.
///
/// # Example
///
/// ```rust,no_run
/// use hina_monitor::{
///     BackupDirectory, DashboardOutput, Identity, JsonFileStore, Monitor, TelegramGateway,
/// };
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let gateway = TelegramGateway::builder().token("123:abc").build()?;
///
///     let monitor = Monitor::builder(Identity(42))
///         .gateway(Arc::new(gateway))
///         .directory(Arc::new(BackupDirectory::new("users_backup.json")))
///         .counter_store(Box::new(JsonFileStore::new("monitoring_data.json")))
///         .output(DashboardOutput::file("web_stats.json"))
///         .interval(Duration::from_secs(60))
///         .build()?;
///
///     let handle = monitor.start();
///     tokio::signal::ctrl_c().await?;
///     handle.shutdown("interrupted").await?;
///     Ok(())
/// }
/// ```
pub struct Monitor {
    gateway: Arc<dyn MessagingGateway>,
    directory: Arc<dyn Directory>,
    sampler: Box<dyn MetricsSource>,
    prober: LatencyProber,
    connectivity: Option<ConnectivityChecker>,
    dispatcher: AlertDispatcher,
    counter: RestartCounter,
    outputs: Vec<DashboardOutput>,
    thresholds: Thresholds,
    interval: Duration,
    broadcast_delay: Duration,
    active_window_days: u32,
    daily_report: bool,
    report_day: NaiveDate,
    history: PingHistory,
    status: StatusHandle,
    started: Instant,
}

impl Monitor {
    /// Create a builder for a monitor that reports to `owner`.
    pub fn builder(owner: Identity) -> MonitorBuilder {
        MonitorBuilder::new(owner)
    }

    /// A handle to the most recent tick's result.
    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Today's restart and broadcast counters.
    pub fn counters(&self) -> &DailyCounterState {
        self.counter.state()
    }

    pub fn history(&self) -> &PingHistory {
        &self.history
    }

    /// Text summary of recent probes and today's counters.
    pub fn stats_summary(&self) -> String {
        messages::stats_summary(&self.history, self.counter.state(), self.started.elapsed())
    }

    /// Count this start and, if today's budget allows, tell active users the
    /// bot is back.
    ///
    /// The counters are persisted before any message is sent.
    pub async fn startup(&mut self) -> StartupDecision {
        let now = Local::now();
        let decision = self.counter.record_restart(now.date_naive(), now.naive_local());

        match decision {
            StartupDecision::Skip { restart, allowed } => {
                info!(restart, allowed, "skipping startup broadcast");
            }
            StartupDecision::Broadcast {
                restart,
                broadcast,
                allowed,
            } => {
                let recipients = match self
                    .directory
                    .list_active_identities(self.active_window_days)
                    .await
                {
                    Ok(recipients) => recipients,
                    Err(e) => {
                        error!(error = %e, "could not list active users for startup broadcast");
                        Vec::new()
                    }
                };
                info!(
                    restart,
                    broadcast,
                    allowed,
                    recipients = recipients.len(),
                    "sending startup broadcast"
                );
                let text = messages::startup(restart, broadcast, allowed, now);
                fan_out(self.gateway.as_ref(), &recipients, &text, self.broadcast_delay).await;
            }
        }

        decision
    }

    /// Run one monitoring tick.
    ///
    /// Alerts are dispatched before the dashboard is written, so an export
    /// failure never hides a health alert.
    pub async fn tick(&mut self) -> Result<StatusReport, TickError> {
        let host = self.sampler.sample().await;
        let latency = self.prober.probe().await;
        if let Some(ms) = latency.millis() {
            self.history.record(Local::now(), ms);
        }
        let internet_connected = match &self.connectivity {
            Some(checker) => checker.check().await,
            None => None,
        };

        let snapshot = HealthSnapshot::new(host, latency, internet_connected);
        let evaluation = evaluate(&snapshot, &self.thresholds);
        let report = StatusReport {
            snapshot,
            evaluation,
        };
        self.status.publish(report.clone());

        self.dispatch(&report).await;

        let stats = self.usage_stats().await;
        self.maybe_send_daily_report(Local::now().date_naive(), &report.snapshot.host, &stats)
            .await;
        self.export(&report, stats).await?;

        Ok(report)
    }

    /// Send the owner a shutdown notice and persist the counters.
    pub async fn shutdown(&mut self, reason: &str) {
        info!(reason, "stopping monitor");
        let now = Local::now();
        let text = messages::shutdown(
            reason,
            self.started.elapsed(),
            self.counter.state().restart_count,
            now,
        );
        self.dispatcher.notify_owner(&text).await;
        self.counter.persist(now.naive_local());
        info!("monitor stopped");
    }

    /// Run startup and then tick in a background task until stopped.
    ///
    /// The first tick runs immediately after startup. A stop request is
    /// honored between ticks; a tick in flight always completes.
    pub fn start(mut self) -> MonitorHandle {
        let (stop_tx, mut stop_rx) = watch::channel::<Option<String>>(None);
        let (state_tx, state_rx) = watch::channel(MonitorState::Running);
        let status = self.status.clone();

        let task = tokio::spawn(async move {
            self.startup().await;

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let reason = loop {
                // A stop requested during a tick wins over a tick that is already due.
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() {
                            break "monitor handle dropped".to_string();
                        }
                        if let Some(reason) = stop_rx.borrow().clone() {
                            break reason;
                        }
                    }
                    _ = ticker.tick() => self.run_tick().await,
                }
            };

            self.shutdown(&reason).await;
            let _ = state_tx.send(MonitorState::Stopped);
        });

        MonitorHandle {
            stop_tx,
            state: state_rx,
            status,
            task,
        }
    }

    async fn run_tick(&mut self) {
        match self.tick().await {
            Ok(report) => debug!(level = %report.evaluation.level, "monitoring tick complete"),
            Err(e) => {
                error!(error = %e, "monitoring tick failed");
                let lines = [format!("monitoring system error: {e}")];
                self.dispatcher
                    .maybe_alert(MONITORING_ERROR, &lines, HealthLevel::Error)
                    .await;
            }
        }
    }

    async fn dispatch(&mut self, report: &StatusReport) {
        let level = report.evaluation.level;
        let alerts = &report.evaluation.alerts;
        match level {
            HealthLevel::Good => {}
            HealthLevel::Critical => {
                warn!(?alerts, "system health critical");
                let text = messages::critical_warning(&report.snapshot, level, alerts);
                self.dispatcher
                    .maybe_notify_at(SYSTEM_HEALTH, &text, Utc::now())
                    .await;
            }
            HealthLevel::Warning | HealthLevel::Error => {
                warn!(?alerts, %level, "system health degraded");
                self.dispatcher.maybe_alert(SYSTEM_HEALTH, alerts, level).await;
            }
        }
    }

    async fn usage_stats(&self) -> UsageStats {
        self.directory.aggregate_stats().await.unwrap_or_else(|e| {
            warn!(error = %e, "could not read usage stats");
            UsageStats::default()
        })
    }

    async fn maybe_send_daily_report(
        &mut self,
        today: NaiveDate,
        host: &HostMetrics,
        stats: &UsageStats,
    ) -> bool {
        if today == self.report_day {
            return false;
        }
        self.report_day = today;
        if !self.daily_report {
            return false;
        }

        let text = messages::daily_report(stats, host, Local::now());
        let sent = self.dispatcher.notify_owner(&text).await;
        if sent {
            info!(%today, "daily report sent");
        }
        sent
    }

    async fn export(&self, report: &StatusReport, stats: UsageStats) -> Result<(), TickError> {
        let dashboard = DashboardSnapshot::new(
            report.snapshot.clone(),
            report.evaluation.level,
            report.evaluation.alerts.clone(),
            stats,
            format_uptime(self.started.elapsed()),
        );

        let mut result = Ok(());
        for output in &self.outputs {
            if let Err(e) = output.emit(&dashboard).await {
                if result.is_ok() {
                    result = Err(TickError::Export(e));
                }
            }
        }
        result
    }
}

/// Builder for a [`Monitor`].
///
/// The gateway, directory and counter store are required. Without a sampler
/// the local host is sampled with [`SystemSampler`].
pub struct MonitorBuilder {
    owner: Identity,
    gateway: Option<Arc<dyn MessagingGateway>>,
    directory: Option<Arc<dyn Directory>>,
    counter_store: Option<Box<dyn CounterStore>>,
    sampler: Option<Box<dyn MetricsSource>>,
    connectivity: Option<ConnectivityChecker>,
    outputs: Vec<DashboardOutput>,
    thresholds: Thresholds,
    interval: Duration,
    cpu_window: Duration,
    probe_timeout: Duration,
    alert_cooldown: Duration,
    broadcast_delay: Duration,
    active_window_days: u32,
    daily_report: bool,
}

impl MonitorBuilder {
    pub fn new(owner: Identity) -> Self {
        Self {
            owner,
            gateway: None,
            directory: None,
            counter_store: None,
            sampler: None,
            connectivity: None,
            outputs: Vec::new(),
            thresholds: Thresholds::default(),
            interval: Duration::from_secs(60),
            cpu_window: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(10),
            alert_cooldown: DEFAULT_COOLDOWN,
            broadcast_delay: Duration::from_millis(100),
            active_window_days: 7,
            daily_report: true,
        }
    }

    /// Start from loaded settings: owner, timings, thresholds and report flag.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Identity(settings.owner_id))
            .thresholds(settings.thresholds.clone())
            .interval(settings.interval)
            .cpu_window(settings.cpu_window)
            .probe_timeout(settings.probe_timeout)
            .alert_cooldown(settings.alert_cooldown)
            .broadcast_delay(settings.broadcast_delay)
            .active_window_days(settings.active_window_days)
            .daily_report(settings.daily_report)
    }

    pub fn gateway(mut self, gateway: Arc<dyn MessagingGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn directory(mut self, directory: Arc<dyn Directory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn counter_store(mut self, store: Box<dyn CounterStore>) -> Self {
        self.counter_store = Some(store);
        self
    }

    pub fn sampler(mut self, sampler: Box<dyn MetricsSource>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// Also check general internet connectivity on every tick.
    pub fn connectivity(mut self, checker: ConnectivityChecker) -> Self {
        self.connectivity = Some(checker);
        self
    }

    /// Add a dashboard output. Every output receives every tick's document.
    pub fn output(mut self, output: DashboardOutput) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Time between the start of two ticks. Defaults to 60 seconds.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// CPU sampling window of the default sampler.
    pub fn cpu_window(mut self, window: Duration) -> Self {
        self.cpu_window = window;
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn alert_cooldown(mut self, cooldown: Duration) -> Self {
        self.alert_cooldown = cooldown;
        self
    }

    pub fn broadcast_delay(mut self, delay: Duration) -> Self {
        self.broadcast_delay = delay;
        self
    }

    pub fn active_window_days(mut self, days: u32) -> Self {
        self.active_window_days = days;
        self
    }

    pub fn daily_report(mut self, enabled: bool) -> Self {
        self.daily_report = enabled;
        self
    }

    /// Build the monitor, loading today's counters from the store.
    pub fn build(self) -> Result<Monitor, BuildError> {
        if self.interval.is_zero() {
            return Err(BuildError::ZeroInterval);
        }
        let gateway = self.gateway.ok_or(BuildError::Missing("messaging gateway"))?;
        let directory = self.directory.ok_or(BuildError::Missing("user directory"))?;
        let store = self.counter_store.ok_or(BuildError::Missing("counter store"))?;
        let sampler = match self.sampler {
            Some(sampler) => sampler,
            None => Box::new(SystemSampler::new(self.cpu_window)),
        };

        let today = Local::now().date_naive();
        Ok(Monitor {
            prober: LatencyProber::new(gateway.clone(), self.probe_timeout),
            dispatcher: AlertDispatcher::new(gateway.clone(), self.owner, self.alert_cooldown),
            counter: RestartCounter::load(store, today),
            gateway,
            directory,
            sampler,
            connectivity: self.connectivity,
            outputs: self.outputs,
            thresholds: self.thresholds,
            interval: self.interval,
            broadcast_delay: self.broadcast_delay,
            active_window_days: self.active_window_days,
            daily_report: self.daily_report,
            report_day: today,
            history: PingHistory::new(),
            status: StatusHandle::new(),
            started: Instant::now(),
        })
    }
}

/// Handle for controlling a started monitor.
///
/// Dropping the handle also stops the monitor, with a generic reason.
pub struct MonitorHandle {
    stop_tx: watch::Sender<Option<String>>,
    state: watch::Receiver<MonitorState>,
    status: StatusHandle,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Ask the monitor to stop after the current tick.
    pub fn stop(&self, reason: impl Into<String>) {
        let _ = self.stop_tx.send(Some(reason.into()));
    }

    /// Wait for the monitor task to finish and return its final state.
    pub async fn wait(self) -> Result<MonitorState, JoinError> {
        let MonitorHandle {
            stop_tx,
            state,
            task,
            ..
        } = self;
        task.await?;
        drop(stop_tx);
        let final_state = *state.borrow();
        Ok(final_state)
    }

    /// Stop the monitor and wait for the shutdown notice to go out.
    pub async fn shutdown(self, reason: impl Into<String>) -> Result<MonitorState, JoinError> {
        self.stop(reason);
        self.wait().await
    }
}
