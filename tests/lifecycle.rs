//! End-to-end runs of a started monitor against in-memory collaborators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hina_monitor::{
    DashboardOutput, DashboardSnapshot, Directory, GatewayError, HealthLevel, HostMetrics,
    Identity, JsonFileStore, MessagingGateway, MetricsSource, Monitor, MonitorState, StoreError,
    UsageStats,
};
use parking_lot::Mutex;
use tempfile::TempDir;

const OWNER: Identity = Identity(1000);

#[derive(Default)]
struct RecordingGateway {
    sent: Mutex<Vec<(Identity, String)>>,
    unreachable: AtomicBool,
}

impl RecordingGateway {
    fn to(&self, who: Identity) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| *to == who)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_message(&self, to: Identity, text: &str) -> Result<(), GatewayError> {
        self.sent.lock().push((to, text.to_string()));
        Ok(())
    }

    async fn get_self_identity(&self) -> Result<Identity, GatewayError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(GatewayError::Timeout);
        }
        Ok(Identity(1))
    }
}

struct Users(Vec<Identity>);

#[async_trait]
impl Directory for Users {
    async fn list_active_identities(&self, _window_days: u32) -> Result<Vec<Identity>, StoreError> {
        Ok(self.0.clone())
    }

    async fn aggregate_stats(&self) -> Result<UsageStats, StoreError> {
        Ok(UsageStats {
            total_users: self.0.len() as u64,
            active_users: self.0.len() as u64,
            ..UsageStats::default()
        })
    }
}

struct Quiet;

#[async_trait]
impl MetricsSource for Quiet {
    async fn sample(&mut self) -> HostMetrics {
        HostMetrics {
            cpu_pct: 5.0,
            memory_pct: 25.0,
            disk_pct: 40.0,
            ..HostMetrics::default()
        }
    }
}

fn monitor(
    gateway: Arc<RecordingGateway>,
    dir: &TempDir,
    output: DashboardOutput,
) -> Monitor {
    Monitor::builder(OWNER)
        .gateway(gateway)
        .directory(Arc::new(Users(vec![Identity(7), Identity(8)])))
        .counter_store(Box::new(JsonFileStore::new(dir.path().join("monitoring_data.json"))))
        .sampler(Box::new(Quiet))
        .output(DashboardOutput::file(dir.path().join("web_stats.json")))
        .output(output)
        .interval(Duration::from_secs(60))
        .broadcast_delay(Duration::from_millis(100))
        .alert_cooldown(Duration::from_secs(300))
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn outage_is_alerted_once_and_restart_budget_holds() {
    let dir = TempDir::new().unwrap();
    let gateway = Arc::new(RecordingGateway::default());
    let (output, mut snapshots) = DashboardOutput::channel(16);

    // First process: broadcasts, sees an outage, then stops.
    let handle = monitor(gateway.clone(), &dir, output).start();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(gateway.to(Identity(7)).len(), 1);
    assert_eq!(gateway.to(Identity(8)).len(), 1);
    assert_eq!(handle.status().level(), Some(HealthLevel::Good));

    gateway.unreachable.store(true, Ordering::SeqCst);
    // Ticks at 60s, 120s and 180s all see the outage; only the first alerts.
    tokio::time::sleep(Duration::from_secs(170)).await;
    assert_eq!(handle.status().level(), Some(HealthLevel::Critical));
    let owner_messages = gateway.to(OWNER);
    assert_eq!(owner_messages.len(), 1);
    assert!(owner_messages[0].contains("service unreachable"));

    assert_eq!(handle.shutdown("deploy").await.unwrap(), MonitorState::Stopped);
    assert!(gateway.to(OWNER).last().unwrap().contains("Reason: deploy"));

    let mut levels = Vec::new();
    while let Ok(snapshot) = snapshots.try_recv() {
        levels.push(snapshot.level);
    }
    assert_eq!(
        levels,
        vec![
            HealthLevel::Good,
            HealthLevel::Critical,
            HealthLevel::Critical,
            HealthLevel::Critical
        ]
    );

    let written = std::fs::read_to_string(dir.path().join("web_stats.json")).unwrap();
    let dashboard: DashboardSnapshot = serde_json::from_str(&written).unwrap();
    assert_eq!(dashboard.level, HealthLevel::Critical);
    assert_eq!(dashboard.database.total_users, 2);
    assert_eq!(dashboard.bot.latency_ms, None);

    // Second process the same day: restart 2 still only allows one broadcast.
    gateway.unreachable.store(false, Ordering::SeqCst);
    let (output, _snapshots) = DashboardOutput::channel(16);
    let mut second = monitor(gateway.clone(), &dir, output);
    second.startup().await;
    assert_eq!(second.counters().restart_count, 2);
    assert_eq!(second.counters().broadcast_count, 1);
    assert_eq!(gateway.to(Identity(7)).len(), 1);
}
