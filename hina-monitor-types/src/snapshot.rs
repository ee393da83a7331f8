//! Snapshot - a point-in-time view of host and bot health.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{BotStatus, HealthLevel, Latency, SchemaVersion};

/// Host metrics read by the sampler.
///
/// Fields that could not be read are left at zero.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HostMetrics {
    /// Global CPU utilization, 0..100.
    pub cpu_pct: f32,
    /// Used memory as a share of total, 0..100.
    pub memory_pct: f32,
    pub memory_total: u64,
    pub memory_available: u64,
    /// Used space on the primary volume, 0..100.
    pub disk_pct: f32,
    pub disk_total: u64,
    pub disk_free: u64,
    /// Bytes transmitted across all interfaces since boot.
    pub network_sent: u64,
    /// Bytes received across all interfaces since boot.
    pub network_recv: u64,
    pub process_count: usize,
    /// Seconds since the monitor process started.
    pub uptime_secs: u64,
}

impl HostMetrics {
    pub fn uptime(&self) -> Duration {
        Duration::from_secs(self.uptime_secs)
    }
}

/// One monitoring tick's view of the system.
///
/// Immutable once produced; recreated on every tick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Utc>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub host: HostMetrics,
    pub latency: Latency,
    /// `None` when the connectivity check is disabled.
    pub internet_connected: Option<bool>,
}

impl HealthSnapshot {
    /// Create a snapshot stamped with the current time.
    pub fn new(host: HostMetrics, latency: Latency, internet_connected: Option<bool>) -> Self {
        Self::with_timestamp(Utc::now(), host, latency, internet_connected)
    }

    pub fn with_timestamp(
        timestamp: DateTime<Utc>,
        host: HostMetrics,
        latency: Latency,
        internet_connected: Option<bool>,
    ) -> Self {
        Self {
            timestamp,
            host,
            latency,
            internet_connected,
        }
    }

    pub fn bot_status(&self) -> BotStatus {
        BotStatus::from(self.latency)
    }

    pub fn uptime(&self) -> Duration {
        self.host.uptime()
    }
}

/// Aggregate usage counters read from the bot's user store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UsageStats {
    pub total_users: u64,
    /// Users active in the last 24 hours.
    pub active_users: u64,
    pub total_groups: u64,
    pub total_commands: u64,
}

/// Bot section of the dashboard export.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BotInfo {
    pub status: BotStatus,
    pub latency_ms: Option<f64>,
    /// Human-readable uptime, e.g. "2d 3h 15m".
    pub uptime: String,
}

/// The document written to the dashboard location on every tick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DashboardSnapshot {
    pub version: SchemaVersion,
    pub last_update: DateTime<Utc>,
    pub system: HealthSnapshot,
    pub bot: BotInfo,
    pub level: HealthLevel,
    pub alerts: Vec<String>,
    pub database: UsageStats,
}

impl DashboardSnapshot {
    pub fn new(
        system: HealthSnapshot,
        level: HealthLevel,
        alerts: Vec<String>,
        database: UsageStats,
        uptime: String,
    ) -> Self {
        let bot = BotInfo {
            status: system.bot_status(),
            latency_ms: system.latency.millis(),
            uptime,
        };
        Self {
            version: SchemaVersion::current(),
            last_update: Utc::now(),
            system,
            bot,
            level,
            alerts,
            database,
        }
    }
}
