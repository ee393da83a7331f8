//! # hina-monitor
//!
//! Health monitoring and alerting for a Telegram bot process.
//!
//! The monitor samples the host, probes the bot's gateway for latency,
//! classifies the result into a health level and alerts the bot owner when
//! something is wrong. On every start it counts the restart and, within a
//! daily budget, tells recently active users that the bot is back.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Monitor                             │
//! │  ┌─────────┐   ┌─────────┐   ┌───────────┐   ┌────────────┐  │
//! │  │ sampler │──▶│         │   │           │──▶│  alert     │──┼──▶ owner
//! │  │ (host)  │   │evaluator│──▶│ scheduler │   │(cooldown)  │  │
//! │  ├─────────┤   │ (level) │   │  (tick)   │──▶│  export    │──┼──▶ dashboard
//! │  │ prober  │──▶│         │   │           │   │(json file) │  │
//! │  │(latency)│   └─────────┘   └─────┬─────┘   └────────────┘  │
//! │  └─────────┘                       │ startup                 │
//! │                              ┌─────▼─────┐   ┌────────────┐  │
//! │                              │  counter  │──▶│ broadcast  │──┼──▶ active users
//! │                              │ (restarts)│   │ (fan-out)  │  │
//! │                              └───────────┘   └────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`sampler`]**: CPU, memory, disk and network readings via `sysinfo`
//! - **[`prober`]**: gateway round-trip latency and an optional connectivity check
//! - **[`evaluator`]**: pure mapping from a snapshot to a [`HealthLevel`] and alert lines
//! - **[`alert`]**: per-category cooldown in front of owner notifications
//! - **[`counter`]**: daily restart and broadcast counters with a persistent store
//! - **[`broadcast`]**: rate-limited fan-out of the startup notice
//! - **[`scheduler`]**: the [`Monitor`] that ties the pieces into a loop
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hina_monitor::{
//!     BackupDirectory, DashboardOutput, JsonFileStore, MonitorBuilder, Settings,
//!     TelegramGateway,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load(None)?;
//!     let gateway = TelegramGateway::builder()
//!         .token(settings.bot_token.clone())
//!         .build()?;
//!
//!     let handle = MonitorBuilder::from_settings(&settings)
//!         .gateway(Arc::new(gateway))
//!         .directory(Arc::new(BackupDirectory::new(&settings.directory_path)))
//!         .counter_store(Box::new(JsonFileStore::new(&settings.counter_path)))
//!         .output(DashboardOutput::file(&settings.dashboard_path))
//!         .build()?
//!         .start();
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown("interrupted").await?;
//!     Ok(())
//! }
//! ```

pub mod alert;
pub mod broadcast;
pub mod config;
pub mod counter;
pub mod directory;
pub mod duration;
pub mod error;
pub mod evaluator;
pub mod export;
pub mod gateway;
pub mod history;
pub mod messages;
pub mod prober;
pub mod sampler;
pub mod scheduler;
pub mod status;

#[cfg(test)]
mod testing;

pub use alert::AlertDispatcher;
pub use broadcast::{fan_out, BroadcastReport};
pub use config::{Settings, SettingsError};
pub use counter::{
    allowed_broadcasts, CounterStore, DailyCounterState, JsonFileStore, RestartCounter,
    StartupDecision,
};
pub use directory::{BackupDirectory, Directory};
pub use error::{GatewayError, StoreError, TickError};
pub use evaluator::{evaluate, Evaluation, Thresholds};
pub use export::DashboardOutput;
pub use gateway::{Identity, MessagingGateway, TelegramGateway, TelegramGatewayBuilder};
pub use history::{PingHistory, PingSample};
pub use prober::{ConnectivityChecker, LatencyProber};
pub use sampler::{MetricsSource, SystemSampler};
pub use scheduler::{BuildError, Monitor, MonitorBuilder, MonitorHandle, MonitorState};
pub use status::{StatusHandle, StatusReport};

// Re-export types for convenience
pub use hina_monitor_types::{
    BotStatus, DashboardSnapshot, HealthLevel, HealthSnapshot, HostMetrics, Latency, UsageStats,
};
