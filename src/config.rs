//! Settings for the monitor, loaded once at process start.
//!
//! Sources are layered with the `config` crate: built-in defaults, an
//! optional TOML file, then `HINA__*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::duration::serde_duration;
use crate::evaluator::Thresholds;

/// Default config file looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "hina-monitor.toml";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Process-wide monitor settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Telegram bot token.
    pub bot_token: String,
    /// Chat id of the owner who receives alerts and reports.
    pub owner_id: i64,
    /// Base URL of the Bot API.
    pub api_base: String,
    /// Time between monitoring ticks.
    #[serde(deserialize_with = "serde_duration::deserialize")]
    pub interval: Duration,
    /// CPU sampling window.
    #[serde(deserialize_with = "serde_duration::deserialize")]
    pub cpu_window: Duration,
    /// Upper bound for one gateway round-trip.
    #[serde(deserialize_with = "serde_duration::deserialize")]
    pub probe_timeout: Duration,
    /// Minimum time between two alerts of the same category.
    #[serde(deserialize_with = "serde_duration::deserialize")]
    pub alert_cooldown: Duration,
    /// Pause between two startup broadcast messages.
    #[serde(deserialize_with = "serde_duration::deserialize")]
    pub broadcast_delay: Duration,
    /// Users active within this many days receive the startup broadcast.
    pub active_window_days: u32,
    pub counter_path: PathBuf,
    pub dashboard_path: PathBuf,
    /// JSON user backup produced by the bot.
    pub directory_path: PathBuf,
    /// URLs tried in order for the connectivity check; empty disables it.
    pub connectivity_urls: Vec<String>,
    /// Send the owner a report on the first tick of each new day.
    pub daily_report: bool,
    pub thresholds: Thresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            owner_id: 0,
            api_base: "https://api.telegram.org".to_string(),
            interval: Duration::from_secs(60),
            cpu_window: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(10),
            alert_cooldown: Duration::from_secs(300),
            broadcast_delay: Duration::from_millis(100),
            active_window_days: 7,
            counter_path: PathBuf::from("monitoring_data.json"),
            dashboard_path: PathBuf::from("web_stats.json"),
            directory_path: PathBuf::from("users_backup.json"),
            connectivity_urls: vec![
                "https://8.8.8.8".to_string(),
                "https://1.1.1.1".to_string(),
            ],
            daily_report: true,
            thresholds: Thresholds::default(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file plus the environment.
    ///
    /// A missing file is not an error; the defaults and environment apply.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("HINA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("connectivity_urls")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the monitor cannot run with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.bot_token.trim().is_empty() {
            return Err(SettingsError::Invalid {
                field: "bot_token",
                reason: "must not be empty".to_string(),
            });
        }
        if self.owner_id == 0 {
            return Err(SettingsError::Invalid {
                field: "owner_id",
                reason: "must be set to the owner's chat id".to_string(),
            });
        }
        if self.interval.is_zero() {
            return Err(SettingsError::Invalid {
                field: "interval",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.thresholds.latency_warn_ms > self.thresholds.latency_critical_ms {
            return Err(SettingsError::Invalid {
                field: "thresholds.latency_warn_ms",
                reason: "must not exceed latency_critical_ms".to_string(),
            });
        }
        Ok(())
    }
}
