//! Read access to the bot's user records.
//!
//! The monitor needs two things from the user store: who was active recently
//! (startup broadcast recipients) and aggregate usage counts (reports and the
//! dashboard). [`BackupDirectory`] reads both from the JSON backup the bot
//! writes periodically.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeDelta, Utc};
use hina_monitor_types::UsageStats;
use serde::Deserialize;
use serde_json::Value;

use crate::error::StoreError;
use crate::gateway::Identity;

/// Source of recipient lists and usage statistics.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Identities active within the last `window_days` days.
    async fn list_active_identities(&self, window_days: u32) -> Result<Vec<Identity>, StoreError>;

    async fn aggregate_stats(&self) -> Result<UsageStats, StoreError>;
}

/// Directory backed by the bot's `users_backup.json`.
#[derive(Debug, Clone)]
pub struct BackupDirectory {
    path: PathBuf,
}

impl BackupDirectory {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn read(&self) -> Result<Backup, StoreError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        serde_json::from_str(&content).map_err(|e| StoreError::json(&self.path, e))
    }

    /// Active, non-banned identities relative to `now` (UTC).
    pub async fn active_identities_at(
        &self,
        window_days: u32,
        now: NaiveDateTime,
    ) -> Result<Vec<Identity>, StoreError> {
        let cutoff = days_before(now, window_days);
        let backup = self.read().await?;

        let mut identities: Vec<Identity> = backup
            .users
            .iter()
            .filter(|u| !truthy(&u.is_banned))
            .filter(|u| u.active_since(cutoff))
            .map(|u| Identity(u.user_id))
            .collect();
        identities.sort();
        identities.dedup();
        Ok(identities)
    }

    /// Usage counts relative to `now` (UTC); active means the last 24 hours.
    pub async fn stats_at(&self, now: NaiveDateTime) -> Result<UsageStats, StoreError> {
        let backup = self.read().await?;
        let cutoff = days_before(now, 1);

        Ok(UsageStats {
            total_users: backup.users.len() as u64,
            active_users: backup.users.iter().filter(|u| u.active_since(cutoff)).count() as u64,
            total_groups: backup.groups.len() as u64,
            total_commands: backup.users.iter().map(|u| u.total_commands).sum(),
        })
    }
}

#[async_trait]
impl Directory for BackupDirectory {
    async fn list_active_identities(&self, window_days: u32) -> Result<Vec<Identity>, StoreError> {
        self.active_identities_at(window_days, Utc::now().naive_utc())
            .await
    }

    async fn aggregate_stats(&self) -> Result<UsageStats, StoreError> {
        self.stats_at(Utc::now().naive_utc()).await
    }
}

/// `now` minus `days`, saturating at the earliest representable time.
fn days_before(now: NaiveDateTime, days: u32) -> NaiveDateTime {
    TimeDelta::try_days(i64::from(days))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(NaiveDateTime::MIN)
}

#[derive(Debug, Deserialize)]
struct Backup {
    #[serde(default)]
    users: Vec<UserRecord>,
    #[serde(default)]
    groups: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    user_id: i64,
    #[serde(default)]
    last_activity: Option<String>,
    #[serde(default)]
    total_commands: u64,
    #[serde(default)]
    is_banned: Value,
}

impl UserRecord {
    fn active_since(&self, cutoff: NaiveDateTime) -> bool {
        self.last_activity
            .as_deref()
            .and_then(parse_timestamp)
            .is_some_and(|t| t > cutoff)
    }
}

/// Timestamps come either as SQLite `CURRENT_TIMESTAMP` or ISO-8601.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
}

/// SQLite exports booleans as 0/1.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.as_str(), "1" | "true" | "True"),
        _ => false,
    }
}
