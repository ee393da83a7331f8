//! Cooldown-gated alert dispatch to the owner.
//!
//! Each alert category has its own cooldown window, so a host alert and a
//! monitoring-error alert never suppress each other. The cooldown starts when
//! a send is attempted, not when delivery is confirmed: at most one alert per
//! window per category, with no delivery guarantee.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use hina_monitor_types::HealthLevel;
use tracing::{debug, error, warn};

use crate::gateway::{Identity, MessagingGateway};
use crate::messages;

/// Category for threshold alerts raised by the health evaluator.
pub const SYSTEM_HEALTH: &str = "system_health";

/// Category for failures of the monitoring loop itself.
pub const MONITORING_ERROR: &str = "monitoring_error";

/// Default minimum time between two alerts of one category.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

/// Sends alerts to the owner identity, at most once per cooldown window per
/// category.
pub struct AlertDispatcher {
    gateway: Arc<dyn MessagingGateway>,
    owner: Identity,
    cooldown: Duration,
    last_fired: HashMap<String, DateTime<Utc>>,
}

impl AlertDispatcher {
    pub fn new(gateway: Arc<dyn MessagingGateway>, owner: Identity, cooldown: Duration) -> Self {
        Self {
            gateway,
            owner,
            cooldown,
            last_fired: HashMap::new(),
        }
    }

    pub fn owner(&self) -> Identity {
        self.owner
    }

    /// Whether `category` is outside its cooldown window at `now`.
    pub fn may_fire(&self, category: &str, now: DateTime<Utc>) -> bool {
        match self.last_fired.get(category) {
            None => true,
            // A negative elapsed time (clock stepped back) counts as inside the window.
            Some(last) => match (now - *last).to_std() {
                Ok(elapsed) => elapsed >= self.cooldown,
                Err(_) => false,
            },
        }
    }

    /// When `category` last fired, if ever.
    pub fn last_fired(&self, category: &str) -> Option<DateTime<Utc>> {
        self.last_fired.get(category).copied()
    }

    /// Format and send an alert unless the category is cooling down.
    ///
    /// Returns whether a send was attempted.
    pub async fn maybe_alert(&mut self, category: &str, lines: &[String], level: HealthLevel) -> bool {
        self.maybe_alert_at(category, lines, level, Utc::now()).await
    }

    pub async fn maybe_alert_at(
        &mut self,
        category: &str,
        lines: &[String],
        level: HealthLevel,
        now: DateTime<Utc>,
    ) -> bool {
        let text = messages::alert(category, level, lines, now.with_timezone(&Local));
        self.maybe_notify_at(category, &text, now).await
    }

    /// Send pre-formatted text under the cooldown of `category`.
    pub async fn maybe_notify_at(&mut self, category: &str, text: &str, now: DateTime<Utc>) -> bool {
        if !self.may_fire(category, now) {
            debug!(category, "alert suppressed by cooldown");
            return false;
        }

        self.last_fired.insert(category.to_string(), now);
        match self.gateway.send_message(self.owner, text).await {
            Ok(()) => warn!(category, "alert sent to owner"),
            Err(e) => error!(category, error = %e, "failed to send alert"),
        }
        true
    }

    /// Send text to the owner without any cooldown. Failures are logged.
    pub async fn notify_owner(&self, text: &str) -> bool {
        match self.gateway.send_message(self.owner, text).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "failed to notify owner");
                false
            }
        }
    }
}

impl std::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("owner", &self.owner)
            .field("cooldown", &self.cooldown)
            .field("categories", &self.last_fired.len())
            .finish()
    }
}
