//! Gateway latency probing and internet connectivity checks.

use std::sync::Arc;
use std::time::Duration;

use hina_monitor_types::Latency;
use reqwest::Client;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::gateway::MessagingGateway;

/// Measures the round-trip time of one lightweight gateway call.
pub struct LatencyProber {
    gateway: Arc<dyn MessagingGateway>,
    timeout: Duration,
}

impl LatencyProber {
    pub fn new(gateway: Arc<dyn MessagingGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    /// Probe the gateway once.
    ///
    /// Returns [`Latency::Failure`] on timeout or any gateway error.
    pub async fn probe(&self) -> Latency {
        let started = Instant::now();
        match timeout(self.timeout, self.gateway.get_self_identity()).await {
            Ok(Ok(identity)) => {
                let latency = Latency::from_duration(started.elapsed());
                debug!(%identity, %latency, "gateway probe succeeded");
                latency
            }
            Ok(Err(e)) => {
                warn!(error = %e, "gateway probe failed");
                Latency::Failure
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "gateway probe timed out");
                Latency::Failure
            }
        }
    }
}

impl std::fmt::Debug for LatencyProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatencyProber")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Checks outbound internet access by trying a list of URLs in order.
#[derive(Debug, Clone)]
pub struct ConnectivityChecker {
    client: Client,
    urls: Vec<String>,
}

impl ConnectivityChecker {
    /// Per-URL timeout.
    pub const TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(urls: Vec<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Self::TIMEOUT).build()?;
        Ok(Self { client, urls })
    }

    /// `None` when no URLs are configured, otherwise whether any URL answered.
    pub async fn check(&self) -> Option<bool> {
        if self.urls.is_empty() {
            return None;
        }

        for url in &self.urls {
            match self.client.get(url).send().await {
                Ok(_) => return Some(true),
                Err(e) => debug!(%url, error = %e, "connectivity probe failed"),
            }
        }

        warn!("no connectivity URL answered");
        Some(false)
    }
}
