//! In-memory collaborators for unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hina_monitor_types::{HostMetrics, UsageStats};
use parking_lot::Mutex;

use crate::counter::{CounterStore, DailyCounterState};
use crate::directory::Directory;
use crate::error::{GatewayError, StoreError};
use crate::gateway::{Identity, MessagingGateway};
use crate::sampler::MetricsSource;

/// Records every delivered message; sends and probes can be made to fail.
#[derive(Debug, Default)]
pub struct FakeGateway {
    sent: Mutex<Vec<(Identity, String)>>,
    failing: Mutex<HashSet<Identity>>,
    probe_fails: AtomicBool,
    probes: AtomicUsize,
}

impl FakeGateway {
    pub fn sent(&self) -> Vec<(Identity, String)> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, to: Identity) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(id, _)| *id == to)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn fail_sends_to(&self, to: Identity) {
        self.failing.lock().insert(to);
    }

    pub fn fail_probes(&self, fail: bool) {
        self.probe_fails.store(fail, Ordering::SeqCst);
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingGateway for FakeGateway {
    async fn send_message(&self, to: Identity, text: &str) -> Result<(), GatewayError> {
        if self.failing.lock().contains(&to) {
            return Err(GatewayError::Connection("connection refused".to_string()));
        }
        self.sent.lock().push((to, text.to_string()));
        Ok(())
    }

    async fn get_self_identity(&self) -> Result<Identity, GatewayError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.probe_fails.load(Ordering::SeqCst) {
            Err(GatewayError::Timeout)
        } else {
            Ok(Identity(1))
        }
    }
}

/// Counter store kept in memory; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<DailyCounterState>>>,
    fail: bool,
}

impl MemoryStore {
    pub fn with_state(state: DailyCounterState) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(state))),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            slot: Arc::default(),
            fail: true,
        }
    }

    pub fn saved(&self) -> Option<DailyCounterState> {
        self.slot.lock().clone()
    }
}

impl CounterStore for MemoryStore {
    fn load(&self) -> Result<Option<DailyCounterState>, StoreError> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, state: &DailyCounterState) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::io(
                "memory",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        *self.slot.lock() = Some(state.clone());
        Ok(())
    }
}

/// Fixed recipients and stats.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    pub active: Vec<Identity>,
    pub stats: UsageStats,
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn list_active_identities(&self, _window_days: u32) -> Result<Vec<Identity>, StoreError> {
        Ok(self.active.clone())
    }

    async fn aggregate_stats(&self) -> Result<UsageStats, StoreError> {
        Ok(self.stats)
    }
}

/// Takes `delay` of (paused) time per sample and counts the samples taken.
#[derive(Debug, Clone, Default)]
pub struct SlowSampler {
    pub delay: std::time::Duration,
    pub samples: Arc<AtomicUsize>,
}

impl SlowSampler {
    pub fn new(delay: std::time::Duration) -> Self {
        Self {
            delay,
            samples: Arc::default(),
        }
    }

    pub fn count(&self) -> usize {
        self.samples.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsSource for SlowSampler {
    async fn sample(&mut self) -> HostMetrics {
        self.samples.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        HostMetrics::default()
    }
}

/// Returns the same metrics on every tick, without waiting.
#[derive(Debug, Clone, Default)]
pub struct FixedSampler(pub HostMetrics);

#[async_trait]
impl MetricsSource for FixedSampler {
    async fn sample(&mut self) -> HostMetrics {
        self.0.clone()
    }
}
