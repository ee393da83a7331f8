//! Latest monitoring result, shared with the command side.

use std::sync::Arc;

use hina_monitor_types::{HealthLevel, HealthSnapshot};
use parking_lot::RwLock;

use crate::evaluator::Evaluation;

/// One tick's snapshot and its evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub snapshot: HealthSnapshot,
    pub evaluation: Evaluation,
}

/// Cloneable read handle to the most recent [`StatusReport`].
///
/// Written only by the monitoring loop.
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    latest: Arc<RwLock<Option<StatusReport>>>,
}

impl StatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn publish(&self, report: StatusReport) {
        *self.latest.write() = Some(report);
    }

    /// The latest report, `None` before the first tick completes.
    pub fn latest(&self) -> Option<StatusReport> {
        self.latest.read().clone()
    }

    /// Level of the latest report.
    pub fn level(&self) -> Option<HealthLevel> {
        self.latest.read().as_ref().map(|r| r.evaluation.level)
    }

    /// Whether the latest report calls for an alert.
    pub fn should_alert(&self) -> bool {
        self.level().is_some_and(|level| level != HealthLevel::Good)
    }
}
