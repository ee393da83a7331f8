//! Bounded probe history for reporting.
//!
//! Only used for statistics; alerting never reads it.

use std::collections::VecDeque;

use chrono::{DateTime, Local};

/// Maximum number of probe samples to keep.
pub const MAX_PING_HISTORY: usize = 100;

/// One successful probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingSample {
    pub time: DateTime<Local>,
    pub ping_ms: f64,
}

/// The most recent probe samples, oldest first.
#[derive(Debug, Clone, Default)]
pub struct PingHistory {
    samples: VecDeque<PingSample>,
}

impl PingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, evicting the oldest once the cap is reached.
    pub fn record(&mut self, time: DateTime<Local>, ping_ms: f64) {
        self.samples.push_back(PingSample { time, ping_ms });
        if self.samples.len() > MAX_PING_HISTORY {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PingSample> {
        self.samples.iter()
    }

    /// The last `n` samples in insertion order.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &PingSample> {
        self.samples.iter().skip(self.samples.len().saturating_sub(n))
    }

    /// Average of the last `n` samples.
    ///
    /// Returns None if there is no history.
    pub fn average_recent(&self, n: usize) -> Option<f64> {
        let (sum, count) = self
            .recent(n)
            .fold((0.0, 0usize), |(sum, count), s| (sum + s.ping_ms, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}
