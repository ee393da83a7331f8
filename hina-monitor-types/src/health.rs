//! Health classification types.

use core::fmt;
use std::time::Duration;

/// Round-trip time of a gateway probe.
///
/// `Failure` is the sentinel for "the gateway did not answer": a timeout,
/// a rejected call, or a transport error. It is data, not an error, so the
/// evaluator can tell "unreachable" apart from "slow".
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Latency {
    /// The probe succeeded after this many milliseconds.
    Millis(f64),
    /// The probe did not produce a response.
    Failure,
}

impl Latency {
    /// Build a successful latency from an elapsed duration.
    pub fn from_duration(elapsed: Duration) -> Self {
        Latency::Millis(elapsed.as_secs_f64() * 1000.0)
    }

    /// Milliseconds of a successful probe, `None` on failure.
    pub fn millis(&self) -> Option<f64> {
        match self {
            Latency::Millis(ms) => Some(*ms),
            Latency::Failure => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Latency::Failure)
    }
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Latency::Millis(ms) => write!(f, "{:.0}ms", ms),
            Latency::Failure => f.write_str("unreachable"),
        }
    }
}

/// Coarse health classification of a snapshot.
///
/// Ordered from best to worst so the worst of several levels is `max()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HealthLevel {
    Good,
    Warning,
    Critical,
    /// The monitoring pipeline itself failed.
    Error,
}

impl HealthLevel {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthLevel::Good => "OK",
            HealthLevel::Warning => "WARN",
            HealthLevel::Critical => "CRIT",
            HealthLevel::Error => "ERR",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthLevel::Good => "good",
            HealthLevel::Warning => "warning",
            HealthLevel::Critical => "critical",
            HealthLevel::Error => "error",
        }
    }
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bot reachability as shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BotStatus {
    Online,
    Offline,
}

impl From<Latency> for BotStatus {
    fn from(latency: Latency) -> Self {
        if latency.is_failure() {
            BotStatus::Offline
        } else {
            BotStatus::Online
        }
    }
}
