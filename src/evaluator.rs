//! Health evaluation.
//!
//! Turns a [`HealthSnapshot`] into a [`HealthLevel`] plus one alert line per
//! exceeded threshold. Evaluation is pure: the same snapshot and thresholds
//! always give the same result.

use hina_monitor_types::{HealthLevel, HealthSnapshot, Latency};
use serde::{Deserialize, Serialize};

/// Fixed alerting thresholds, read-only after startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// CPU percent above which the host is critical.
    pub cpu_warn: f32,
    /// Memory percent above which the host is critical.
    pub mem_warn: f32,
    /// Disk percent above which the host is critical.
    pub disk_warn: f32,
    /// Probe latency above which the bot is slow.
    pub latency_warn_ms: f64,
    /// Probe latency above which the bot is critical.
    pub latency_critical_ms: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_warn: 95.0,
            mem_warn: 90.0,
            disk_warn: 90.0,
            latency_warn_ms: 1000.0,
            latency_critical_ms: 3000.0,
        }
    }
}

/// Result of evaluating one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub level: HealthLevel,
    /// Human-readable causes; empty only when `level` is `Good`.
    pub alerts: Vec<String>,
}

impl Evaluation {
    pub fn is_good(&self) -> bool {
        self.level == HealthLevel::Good
    }
}

/// Classify a snapshot against the thresholds.
///
/// Precedence: an unreachable gateway is critical; any host metric above its
/// limit or latency above the critical limit is critical; latency above the
/// warning limit is a warning; everything else is good.
pub fn evaluate(snapshot: &HealthSnapshot, thresholds: &Thresholds) -> Evaluation {
    let host = &snapshot.host;
    let mut critical = Vec::new();

    if snapshot.latency.is_failure() {
        critical.push("service unreachable".to_string());
    }

    if host.cpu_pct > thresholds.cpu_warn {
        critical.push(format!("CPU usage high: {:.1}%", host.cpu_pct));
    }
    if host.memory_pct > thresholds.mem_warn {
        critical.push(format!("memory usage high: {:.1}%", host.memory_pct));
    }
    if host.disk_pct > thresholds.disk_warn {
        critical.push(format!("disk usage high: {:.1}%", host.disk_pct));
    }

    if let Latency::Millis(ms) = snapshot.latency {
        if ms > thresholds.latency_critical_ms {
            critical.push(format!(
                "bot latency critical: {:.0}ms (limit {:.0}ms)",
                ms, thresholds.latency_critical_ms
            ));
        }
    }

    if snapshot.internet_connected == Some(false) {
        critical.push("no internet connectivity".to_string());
    }

    if !critical.is_empty() {
        return Evaluation {
            level: HealthLevel::Critical,
            alerts: critical,
        };
    }

    match snapshot.latency {
        Latency::Millis(ms) if ms > thresholds.latency_warn_ms => Evaluation {
            level: HealthLevel::Warning,
            alerts: vec![format!(
                "bot latency slow: {:.0}ms (limit {:.0}ms)",
                ms, thresholds.latency_warn_ms
            )],
        },
        _ => Evaluation {
            level: HealthLevel::Good,
            alerts: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hina_monitor_types::HostMetrics;

    fn snapshot(cpu: f32, memory: f32, disk: f32, latency: Latency) -> HealthSnapshot {
        HealthSnapshot::new(
            HostMetrics {
                cpu_pct: cpu,
                memory_pct: memory,
                disk_pct: disk,
                ..HostMetrics::default()
            },
            latency,
            None,
        )
    }

    #[test]
    fn healthy_host_is_good() {
        let eval = evaluate(
            &snapshot(50.0, 50.0, 50.0, Latency::Millis(200.0)),
            &Thresholds::default(),
        );
        assert_eq!(eval.level, HealthLevel::Good);
        assert!(eval.alerts.is_empty());
    }

    #[test]
    fn slow_latency_is_warning() {
        let eval = evaluate(
            &snapshot(50.0, 50.0, 50.0, Latency::Millis(1500.0)),
            &Thresholds::default(),
        );
        assert_eq!(eval.level, HealthLevel::Warning);
        assert_eq!(eval.alerts.len(), 1);
        assert!(eval.alerts[0].contains("latency"));
    }

    #[test]
    fn unreachable_is_critical_regardless_of_metrics() {
        for (cpu, memory, disk) in [(0.0, 0.0, 0.0), (50.0, 50.0, 50.0), (99.0, 99.0, 99.0)] {
            let eval = evaluate(
                &snapshot(cpu, memory, disk, Latency::Failure),
                &Thresholds::default(),
            );
            assert_eq!(eval.level, HealthLevel::Critical);
            assert_eq!(eval.alerts[0], "service unreachable");
        }
    }

    #[test]
    fn each_exceeded_threshold_adds_a_line() {
        let eval = evaluate(
            &snapshot(97.0, 93.0, 95.0, Latency::Millis(3500.0)),
            &Thresholds::default(),
        );
        assert_eq!(eval.level, HealthLevel::Critical);
        assert_eq!(eval.alerts.len(), 4);
        assert!(eval.alerts[0].starts_with("CPU"));
        assert!(eval.alerts[1].starts_with("memory"));
        assert!(eval.alerts[2].starts_with("disk"));
        assert!(eval.alerts[3].contains("latency critical"));
    }

    #[test]
    fn critical_cause_hides_latency_warning() {
        let eval = evaluate(
            &snapshot(50.0, 95.0, 50.0, Latency::Millis(1500.0)),
            &Thresholds::default(),
        );
        assert_eq!(eval.level, HealthLevel::Critical);
        assert_eq!(eval.alerts.len(), 1);
    }

    #[test]
    fn thresholds_are_exclusive_limits() {
        let thresholds = Thresholds::default();
        let eval = evaluate(
            &snapshot(95.0, 90.0, 90.0, Latency::Millis(1000.0)),
            &thresholds,
        );
        assert!(eval.is_good());
    }

    #[test]
    fn lost_connectivity_is_critical() {
        let mut snap = snapshot(10.0, 10.0, 10.0, Latency::Millis(100.0));
        snap.internet_connected = Some(false);

        let eval = evaluate(&snap, &Thresholds::default());
        assert_eq!(eval.level, HealthLevel::Critical);
        assert_eq!(eval.alerts, vec!["no internet connectivity".to_string()]);
    }

    #[test]
    fn custom_thresholds_apply() {
        let thresholds = Thresholds {
            cpu_warn: 40.0,
            ..Thresholds::default()
        };
        let eval = evaluate(&snapshot(50.0, 10.0, 10.0, Latency::Millis(10.0)), &thresholds);
        assert_eq!(eval.level, HealthLevel::Critical);
    }
}
