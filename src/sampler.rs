//! Host metrics sampling.
//!
//! The sampler never fails: a metric that cannot be read is logged and left
//! at zero so the monitoring loop always has a snapshot to evaluate.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hina_monitor_types::HostMetrics;
use sysinfo::{Disks, Networks, ProcessesToUpdate, System};
use tracing::warn;

/// Source of host metrics for one tick.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Read the current host metrics.
    ///
    /// May suspend for the CPU sampling window.
    async fn sample(&mut self) -> HostMetrics;
}

/// Samples the local host with `sysinfo`.
///
/// Keeps its `System`, `Disks` and `Networks` handles between ticks so CPU
/// usage is computed against a stable baseline.
pub struct SystemSampler {
    sys: System,
    disks: Disks,
    networks: Networks,
    cpu_window: Duration,
    primary_mount: PathBuf,
    started: Instant,
}

impl SystemSampler {
    /// Create a sampler that averages CPU usage over `cpu_window`.
    pub fn new(cpu_window: Duration) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            cpu_window: cpu_window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
            primary_mount: PathBuf::from("/"),
            started: Instant::now(),
        }
    }

    /// Use a different mount point as the primary volume (default `/`).
    pub fn with_primary_mount(mut self, mount: impl Into<PathBuf>) -> Self {
        self.primary_mount = mount.into();
        self
    }

    fn memory(&mut self) -> (f32, u64, u64) {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        let available = self.sys.available_memory();
        if total == 0 {
            warn!("memory totals unavailable, reporting 0%");
            return (0.0, 0, 0);
        }
        let used = total.saturating_sub(available);
        (percent(used, total), total, available)
    }

    fn disk(&mut self) -> (f32, u64, u64) {
        self.disks.refresh();
        if self.disks.list().is_empty() {
            self.disks.refresh_list();
        }

        let disk = self
            .disks
            .list()
            .iter()
            .find(|d| d.mount_point() == self.primary_mount.as_path())
            .or_else(|| self.disks.list().first());

        match disk {
            Some(disk) => {
                let total = disk.total_space();
                let free = disk.available_space();
                (percent(total.saturating_sub(free), total), total, free)
            }
            None => {
                warn!(mount = %self.primary_mount.display(), "no disk found, reporting 0%");
                (0.0, 0, 0)
            }
        }
    }

    fn network(&mut self) -> (u64, u64) {
        self.networks.refresh();
        self.networks
            .list()
            .values()
            .fold((0u64, 0u64), |(sent, recv), data| {
                (
                    sent.saturating_add(data.total_transmitted()),
                    recv.saturating_add(data.total_received()),
                )
            })
    }

    fn process_count(&mut self) -> usize {
        self.sys.refresh_processes(ProcessesToUpdate::All, true);
        self.sys.processes().len()
    }

    /// The mount point treated as the primary volume.
    pub fn primary_mount(&self) -> &Path {
        &self.primary_mount
    }
}

#[async_trait]
impl MetricsSource for SystemSampler {
    async fn sample(&mut self) -> HostMetrics {
        // Two refreshes over the window avoid reporting an instantaneous spike.
        self.sys.refresh_cpu_usage();
        tokio::time::sleep(self.cpu_window).await;
        self.sys.refresh_cpu_usage();

        let cpu_pct = self.sys.global_cpu_usage();
        let cpu_pct = if cpu_pct.is_finite() {
            cpu_pct.clamp(0.0, 100.0)
        } else {
            warn!("CPU usage unavailable, reporting 0%");
            0.0
        };

        let (memory_pct, memory_total, memory_available) = self.memory();
        let (disk_pct, disk_total, disk_free) = self.disk();
        let (network_sent, network_recv) = self.network();
        let process_count = self.process_count();

        HostMetrics {
            cpu_pct,
            memory_pct,
            memory_total,
            memory_available,
            disk_pct,
            disk_total,
            disk_free,
            network_sent,
            network_recv,
            process_count,
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }
}

impl std::fmt::Debug for SystemSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSampler")
            .field("cpu_window", &self.cpu_window)
            .field("primary_mount", &self.primary_mount)
            .finish()
    }
}

fn percent(part: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        ((part as f64 / total as f64) * 100.0) as f32
    }
}
