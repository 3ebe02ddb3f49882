// System counters via sysinfo

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sysinfo::{Disks, Networks, System};
use tracing::instrument;

use crate::models::{MetricSample, ServerId, round2};

/// Window over which CPU utilization is averaged for one sample. This is the
/// dominant latency cost per cycle.
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

const MB: f64 = 1024.0 * 1024.0;
const GB: f64 = 1024.0 * 1024.0 * 1024.0;

pub struct Sampler {
    sys: Arc<Mutex<System>>,
    disks: Arc<Mutex<Disks>>,
    networks: Arc<Mutex<Networks>>,
    cpu_window: Duration,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler {
    pub fn new() -> Self {
        Self::with_cpu_window(CPU_SAMPLE_WINDOW)
    }

    /// Same as `new` with a custom CPU averaging window (e.g. for tests).
    /// The window is floored at sysinfo's minimum update interval.
    pub fn with_cpu_window(cpu_window: Duration) -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let disks = Disks::new_with_refreshed_list();
        let networks = Networks::new_with_refreshed_list();
        Self {
            sys: Arc::new(Mutex::new(sys)),
            disks: Arc::new(Mutex::new(disks)),
            networks: Arc::new(Mutex::new(networks)),
            cpu_window: cpu_window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }

    /// One point-in-time sample: CPU averaged over the sampling window, then
    /// RAM, root-filesystem and cumulative network counters. Side-effect-free
    /// beyond the OS reads; repeated calls are independent.
    #[instrument(skip(self), fields(operation = "sample"))]
    pub async fn sample(&self, server_id: ServerId) -> anyhow::Result<MetricSample> {
        let sys = self.sys.clone();
        let disks = self.disks.clone();
        let networks = self.networks.clone();
        let cpu_window = self.cpu_window;
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;

            // Two refreshes bracketing the window give a time-averaged reading
            sys.refresh_cpu_all();
            std::thread::sleep(cpu_window);
            sys.refresh_cpu_all();
            let cpu_percent = (sys.global_cpu_usage() as f64).clamp(0.0, 100.0);

            sys.refresh_memory();
            let ram_total = sys.total_memory();
            let ram_used = ram_total.saturating_sub(sys.available_memory());
            let ram_percent = if ram_total > 0 {
                (ram_used as f64 / ram_total as f64) * 100.0
            } else {
                0.0
            };

            let mut disks_guard = disks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo disks lock poisoned: {}", e))?;
            disks_guard.refresh(false);
            let (disk_total, disk_used) = root_disk_usage(&disks_guard);
            let disk_percent = if disk_total > 0 {
                (disk_used as f64 / disk_total as f64) * 100.0
            } else {
                0.0
            };

            let mut networks_guard = networks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?;
            networks_guard.refresh(true);
            // Cumulative totals since boot, summed over interfaces (not deltas)
            let (sent, recv) = networks_guard
                .list()
                .iter()
                .fold((0u64, 0u64), |(sent, recv), (_, data)| {
                    (
                        sent.saturating_add(data.total_transmitted()),
                        recv.saturating_add(data.total_received()),
                    )
                });

            Ok(MetricSample {
                server_id,
                cpu_percent: round2(cpu_percent),
                ram_percent: round2(ram_percent),
                ram_used_mb: round2(ram_used as f64 / MB),
                ram_total_mb: round2(ram_total as f64 / MB),
                disk_percent: round2(disk_percent),
                disk_used_gb: round2(disk_used as f64 / GB),
                disk_total_gb: round2(disk_total as f64 / GB),
                network_sent_mb: round2(sent as f64 / MB),
                network_recv_mb: round2(recv as f64 / MB),
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }
}

/// Root filesystem (total, used) in bytes. Falls back to the largest
/// partition when no "/" mount exists (non-Unix roots).
fn root_disk_usage(disks: &Disks) -> (u64, u64) {
    let root = disks
        .list()
        .iter()
        .find(|d| d.mount_point() == std::path::Path::new("/"))
        .or_else(|| disks.list().iter().max_by_key(|d| d.total_space()));
    match root {
        Some(d) => {
            let total = d.total_space();
            (total, total.saturating_sub(d.available_space()))
        }
        None => (0, 0),
    }
}
