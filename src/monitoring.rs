//! Host resource metrics shown alongside an analysis
//!
//! Samples CPU, memory and the usage of the filesystem holding a given path.
//! Disk usage is compared against `thresholds.disk_usage`.

use log::{debug, warn};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use sysinfo::{Disks, System};

/// Usage of one mounted filesystem
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskUsage {
    pub mount_point: PathBuf,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    /// Used space as a percentage of total (0-100)
    pub percent: f64,
}

impl DiskUsage {
    pub fn new(mount_point: PathBuf, total_bytes: u64, free_bytes: u64) -> Self {
        let free_bytes = free_bytes.min(total_bytes);
        let used_bytes = total_bytes - free_bytes;
        let percent = if total_bytes == 0 {
            0.0
        } else {
            used_bytes as f64 / total_bytes as f64 * 100.0
        };
        Self {
            mount_point,
            total_bytes,
            used_bytes,
            free_bytes,
            percent,
        }
    }
}

/// A point-in-time sample of host resource usage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemMetrics {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    /// `None` when no mounted filesystem contains the sampled path
    pub disk: Option<DiskUsage>,
}

impl SystemMetrics {
    /// Sample CPU, memory and the disk holding `path`
    ///
    /// CPU usage needs two refreshes, so this blocks for
    /// [`sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`].
    pub fn collect(path: &Path) -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu_usage();
        system.refresh_memory();

        let memory_percent = if system.total_memory() == 0 {
            0.0
        } else {
            system.used_memory() as f64 / system.total_memory() as f64 * 100.0
        };

        let disks = Disks::new_with_refreshed_list();
        let mounts: Vec<DiskUsage> = disks
            .list()
            .iter()
            .map(|disk| {
                DiskUsage::new(
                    disk.mount_point().to_path_buf(),
                    disk.total_space(),
                    disk.available_space(),
                )
            })
            .collect();

        let target = path.canonicalize().unwrap_or_else(|e| {
            debug!("Using {} as given: {}", path.display(), e);
            path.to_path_buf()
        });
        let disk = disk_for_path(&target, mounts);
        if disk.is_none() {
            warn!("No mounted filesystem found for {}", path.display());
        }

        Self {
            cpu_percent: f64::from(system.global_cpu_usage()),
            memory_percent,
            disk,
        }
    }

    /// Whether disk usage is strictly above `threshold` percent
    pub fn disk_usage_exceeded(&self, threshold: f64) -> bool {
        self.disk.as_ref().is_some_and(|disk| disk.percent > threshold)
    }
}

impl fmt::Display for SystemMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CPU Usage: {:.1}%", self.cpu_percent)?;
        writeln!(f, "Memory Usage: {:.1}%", self.memory_percent)?;
        match &self.disk {
            Some(disk) => write!(
                f,
                "Disk Usage: {:.1}% ({} of {} bytes free on {})",
                disk.percent,
                disk.free_bytes,
                disk.total_bytes,
                disk.mount_point.display()
            ),
            None => write!(f, "Disk Usage: N/A"),
        }
    }
}

/// The mount with the longest mount point that is a prefix of `path`
fn disk_for_path(path: &Path, mounts: Vec<DiskUsage>) -> Option<DiskUsage> {
    mounts
        .into_iter()
        .filter(|disk| path.starts_with(&disk.mount_point))
        .max_by_key(|disk| disk.mount_point.components().count())
}
