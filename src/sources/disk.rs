use serde::Serialize;
use std::path::{Path, PathBuf};
use sysinfo::Disks;

use crate::error::SourceError;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DiskUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

pub trait DiskSource: Send + Sync {
    fn usage(&self) -> Result<DiskUsage, SourceError>;
}

impl DiskSource for DiskUsage {
    fn usage(&self) -> Result<DiskUsage, SourceError> {
        Ok(*self)
    }
}

/// Usage of the disk holding the site root.
pub struct SystemDisk {
    root: PathBuf,
}

impl SystemDisk {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl DiskSource for SystemDisk {
    fn usage(&self) -> Result<DiskUsage, SourceError> {
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        let disks = Disks::new_with_refreshed_list();
        let mounts = disks
            .list()
            .iter()
            .map(|d| (d.mount_point(), d.total_space(), d.available_space()));
        pick_disk(&root, mounts).ok_or_else(|| {
            SourceError::Unavailable(format!("no disk found for {}", root.display()))
        })
    }
}

/// Longest mount point containing `root` wins; zero-sized disks are skipped.
fn pick_disk<'a>(
    root: &Path,
    mounts: impl Iterator<Item = (&'a Path, u64, u64)>,
) -> Option<DiskUsage> {
    mounts
        .filter(|(mount, total, _)| *total > 0 && root.starts_with(mount))
        .max_by_key(|(mount, _, _)| mount.as_os_str().len())
        .map(|(_, total, available)| DiskUsage {
            used_bytes: total.saturating_sub(available),
            total_bytes: total,
        })
}

/// Binary-unit size, e.g. `12.5 GB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
