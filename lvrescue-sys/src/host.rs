// SPDX-License-Identifier: GPL-3.0-only

//! The real-system backend handed to the engine.

use std::time::Duration;

use lvrescue_types::InventorySnapshot;

use crate::error::Result;
use crate::{diskstats, fs_ops, inventory, lvm_ops, mounts};

/// Bundles the mutation primitives and probes against the live system.
///
/// The engine only ever sees this through its ops traits, so tests can
/// substitute a fake without touching real volumes.
#[derive(Debug, Clone)]
pub struct HostSystem {
    /// Render mutation commands without executing them.
    pub dry_run: bool,
    /// Bounded wait before concluding a mount point is busy.
    pub settle_delay: Duration,
    /// Spacing between the two diskstats samples per scan.
    pub sample_interval: Duration,
}

impl HostSystem {
    pub fn new(dry_run: bool, settle_delay: Duration) -> Self {
        Self {
            dry_run,
            settle_delay,
            sample_interval: Duration::from_secs(1),
        }
    }

    pub fn collect_inventory(&self) -> Result<InventorySnapshot> {
        inventory::collect(self.sample_interval)
    }

    pub fn is_busy(&self, mount_point: &str) -> Result<bool> {
        mounts::is_busy(mount_point, self.settle_delay)
    }

    pub fn unmount(&self, mount_point: &str) -> Result<()> {
        mounts::unmount(mount_point, self.dry_run)
    }

    pub fn mount(&self, device: &str, mount_point: &str) -> Result<()> {
        mounts::mount(device, mount_point, self.dry_run)
    }

    pub fn extend_lv(&self, device_path: &str, delta: u64) -> Result<()> {
        lvm_ops::extend_lv(device_path, delta, self.dry_run)
    }

    pub fn reduce_lv(&self, device_path: &str, new_size: u64) -> Result<()> {
        lvm_ops::reduce_lv(device_path, new_size, self.dry_run)
    }

    pub fn remove_lv(&self, device_path: &str) -> Result<()> {
        lvm_ops::remove_lv(device_path, self.dry_run)
    }

    pub fn annex_pv(&self, vg_name: &str, pv_device: &str) -> Result<()> {
        lvm_ops::annex_pv(vg_name, pv_device, self.dry_run)
    }

    pub fn check_filesystem(&self, device_path: &str) -> Result<()> {
        fs_ops::check(device_path, self.dry_run)
    }

    pub fn grow_xfs(&self, mount_point: &str) -> Result<()> {
        fs_ops::grow_xfs(mount_point, self.dry_run)
    }

    pub fn resize_extent(&self, device_path: &str, new_size: Option<u64>) -> Result<()> {
        fs_ops::resize_extent(device_path, new_size, self.dry_run)
    }

    /// Expose the write-rate sampler for the `report` subcommand.
    pub fn sample_write_rates(&self) -> Result<std::collections::HashMap<String, u64>> {
        diskstats::sample_write_rates(self.sample_interval)
    }
}
