// SPDX-License-Identifier: GPL-3.0-only

//! The seam between decisions and the host system.
//!
//! The engine never spawns a process itself; everything it does to the
//! machine goes through these traits. [`lvrescue_sys::HostSystem`] is the
//! real backend, the test fake is the other.

use lvrescue_sys::{HostSystem, Result};
use lvrescue_types::InventorySnapshot;

pub trait Inventory: Send + Sync {
    fn collect_inventory(&self) -> Result<InventorySnapshot>;
}

pub trait VolumeOps: Send + Sync {
    fn extend_lv(&self, device_path: &str, delta: u64) -> Result<()>;
    fn reduce_lv(&self, device_path: &str, new_size: u64) -> Result<()>;
    fn remove_lv(&self, device_path: &str) -> Result<()>;
    fn annex_pv(&self, vg_name: &str, pv_device: &str) -> Result<()>;
}

pub trait FilesystemOps: Send + Sync {
    fn is_busy(&self, mount_point: &str) -> Result<bool>;
    fn unmount(&self, mount_point: &str) -> Result<()>;
    fn mount(&self, device_path: &str, mount_point: &str) -> Result<()>;
    fn check_filesystem(&self, device_path: &str) -> Result<()>;
    fn grow_xfs(&self, mount_point: &str) -> Result<()>;
    fn resize_extent(&self, device_path: &str, new_size: Option<u64>) -> Result<()>;
}

/// Everything the drivers need from the host.
pub trait RescueOps: Inventory + VolumeOps + FilesystemOps {}
impl<T: Inventory + VolumeOps + FilesystemOps> RescueOps for T {}

impl Inventory for HostSystem {
    fn collect_inventory(&self) -> Result<InventorySnapshot> {
        HostSystem::collect_inventory(self)
    }
}

impl VolumeOps for HostSystem {
    fn extend_lv(&self, device_path: &str, delta: u64) -> Result<()> {
        HostSystem::extend_lv(self, device_path, delta)
    }

    fn reduce_lv(&self, device_path: &str, new_size: u64) -> Result<()> {
        HostSystem::reduce_lv(self, device_path, new_size)
    }

    fn remove_lv(&self, device_path: &str) -> Result<()> {
        HostSystem::remove_lv(self, device_path)
    }

    fn annex_pv(&self, vg_name: &str, pv_device: &str) -> Result<()> {
        HostSystem::annex_pv(self, vg_name, pv_device)
    }
}

impl FilesystemOps for HostSystem {
    fn is_busy(&self, mount_point: &str) -> Result<bool> {
        HostSystem::is_busy(self, mount_point)
    }

    fn unmount(&self, mount_point: &str) -> Result<()> {
        HostSystem::unmount(self, mount_point)
    }

    fn mount(&self, device_path: &str, mount_point: &str) -> Result<()> {
        HostSystem::mount(self, device_path, mount_point)
    }

    fn check_filesystem(&self, device_path: &str) -> Result<()> {
        HostSystem::check_filesystem(self, device_path)
    }

    fn grow_xfs(&self, mount_point: &str) -> Result<()> {
        HostSystem::grow_xfs(self, mount_point)
    }

    fn resize_extent(&self, device_path: &str, new_size: Option<u64>) -> Result<()> {
        HostSystem::resize_extent(self, device_path, new_size)
    }
}
