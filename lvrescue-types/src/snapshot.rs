//! Per-scan inventory snapshot
//!
//! One immutable context object built at the start of every scan and passed
//! explicitly into each predicate and extender call. Nothing in the engine
//! reads inventory state from anywhere else.

use serde::{Deserialize, Serialize};

use crate::filesystem::FilesystemUsage;
use crate::lvm::{LogicalVolumeInfo, PhysicalVolumeInfo, VolumeGroupInfo};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub volume_groups: Vec<VolumeGroupInfo>,
    pub logical_volumes: Vec<LogicalVolumeInfo>,
    pub physical_volumes: Vec<PhysicalVolumeInfo>,
    pub filesystems: Vec<FilesystemUsage>,
}

impl InventorySnapshot {
    /// Physical volumes not yet assigned to any volume group.
    pub fn unattached_pvs(&self) -> Vec<&PhysicalVolumeInfo> {
        self.physical_volumes
            .iter()
            .filter(|pv| !pv.is_assigned())
            .collect()
    }

    /// The filesystem mounted on the given logical volume, if any.
    ///
    /// Matches both device spellings: `/dev/<vg>/<lv>` and the
    /// device-mapper form `/dev/mapper/<vg>-<lv>`.
    pub fn filesystem_for_lv(&self, lv: &LogicalVolumeInfo) -> Option<&FilesystemUsage> {
        let mapper = lv.mapper_name();
        self.filesystems.iter().find(|fs| {
            fs.device == lv.device_path || fs.lv_name() == mapper || fs.lv_name() == lv.name
        })
    }

    /// Logical volumes with no filesystem mounted on them, treated as free
    /// reclaimable capacity.
    pub fn orphaned_lvs(&self) -> Vec<&LogicalVolumeInfo> {
        self.logical_volumes
            .iter()
            .filter(|lv| self.filesystem_for_lv(lv).is_none())
            .collect()
    }

    /// Logical volume that a filesystem device path refers to.
    pub fn lv_for_filesystem(&self, fs: &FilesystemUsage) -> Option<&LogicalVolumeInfo> {
        self.logical_volumes.iter().find(|lv| {
            fs.device == lv.device_path || fs.lv_name() == lv.mapper_name() || fs.lv_name() == lv.name
        })
    }

    pub fn volume_group(&self, name: &str) -> Option<&VolumeGroupInfo> {
        self.volume_groups.iter().find(|vg| vg.name == name)
    }
}
