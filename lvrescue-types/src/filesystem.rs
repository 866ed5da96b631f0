//! Mounted-filesystem usage types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Filesystem family, as far as resizing is concerned.
///
/// The tag only decides which resize primitive applies: xfs grows online
/// through `xfs_growfs` and cannot shrink; the extent-based ext family
/// resizes offline through `resize2fs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsKind {
    Xfs,
    Extent,
}

impl FsKind {
    /// Classify a filesystem type string from `df --output=fstype`.
    pub fn from_fs_type(fs_type: &str) -> Self {
        if fs_type.eq_ignore_ascii_case("xfs") {
            FsKind::Xfs
        } else {
            FsKind::Extent
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FsKind::Xfs => "xfs",
            FsKind::Extent => "extent",
        }
    }

    /// Whether this filesystem family supports shrinking at all.
    pub fn can_shrink(self) -> bool {
        matches!(self, FsKind::Extent)
    }
}

impl fmt::Display for FsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FsKind {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "xfs" => Ok(FsKind::Xfs),
            "extent" => Ok(FsKind::Extent),
            _ => Err(()),
        }
    }
}

/// Usage snapshot of one mounted, LV-backed filesystem.
///
/// Rebuilt fresh on every scan; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesystemUsage {
    /// Backing device path (e.g., "/dev/mapper/vg0-data")
    pub device: String,

    /// Resize family of the on-disk format
    pub kind: FsKind,

    /// Mount point
    pub mount_point: String,

    /// Total size in bytes
    pub total: u64,

    /// Used bytes
    pub used: u64,

    /// Available bytes
    pub available: u64,

    /// Measured write rate in bytes per second
    pub write_rate: u64,
}

impl FilesystemUsage {
    /// Usage percentage (0-100), recomputed from the fresh numbers.
    pub fn usage_percent(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            ((self.used as f64 / self.total as f64) * 100.0).round() as u32
        }
    }

    /// Logical volume name derived from the device path suffix.
    pub fn lv_name(&self) -> &str {
        self.device.rsplit('/').next().unwrap_or(&self.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(total: u64, used: u64) -> FilesystemUsage {
        FilesystemUsage {
            device: "/dev/mapper/vg0-data".to_string(),
            kind: FsKind::Extent,
            mount_point: "/srv/data".to_string(),
            total,
            used,
            available: total - used,
            write_rate: 0,
        }
    }

    #[test]
    fn usage_percent_recomputed() {
        assert_eq!(usage(100, 85).usage_percent(), 85);
        assert_eq!(usage(0, 0).usage_percent(), 0);
    }

    #[test]
    fn lv_name_from_device_suffix() {
        assert_eq!(usage(1, 0).lv_name(), "vg0-data");
    }

    #[test]
    fn fs_kind_round_trip() {
        assert_eq!(FsKind::from_fs_type("XFS"), FsKind::Xfs);
        assert_eq!(FsKind::from_fs_type("ext4"), FsKind::Extent);
        assert_eq!("xfs".parse(), Ok(FsKind::Xfs));
        assert!(!FsKind::Xfs.can_shrink());
    }
}
