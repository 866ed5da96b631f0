// SPDX-License-Identifier: GPL-3.0-only

//! Donor eligibility and slack policy.

use lvrescue_types::{FilesystemUsage, InventorySnapshot, RescueConfig};

use crate::ops::FilesystemOps;

fn percent_of(total: u64, percent: u8) -> u64 {
    (total as u128 * percent as u128 / 100) as u64
}

/// How much a donor can give up without crossing the reserved ceiling:
/// `ceiling% * total - used`, zero when usage already sits above the
/// ceiling. The gap between the ceiling and the fill threshold is held
/// back as safety margin.
pub fn donor_slack(fs: &FilesystemUsage, config: &RescueConfig) -> u64 {
    percent_of(fs.total, config.donor_ceiling_percent).saturating_sub(fs.used)
}

/// Whether `fs` is backed by the logical volume named `target_lv`.
///
/// The target identity may arrive as either spelling (`data` from the LVM
/// tables or `vg0-data` from a device-mapper path), so both the device
/// suffix and the resolved volume are compared.
pub fn backs_target(snapshot: &InventorySnapshot, fs: &FilesystemUsage, target_lv: &str) -> bool {
    if fs.lv_name() == target_lv {
        return true;
    }
    snapshot
        .lv_for_filesystem(fs)
        .is_some_and(|lv| lv.name == target_lv || lv.mapper_name() == target_lv)
}

/// Whether `fs` may donate `requested` bytes to the extension of
/// `target_lv`.
///
/// A donor must not back the target, must belong to a family that can
/// shrink, must keep more than `fill_threshold%` of its capacity available
/// after donating plus one forecast horizon of writes, and must not be
/// busy. The busy probe runs last; it is the only condition that touches
/// the system.
pub fn is_donor_eligible<S: FilesystemOps>(
    ops: &S,
    snapshot: &InventorySnapshot,
    fs: &FilesystemUsage,
    requested: u64,
    target_lv: &str,
    config: &RescueConfig,
) -> bool {
    if backs_target(snapshot, fs, target_lv) {
        return false;
    }
    if !fs.kind.can_shrink() {
        return false;
    }

    let projected = fs.write_rate.saturating_mul(config.forecast_horizon_secs);
    let remainder = fs
        .available
        .saturating_sub(requested)
        .saturating_sub(projected);
    if remainder <= percent_of(fs.total, config.fill_threshold_percent) {
        return false;
    }

    match ops.is_busy(&fs.mount_point) {
        Ok(busy) => !busy,
        Err(error) => {
            tracing::warn!(mount_point = %fs.mount_point, %error, "busy probe failed, treating donor as busy");
            false
        }
    }
}
