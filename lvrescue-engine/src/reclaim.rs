// SPDX-License-Identifier: GPL-3.0-only

//! Donor reclamation
//!
//! Frees a deficit for an extension target, orphaned logical volumes
//! first, donor filesystems second. Every failure is recovered at the
//! level of the one volume being worked on; a partial result tells the
//! extender to retry with whatever became available.

use lvrescue_types::{format_size, FilesystemUsage, InventorySnapshot, RescueConfig};

use crate::error::Result;
use crate::ops::{FilesystemOps, VolumeOps};
use crate::predicates::{backs_target, donor_slack, is_donor_eligible};
use crate::resize::{resize, ResizeOp};

/// Reclaim up to `deficit` bytes for the extension of `target_lv`.
/// Returns the total actually freed, which may be less.
pub fn reclaim<S: VolumeOps + FilesystemOps>(
    ops: &S,
    snapshot: &InventorySnapshot,
    config: &RescueConfig,
    target_lv: &str,
    deficit: u64,
) -> Result<u64> {
    let mut remaining = deficit;

    remaining = remaining.saturating_sub(reclaim_orphans(ops, snapshot, target_lv, remaining)?);
    if remaining > 0 {
        remaining =
            remaining.saturating_sub(reclaim_donors(ops, snapshot, config, target_lv, remaining)?);
    }

    let freed = deficit - remaining;
    tracing::info!(
        target_lv,
        freed = %format_size(freed),
        outstanding = %format_size(remaining),
        "reclamation pass finished"
    );
    Ok(freed)
}

/// Phase 1: logical volumes with no filesystem on them are free capacity.
/// Smaller than the deficit they are removed whole; larger, shrunk by
/// exactly the deficit.
fn reclaim_orphans<S: VolumeOps + FilesystemOps>(
    ops: &S,
    snapshot: &InventorySnapshot,
    target_lv: &str,
    deficit: u64,
) -> Result<u64> {
    let mut freed = 0u64;

    for orphan in snapshot.orphaned_lvs() {
        let remaining = deficit - freed;
        if remaining == 0 {
            break;
        }
        if orphan.name == target_lv || orphan.mapper_name() == target_lv {
            continue;
        }

        let result = if orphan.size <= remaining {
            ops.remove_lv(&orphan.device_path).map(|()| orphan.size)
        } else {
            ops.reduce_lv(&orphan.device_path, orphan.size - remaining)
                .map(|()| remaining)
        };

        match result {
            Ok(bytes) => {
                tracing::info!(
                    orphan = %orphan.display_name(),
                    freed = %format_size(bytes),
                    "reclaimed orphaned logical volume"
                );
                freed += bytes;
            }
            Err(error) => {
                tracing::error!(orphan = %orphan.display_name(), %error, "failed to reclaim orphan, skipping it");
            }
        }
    }

    Ok(freed)
}

/// Phase 2: shrink eligible donor filesystems, most slack first. Each
/// donor gives `min(slack, remaining deficit)`; the shrink sequence is
/// unmount, consistency check, filesystem shrink, volume reduce, remount.
fn reclaim_donors<S: VolumeOps + FilesystemOps>(
    ops: &S,
    snapshot: &InventorySnapshot,
    config: &RescueConfig,
    target_lv: &str,
    deficit: u64,
) -> Result<u64> {
    let mut donors: Vec<&FilesystemUsage> = snapshot
        .filesystems
        .iter()
        .filter(|fs| {
            !backs_target(snapshot, fs, target_lv) && donor_slack(fs, config) > 0
        })
        .collect();
    donors.sort_by_key(|fs| std::cmp::Reverse(donor_slack(fs, config)));

    let mut freed = 0u64;
    for fs in donors {
        let remaining = deficit - freed;
        if remaining == 0 {
            break;
        }
        if !is_donor_eligible(ops, snapshot, fs, remaining, target_lv, config) {
            continue;
        }

        let give = donor_slack(fs, config).min(remaining);
        match shrink_donor(ops, snapshot, fs, give) {
            Ok(()) => {
                tracing::info!(
                    donor = %fs.mount_point,
                    gave = %format_size(give),
                    "donor shrunk"
                );
                freed += give;
            }
            Err(error) => {
                tracing::error!(donor = %fs.mount_point, %error, "donor shrink failed, moving to next donor");
            }
        }
    }

    Ok(freed)
}

fn shrink_donor<S: VolumeOps + FilesystemOps>(
    ops: &S,
    snapshot: &InventorySnapshot,
    fs: &FilesystemUsage,
    give: u64,
) -> Result<()> {
    ops.unmount(&fs.mount_point)?;

    let target_size = fs.total - give;
    let shrink = resize(
        ops,
        &fs.device,
        fs.kind,
        &fs.mount_point,
        ResizeOp::ShrinkTo(target_size),
    )
    .and_then(|()| {
        if let Some(lv) = snapshot.lv_for_filesystem(fs) {
            ops.reduce_lv(&lv.device_path, lv.size - give)?;
        }
        Ok(())
    });

    // The mount is restored whether or not the shrink went through.
    let remount = ops.mount(&fs.device, &fs.mount_point);
    if let Err(error) = &remount {
        tracing::error!(mount_point = %fs.mount_point, %error, "failed to remount donor");
    }

    shrink?;
    remount.map_err(Into::into)
}
