// SPDX-License-Identifier: GPL-3.0-only

//! Logical-volume and volume-group extension.

use lvrescue_sys::SysError;
use lvrescue_types::format_size;
use lvrescue_types::{ExtensionRequest, InventorySnapshot, RescueConfig};

use crate::error::Result;
use crate::ops::{FilesystemOps, VolumeOps};
use crate::reclaim::reclaim;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendOutcome {
    Extended,
    /// No free extents, no annexable physical volumes, no viable donors.
    /// The filesystem stays under-provisioned until a future scan finds
    /// new capacity.
    Unsatisfiable,
}

/// Grow a volume group by annexing unattached physical volumes until
/// `required` bytes were added or the pool runs out.
///
/// Small devices are consumed first, preserving large ones for future
/// allocations. Pool exhaustion is the reclamation trigger, not a hard
/// error.
pub fn extend_vg<S: VolumeOps>(
    ops: &S,
    snapshot: &InventorySnapshot,
    vg_name: &str,
    required: u64,
) -> Result<bool> {
    let mut pool = snapshot.unattached_pvs();
    pool.sort_by_key(|pv| pv.size);

    let mut outstanding = required;
    for pv in pool {
        if outstanding == 0 {
            break;
        }
        match ops.annex_pv(vg_name, &pv.device) {
            Ok(()) => outstanding = outstanding.saturating_sub(pv.size),
            Err(error) => {
                tracing::error!(pv = %pv.device, vg_name, %error, "failed to annex physical volume, skipping it");
            }
        }
    }

    if outstanding > 0 {
        tracing::error!(
            vg_name,
            outstanding = %format_size(outstanding),
            "no unattached physical volumes left to satisfy the requirement"
        );
        return Ok(false);
    }
    Ok(true)
}

/// Grow a logical volume by the requested delta, pulling in capacity from
/// wherever it can be found.
///
/// The in-place grow is attempted first; on failure the volume group is
/// extended from the unattached pool, and failing that the deficit is
/// reclaimed from orphaned volumes and donor filesystems. The cycle is
/// bounded by `max_extend_attempts` and stops as soon as a pass makes no
/// progress, so it terminates even when no capacity exists anywhere.
pub fn extend_lv<S: VolumeOps + FilesystemOps>(
    ops: &S,
    snapshot: &InventorySnapshot,
    config: &RescueConfig,
    request: &ExtensionRequest,
) -> Result<ExtendOutcome> {
    let device_path = device_path_for(snapshot, request);

    for attempt in 1..=config.max_extend_attempts {
        match ops.extend_lv(&device_path, request.delta) {
            Ok(()) => {
                tracing::info!(
                    lv = %request.lv_name,
                    delta = %format_size(request.delta),
                    "extended logical volume"
                );
                return Ok(ExtendOutcome::Extended);
            }
            // Only a refusal from the tool itself means the group is out of
            // extents; anything else (missing binary, io failure) must not
            // trigger annexation or reclamation.
            Err(error @ SysError::CommandFailed { .. }) => {
                tracing::debug!(lv = %request.lv_name, attempt, %error, "in-place grow failed");
            }
            Err(error) => return Err(error.into()),
        }

        if attempt == config.max_extend_attempts {
            break;
        }

        let mut progressed = extend_vg(ops, snapshot, &request.vg_name, request.delta)?;
        if !progressed {
            let freed = reclaim(ops, snapshot, config, &request.lv_name, request.delta)?;
            progressed = freed > 0;
        }
        if !progressed {
            break;
        }
    }

    tracing::error!(
        lv = %request.lv_name,
        delta = %format_size(request.delta),
        "no available space anywhere for extending"
    );
    Ok(ExtendOutcome::Unsatisfiable)
}

fn device_path_for(snapshot: &InventorySnapshot, request: &ExtensionRequest) -> String {
    snapshot
        .logical_volumes
        .iter()
        .find(|lv| lv.vg_name == request.vg_name && lv.name == request.lv_name)
        .map(|lv| lv.device_path.clone())
        .unwrap_or_else(|| format!("/dev/{}/{}", request.vg_name, request.lv_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeHost;
    use lvrescue_types::{
        FilesystemUsage, FsKind, LogicalVolumeInfo, PhysicalVolumeInfo, VolumeGroupInfo,
    };

    const GIB: u64 = 1024 * 1024 * 1024;

    fn base_snapshot(vg_free: u64) -> InventorySnapshot {
        InventorySnapshot {
            volume_groups: vec![VolumeGroupInfo {
                name: "vg0".to_string(),
                size: 100 * GIB,
                free: vg_free,
                pv_count: 1,
                lv_count: 1,
            }],
            logical_volumes: vec![LogicalVolumeInfo {
                name: "data".to_string(),
                vg_name: "vg0".to_string(),
                size: 50 * GIB,
                device_path: "/dev/vg0/data".to_string(),
            }],
            physical_volumes: vec![],
            filesystems: vec![FilesystemUsage {
                device: "/dev/mapper/vg0-data".to_string(),
                kind: FsKind::Extent,
                mount_point: "/srv/data".to_string(),
                total: 50 * GIB,
                used: 42 * GIB,
                available: 8 * GIB,
                write_rate: 0,
            }],
        }
    }

    fn request() -> ExtensionRequest {
        ExtensionRequest {
            vg_name: "vg0".to_string(),
            lv_name: "data".to_string(),
            delta: GIB,
        }
    }

    #[test]
    fn grows_in_place_when_the_group_has_room() {
        // Scenario A: the group holds 2 GiB free, nothing else is touched.
        let snapshot = base_snapshot(2 * GIB);
        let ops = FakeHost::with_snapshot(snapshot.clone());
        let config = RescueConfig::default();

        let outcome = extend_lv(&ops, &snapshot, &config, &request()).unwrap();

        assert_eq!(outcome, ExtendOutcome::Extended);
        assert_eq!(ops.lv_size("/dev/vg0/data"), Some(51 * GIB));
        assert_eq!(ops.calls(), vec!["lvextend /dev/vg0/data +1073741824"]);
    }

    #[test]
    fn annexes_a_physical_volume_when_the_group_is_full() {
        // Scenario B: group full, one unattached PV of exactly the needed size.
        let mut snapshot = base_snapshot(0);
        snapshot.physical_volumes.push(PhysicalVolumeInfo {
            device: "/dev/sdc".to_string(),
            vg_name: None,
            size: GIB,
            free: GIB,
        });
        let ops = FakeHost::with_snapshot(snapshot.clone());
        let config = RescueConfig::default();

        let outcome = extend_lv(&ops, &snapshot, &config, &request()).unwrap();

        assert_eq!(outcome, ExtendOutcome::Extended);
        assert_eq!(
            ops.calls(),
            vec![
                "vgextend vg0 /dev/sdc",
                "lvextend /dev/vg0/data +1073741824"
            ]
        );
    }

    #[test]
    fn vg_extender_prefers_small_devices_first() {
        let mut snapshot = base_snapshot(0);
        for (device, size) in [("/dev/sdd", 10 * GIB), ("/dev/sdc", 2 * GIB)] {
            snapshot.physical_volumes.push(PhysicalVolumeInfo {
                device: device.to_string(),
                vg_name: None,
                size,
                free: size,
            });
        }
        let ops = FakeHost::with_snapshot(snapshot.clone());

        assert!(extend_vg(&ops, &snapshot, "vg0", GIB).unwrap());
        assert_eq!(ops.calls(), vec!["vgextend vg0 /dev/sdc"]);
    }

    #[test]
    fn vg_extender_reports_pool_exhaustion() {
        let mut snapshot = base_snapshot(0);
        snapshot.physical_volumes.push(PhysicalVolumeInfo {
            device: "/dev/sdc".to_string(),
            vg_name: None,
            size: GIB,
            free: GIB,
        });
        let ops = FakeHost::with_snapshot(snapshot.clone());

        // Pool annexed entirely but still short of the requirement.
        assert!(!extend_vg(&ops, &snapshot, "vg0", 5 * GIB).unwrap());
        assert_eq!(ops.calls(), vec!["vgextend vg0 /dev/sdc"]);
    }

    #[test]
    fn reclaims_from_an_orphan_when_no_pvs_exist() {
        // Scenario C: group full, no PVs, a 5 GiB orphan covers a 3 GiB
        // deficit by shrinking (not removal).
        let mut snapshot = base_snapshot(0);
        snapshot.logical_volumes.push(LogicalVolumeInfo {
            name: "scratch".to_string(),
            vg_name: "vg0".to_string(),
            size: 5 * GIB,
            device_path: "/dev/vg0/scratch".to_string(),
        });
        let ops = FakeHost::with_snapshot(snapshot.clone());
        let config = RescueConfig::default();
        let request = ExtensionRequest {
            delta: 3 * GIB,
            ..self::request()
        };

        let outcome = extend_lv(&ops, &snapshot, &config, &request).unwrap();

        assert_eq!(outcome, ExtendOutcome::Extended);
        // Orphan shrunk by exactly the deficit, then the grow succeeds.
        assert_eq!(ops.lv_size("/dev/vg0/scratch"), Some(2 * GIB));
        assert_eq!(ops.lv_size("/dev/vg0/data"), Some(53 * GIB));
    }

    #[test]
    fn stops_without_progress_when_no_capacity_exists() {
        let snapshot = base_snapshot(0);
        let ops = FakeHost::with_snapshot(snapshot.clone());
        let config = RescueConfig::default();

        let outcome = extend_lv(&ops, &snapshot, &config, &request()).unwrap();

        assert_eq!(outcome, ExtendOutcome::Unsatisfiable);
        // One failed grow, then the no-progress check ends the cycle.
        assert!(ops.calls().is_empty());
    }

    #[test]
    fn io_failure_propagates_without_touching_other_volumes() {
        // A grow that fails because the tool could not run is not a
        // capacity problem: nothing may be annexed or reclaimed.
        let mut snapshot = base_snapshot(50 * GIB);
        snapshot.logical_volumes.push(LogicalVolumeInfo {
            name: "scratch".to_string(),
            vg_name: "vg0".to_string(),
            size: 5 * GIB,
            device_path: "/dev/vg0/scratch".to_string(),
        });
        let ops = FakeHost::with_snapshot(snapshot.clone());
        ops.fail_extend_io_on("/dev/vg0/data");
        let config = RescueConfig::default();

        let result = extend_lv(&ops, &snapshot, &config, &request());

        assert!(result.is_err());
        assert_eq!(ops.lv_size("/dev/vg0/scratch"), Some(5 * GIB));
        assert!(ops.calls().is_empty());
    }

    #[test]
    fn never_reports_success_without_the_full_delta() {
        let snapshot = base_snapshot(GIB / 2);
        let ops = FakeHost::with_snapshot(snapshot.clone());
        let config = RescueConfig::default();

        let outcome = extend_lv(&ops, &snapshot, &config, &request()).unwrap();

        assert_eq!(outcome, ExtendOutcome::Unsatisfiable);
        assert_eq!(ops.lv_size("/dev/vg0/data"), Some(50 * GIB));
    }
}
