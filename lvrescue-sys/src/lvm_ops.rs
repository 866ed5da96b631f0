// SPDX-License-Identifier: GPL-3.0-only

//! LVM mutation primitives
//!
//! Thin pass/fail wrappers over the LVM CLI. Sizes are always passed in
//! bytes (`<n>b`) so no unit arithmetic happens at this layer. Retry
//! policy belongs to the engine, never here.

use crate::cmd;
use crate::error::Result;

/// Grow a logical volume in place by `delta` bytes.
///
/// Fails when the volume group lacks free extents; the engine treats that
/// as the trigger for VG extension or reclamation.
pub fn extend_lv(device_path: &str, delta: u64, dry_run: bool) -> Result<()> {
    let size_arg = format!("+{delta}b");
    let outcome = cmd::run("lvextend", &["-L", &size_arg, device_path], dry_run)?;
    tracing::info!(device_path, delta, stdout = %outcome.stdout.trim(), "extended logical volume");
    Ok(())
}

/// Shrink a logical volume to an absolute size in bytes.
///
/// The filesystem on it (if any) must already have been shrunk to fit;
/// the caller runs the consistency check first.
pub fn reduce_lv(device_path: &str, new_size: u64, dry_run: bool) -> Result<()> {
    let size_arg = format!("{new_size}b");
    let outcome = cmd::run("lvreduce", &["-f", "-L", &size_arg, device_path], dry_run)?;
    tracing::info!(device_path, new_size, stdout = %outcome.stdout.trim(), "reduced logical volume");
    Ok(())
}

/// Remove a logical volume entirely, returning its extents to the group.
pub fn remove_lv(device_path: &str, dry_run: bool) -> Result<()> {
    cmd::run("lvremove", &["-f", device_path], dry_run)?;
    tracing::info!(device_path, "removed logical volume");
    Ok(())
}

/// Annex a physical volume into a volume group.
pub fn annex_pv(vg_name: &str, pv_device: &str, dry_run: bool) -> Result<()> {
    cmd::run("vgextend", &[vg_name, pv_device], dry_run)?;
    tracing::info!(vg_name, pv_device, "annexed physical volume");
    Ok(())
}
