// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem-level primitives: consistency check and structure resize.

use crate::cmd;
use crate::error::Result;

/// Run a forced consistency check on an unmounted extent-family filesystem.
///
/// A nonzero exit aborts whatever resize was planned; the engine decides
/// whether that is fatal (target path) or skip-and-continue (donor path).
pub fn check(device_path: &str, dry_run: bool) -> Result<()> {
    cmd::run("e2fsck", &["-f", "-y", device_path], dry_run)?;
    tracing::debug!(device_path, "consistency check passed");
    Ok(())
}

/// Grow a mounted xfs filesystem to fill its (already grown) volume.
pub fn grow_xfs(mount_point: &str, dry_run: bool) -> Result<()> {
    cmd::run("xfs_growfs", &[mount_point], dry_run)?;
    tracing::info!(mount_point, "grew xfs filesystem");
    Ok(())
}

/// Resize an extent-family filesystem. Without `new_size` it grows to fill
/// the volume; with `new_size` it shrinks to that many bytes (rounded down
/// to whole KiB for the tool's size syntax), which must happen before the
/// volume itself is reduced.
pub fn resize_extent(device_path: &str, new_size: Option<u64>, dry_run: bool) -> Result<()> {
    match new_size {
        Some(bytes) => {
            let size_arg = format!("{}K", bytes / 1024);
            cmd::run("resize2fs", &[device_path, &size_arg], dry_run)?;
            tracing::info!(device_path, bytes, "shrank extent filesystem");
        }
        None => {
            cmd::run("resize2fs", &[device_path], dry_run)?;
            tracing::info!(device_path, "grew extent filesystem");
        }
    }
    Ok(())
}
